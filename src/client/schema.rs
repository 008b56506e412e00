use serde_json::{Map, Value, json};

/// Shape of a single output field.
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    /// Free text.
    Text,
    /// A number, integer or fractional.
    Number,
    /// An ordered list of strings.
    TextList,
}

/// One required output field.
struct FieldSpec {
    /// JSON key.
    name:        &'static str,
    /// Value shape.
    kind:        FieldKind,
    /// Hint for the model.
    description: &'static str,
}

/// Every field the model must return, in schema order.
const FIELDS: [FieldSpec; 6] = [
    FieldSpec {
        name:        "transcribedText",
        kind:        FieldKind::Text,
        description: "The text extracted from the image exactly as the student wrote it",
    },
    FieldSpec {
        name:        "score",
        kind:        FieldKind::Number,
        description: "The score awarded to the student",
    },
    FieldSpec {
        name:        "feedback",
        kind:        FieldKind::Text,
        description: "Summary of the overall evaluation",
    },
    FieldSpec {
        name:        "strengths",
        kind:        FieldKind::TextList,
        description: "Strong points of the answer",
    },
    FieldSpec {
        name:        "weaknesses",
        kind:        FieldKind::TextList,
        description: "Weak points or what the answer is missing",
    },
    FieldSpec {
        name:        "reasoning",
        kind:        FieldKind::Text,
        description: "Detailed reason for awarding this score",
    },
];

/// Names of the required fields.
pub fn required_fields() -> Vec<&'static str> {
    FIELDS.iter().map(|f| f.name).collect()
}

/// Renders the schema with the given spelling of type names.
fn render(type_name: fn(&str) -> String) -> (Map<String, Value>, Value) {
    let mut properties = Map::new();
    for field in &FIELDS {
        let mut body = match field.kind {
            FieldKind::Text => json!({ "type": type_name("string") }),
            FieldKind::Number => json!({ "type": type_name("number") }),
            FieldKind::TextList => json!({
                "type": type_name("array"),
                "items": { "type": type_name("string") },
            }),
        };
        body["description"] = Value::from(field.description);
        properties.insert(field.name.to_string(), body);
    }
    (properties, json!(required_fields()))
}

/// Gemini `responseSchema` (OpenAPI subset, upper-case type names).
pub fn gemini_schema() -> Value {
    let (properties, required) = render(|t| t.to_ascii_uppercase());
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

/// Strict JSON Schema for OpenAI-compatible `json_schema` response formats.
pub fn openai_schema() -> Value {
    let (properties, required) = render(str::to_string);
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}
