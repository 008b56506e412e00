#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Grading configuration: what the answer should say and how it is scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(setter(into)))]
pub struct GradingCriteria {
    /// The instructor's ideal answer, used as the comparison baseline.
    #[builder(default)]
    pub reference_answer: String,
    /// Highest score the paper can receive.
    #[builder(default = 10.0)]
    pub max_score:        f64,
    /// Free-text grading instructions; empty means none.
    #[builder(default)]
    pub instructions:     String,
}

impl Default for GradingCriteria {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A single criteria field together with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaField {
    /// Replaces the reference answer.
    ReferenceAnswer(String),
    /// Replaces the maximum score.
    MaxScore(f64),
    /// Replaces the grading instructions.
    Instructions(String),
}

impl GradingCriteria {
    /// Replaces one field, leaving the others untouched.
    pub fn set(&mut self, field: CriteriaField) {
        match field {
            CriteriaField::ReferenceAnswer(value) => self.reference_answer = value,
            CriteriaField::MaxScore(value) => self.max_score = value,
            CriteriaField::Instructions(value) => self.instructions = value,
        }
    }

    /// Returns the instructions, or `None` when they are blank.
    pub fn instructions(&self) -> Option<&str> {
        let trimmed = self.instructions.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Whether the reference answer contains anything besides whitespace.
    pub fn has_reference_answer(&self) -> bool {
        !self.reference_answer.trim().is_empty()
    }
}

/// Parses `key=value` pairs, e.g. `maxScore=20`.
impl FromStr for CriteriaField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected `key=value`, got `{s}`"))?;

        match key.trim() {
            "referenceAnswer" | "reference_answer" | "answer" => {
                Ok(CriteriaField::ReferenceAnswer(value.to_string()))
            }
            "maxScore" | "max_score" => value
                .trim()
                .parse::<f64>()
                .map(CriteriaField::MaxScore)
                .map_err(|e| format!("invalid max score `{value}`: {e}")),
            "instructions" => Ok(CriteriaField::Instructions(value.to_string())),
            other => Err(format!("unknown criteria field `{other}`")),
        }
    }
}
