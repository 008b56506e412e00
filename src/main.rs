#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # inkgrade
//!
//! Grades a photographed, handwritten answer sheet against a reference answer
//! using a multimodal model, then prints the score, the transcription and the
//! feedback.
//!
//! Put `GEMINI_API_KEY` (or `OPENAI_API_KEY` with `INKGRADE_BACKEND=openai`)
//! in your environment or a `.env` file, then run
//! `inkgrade grade sheet.jpg --answer "Paris is the capital of France"`.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use inkgrade::{
    Completion, Controller, ControllerError, CriteriaField, GradingCriteria, Locale,
    SelectedFile, SelectionEvent,
    client::schema,
    config::{self, Backend},
    display::ResultCard,
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Arguments of the `grade` subcommand.
#[derive(Debug, Clone)]
struct GradeArgs {
    /// Reference answer given inline.
    answer:       Option<String>,
    /// File holding the reference answer.
    answer_file:  Option<PathBuf>,
    /// Maximum score.
    max_score:    Option<f64>,
    /// Extra grading instructions.
    instructions: Option<String>,
    /// Additional `key=value` criteria edits, applied last.
    set:          Vec<CriteriaField>,
    /// Language override.
    locale:       Option<Locale>,
    /// Backend override.
    backend:      Option<Backend>,
    /// Print JSON instead of the result card.
    json:         bool,
    /// Path or `data:` URL of the answer sheet.
    image:        String,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade one answer sheet
    Grade(GradeArgs),
    /// Print the enforced response schema
    Schema(Option<Backend>),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the backend override
    fn backend_override() -> impl Parser<Option<Backend>> {
        long("backend")
            .help("Grading backend: gemini or openai")
            .argument::<Backend>("BACKEND")
            .optional()
    }

    let answer = long("answer")
        .short('a')
        .help("Reference answer to compare against")
        .argument::<String>("TEXT")
        .optional();
    let answer_file = long("answer-file")
        .help("Read the reference answer from a file")
        .argument::<PathBuf>("PATH")
        .optional();
    let max_score = long("max-score")
        .short('m')
        .help("Maximum score for the question (default 10)")
        .argument::<f64>("N")
        .optional();
    let instructions = long("instructions")
        .short('i')
        .help("Additional grading instructions")
        .argument::<String>("TEXT")
        .optional();
    let set = long("set")
        .help("Set a criteria field, e.g. maxScore=20")
        .argument::<CriteriaField>("KEY=VALUE")
        .many();
    let locale = long("locale")
        .help("Language of messages: en or ar")
        .argument::<Locale>("LOCALE")
        .optional();
    let backend = backend_override();
    let json = long("json").help("Print the result as JSON").switch();
    let image = positional::<String>("IMAGE").help("Answer sheet image path or data: URL");

    let grade = construct!(GradeArgs {
        answer,
        answer_file,
        max_score,
        instructions,
        set,
        locale,
        backend,
        json,
        image
    })
    .to_options()
    .command("grade")
    .help("Grade a handwritten answer sheet")
    .map(Cmd::Grade);

    let schema = construct!(Cmd::Schema(backend_override()))
        .to_options()
        .command("schema")
        .help("Print the response schema sent to the model");

    construct!([grade, schema])
        .to_options()
        .descr("Grade handwritten answer sheets with a multimodal model")
        .run()
}

/// Fills criteria from the command-line flags.
async fn criteria_from(args: &GradeArgs) -> Result<GradingCriteria> {
    let mut criteria = GradingCriteria::default();

    if let Some(path) = &args.answer_file {
        let answer = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?;
        criteria.set(CriteriaField::ReferenceAnswer(answer));
    }
    if let Some(answer) = &args.answer {
        criteria.set(CriteriaField::ReferenceAnswer(answer.clone()));
    }
    if let Some(max_score) = args.max_score {
        criteria.set(CriteriaField::MaxScore(max_score));
    }
    if let Some(instructions) = &args.instructions {
        criteria.set(CriteriaField::Instructions(instructions.clone()));
    }
    for field in &args.set {
        criteria.set(field.clone());
    }

    Ok(criteria)
}

/// Runs one grading attempt and prints the outcome.
async fn grade(args: GradeArgs) -> Result<ExitCode> {
    let cfg = config::ensure_initialized()?;
    let locale = args.locale.unwrap_or(cfg.locale());
    let service = cfg.service_for(cfg.resolve_backend(args.backend), locale)?;

    let criteria = criteria_from(&args).await?;
    let mut controller = Controller::new(service, locale).with_criteria(criteria);

    let file = if args.image.starts_with("data:") {
        SelectedFile::from_data_url("inline image", &args.image)?
    } else {
        SelectedFile::from_path(&args.image).await?
    };

    if let Err(e) = controller.select_file(SelectionEvent::Picked(file)) {
        eprintln!("{}", locale.images_only());
        tracing::debug!("{e}");
        return Ok(ExitCode::from(2));
    }

    eprintln!("{}", locale.processing());
    match controller.grade().await {
        Ok(Completion::Succeeded) => {}
        Ok(_) | Err(ControllerError::Validation(_)) => {
            eprintln!("{}", controller.message().unwrap_or_default());
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e.into()),
    }

    let result = controller
        .result()
        .context("Grading finished without a result")?;
    let card = ResultCard::new(result, locale);
    if args.json {
        println!("{}", card.to_json()?);
    } else {
        println!("{}", card.render());
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match options() {
        Cmd::Grade(args) => grade(args).await,
        Cmd::Schema(backend) => {
            let cfg = config::ensure_initialized()?;
            let value = match cfg.resolve_backend(backend) {
                Backend::Gemini => schema::gemini_schema(),
                Backend::OpenAi => schema::openai_schema(),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
