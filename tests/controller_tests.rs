use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use inkgrade::{
    Completion, Controller, ControllerError, CriteriaField, GradingCriteria, GradingError,
    GradingResult, GradingService, LoadingState, Locale, SelectedFile, SelectionError,
    SelectionEvent, SelectionOutcome, ValidationError, display::ResultCard,
};
use tokio::sync::watch;

#[derive(Clone)]
enum Reply {
    Grade(GradingResult),
    Fail,
    FailThen(GradingResult),
    Hold(watch::Receiver<bool>, GradingResult),
}

struct FakeService {
    reply:    Reply,
    calls:    AtomicUsize,
    finished: AtomicUsize,
}

impl FakeService {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GradingService for FakeService {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn grade(
        &self,
        _file: &SelectedFile,
        _criteria: &GradingCriteria,
    ) -> Result<GradingResult, GradingError> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Grade(result) => Ok(result.clone()),
            Reply::Fail => Err(GradingError::EmptyResponse),
            Reply::FailThen(result) if previous > 0 => Ok(result.clone()),
            Reply::FailThen(_) => Err(GradingError::Api {
                status: 503,
                body:   "overloaded".into(),
            }),
            Reply::Hold(release, result) => {
                let mut release = release.clone();
                let _ = release.wait_for(|released| *released).await;
                self.finished.fetch_add(1, Ordering::SeqCst);
                Ok(result.clone())
            }
        }
    }
}

fn result(score: f64, max_score: f64) -> GradingResult {
    GradingResult {
        transcribed_text: "Paris is capital of France".into(),
        score,
        max_score,
        feedback: "Good".into(),
        strengths: vec!["Correct city".into()],
        weaknesses: vec!["Minor phrasing".into()],
        reasoning: "Near-exact match".into(),
    }
}

fn jpeg() -> SelectedFile {
    SelectedFile::new("sheet.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

fn controller(service: Arc<FakeService>) -> Controller {
    Controller::new(service, Locale::English).with_criteria(
        GradingCriteria::builder()
            .reference_answer("Paris is the capital of France")
            .max_score(10.0)
            .build(),
    )
}

#[tokio::test]
async fn blank_reference_answer_never_calls_the_service() {
    let fake = FakeService::new(Reply::Grade(result(9.0, 10.0)));
    let mut ctl = controller(fake.clone());
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");
    ctl.update_criteria(CriteriaField::ReferenceAnswer("   \n".into()))
        .expect("edit");

    let err = ctl.grade().await.expect_err("blank answer");

    assert!(matches!(err, ControllerError::Validation(ValidationError::BlankReferenceAnswer)));
    assert_eq!(ctl.state(), &LoadingState::Idle);
    assert_eq!(ctl.message(), Some("Please enter the reference answer."));
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn missing_file_never_calls_the_service() {
    let fake = FakeService::new(Reply::Grade(result(9.0, 10.0)));
    let mut ctl = controller(fake.clone());

    let err = ctl.grade().await.expect_err("no file");

    assert!(matches!(err, ControllerError::Validation(ValidationError::MissingFile)));
    assert_eq!(ctl.state(), &LoadingState::Idle);
    assert_eq!(ctl.message(), Some(Locale::English.validation(ValidationError::MissingFile)));
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn validation_messages_follow_the_locale() {
    let fake = FakeService::new(Reply::Grade(result(9.0, 10.0)));
    let mut ctl = Controller::new(fake.clone(), Locale::Arabic);

    let _ = ctl.grade().await;

    assert_eq!(ctl.message(), Some("الرجاء رفع ورقة إجابة الطالب."));
}

#[tokio::test]
async fn paris_scenario_shows_ninety_percent_excellent() {
    let fake = FakeService::new(Reply::Grade(result(9.0, 10.0)));
    let mut ctl = controller(fake.clone());
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");

    let completion = ctl.grade().await.expect("grade");

    assert_eq!(completion, Completion::Succeeded);
    assert_eq!(fake.calls(), 1);
    let result = ctl.result().expect("result");
    let card = ResultCard::new(result, Locale::English);
    assert_eq!(card.percentage(), 90);
    assert_eq!(card.label(), "excellent");
    assert_eq!(result.max_score, 10.0);
    assert_eq!(result.strengths, vec!["Correct city".to_string()]);
    assert!(ctl.affordances().result_visible);
    assert!(!ctl.affordances().selector_visible);
}

#[tokio::test]
async fn seven_out_of_ten_is_seventy_percent_good() {
    let fake = FakeService::new(Reply::Grade(result(7.0, 10.0)));
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");

    ctl.grade().await.expect("grade");

    let card = ResultCard::new(ctl.result().expect("result"), Locale::English);
    assert_eq!(card.percentage(), 70);
    assert_eq!(card.label(), "good");
}

#[tokio::test]
async fn max_score_always_comes_from_the_criteria() {
    let fake = FakeService::new(Reply::Grade(result(9.0, 99.0)));
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");

    ctl.grade().await.expect("grade");

    assert_eq!(ctl.result().expect("result").max_score, 10.0);
}

#[tokio::test]
async fn rejected_file_keeps_the_previous_preview() {
    let fake = FakeService::new(Reply::Grade(result(9.0, 10.0)));
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");
    let before = ctl.load_preview().await.expect("preview").to_string();
    assert!(before.starts_with("data:image/jpeg;base64,"));

    let pdf = SelectedFile::new("sheet.pdf", "application/pdf", b"%PDF-1.7".to_vec());
    let err = ctl
        .select_file(SelectionEvent::Dropped(pdf))
        .expect_err("pdf rejected");

    assert!(matches!(
        err,
        ControllerError::Selection(SelectionError::UnsupportedMediaType(ref t)) if t == "application/pdf"
    ));
    assert_eq!(ctl.selector().preview(), Some(before.as_str()));
    assert_eq!(ctl.selector().selected().map(|f| f.name()), Some("sheet.jpg"));
    assert_eq!(ctl.state(), &LoadingState::Idle);
}

#[tokio::test]
async fn selecting_a_new_file_discards_the_old_preview() {
    let fake = FakeService::new(Reply::Grade(result(9.0, 10.0)));
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");
    ctl.load_preview().await.expect("preview");

    let png = SelectedFile::new("other.png", "image/png", vec![0x89, 0x50]);
    let outcome = ctl
        .select_file(SelectionEvent::Dropped(png.clone()))
        .expect("select png");

    assert_eq!(outcome, SelectionOutcome::Selected(png));
    assert_eq!(ctl.selector().preview(), None);
    let preview = ctl.load_preview().await.expect("new preview");
    assert!(preview.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn reset_from_success_clears_everything() {
    let fake = FakeService::new(Reply::Grade(result(9.0, 10.0)));
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");
    ctl.grade().await.expect("grade");
    assert!(ctl.update_criteria(CriteriaField::MaxScore(5.0)).is_err());

    ctl.reset();

    assert_eq!(ctl.state(), &LoadingState::Idle);
    assert!(ctl.result().is_none());
    assert!(ctl.selector().selected().is_none());
    assert!(ctl.selector().preview().is_none());
    assert!(ctl.message().is_none());
    assert_eq!(ctl.criteria().reference_answer, "Paris is the capital of France");
}

#[tokio::test]
async fn failures_show_one_generic_message_and_can_be_retried() {
    let fake = FakeService::new(Reply::FailThen(result(6.0, 10.0)));
    let mut ctl = controller(fake.clone());
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");

    let completion = ctl.grade().await.expect("first attempt");

    assert_eq!(completion, Completion::Failed);
    assert_eq!(ctl.state(), &LoadingState::Error(Locale::English.grading_failed().to_string()));
    assert_eq!(ctl.message(), Some(Locale::English.grading_failed()));
    let affordances = ctl.affordances();
    assert!(affordances.can_grade);
    assert!(affordances.can_reset);
    assert!(!affordances.result_visible);

    let completion = ctl.grade().await.expect("retry");

    assert_eq!(completion, Completion::Succeeded);
    assert_eq!(fake.calls(), 2);
    assert!(ctl.message().is_none());
}

#[tokio::test]
async fn every_failure_kind_looks_the_same() {
    let fake = FakeService::new(Reply::Fail);
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");

    ctl.grade().await.expect("attempt");

    assert_eq!(ctl.message(), Some(Locale::English.grading_failed()));
    ctl.dismiss_error().expect("dismiss");
    assert_eq!(ctl.state(), &LoadingState::Idle);
    assert!(ctl.selector().selected().is_some());
    assert!(ctl.dismiss_error().is_err());
}

#[tokio::test]
async fn inputs_are_locked_while_processing() {
    let (release, hold) = watch::channel(false);
    let fake = FakeService::new(Reply::Hold(hold, result(8.0, 10.0)));
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");

    let attempt = ctl.begin_grading().expect("begin");

    assert!(matches!(ctl.state(), LoadingState::Processing { attempt: id } if *id == attempt.id()));
    let affordances = ctl.affordances();
    assert!(!affordances.form_enabled);
    assert!(!affordances.selector_enabled);
    assert!(!affordances.can_grade);
    assert!(ctl.update_criteria(CriteriaField::MaxScore(5.0)).is_err());
    assert!(matches!(ctl.begin_grading(), Err(ControllerError::State(_))));
    let dropped = ctl
        .select_file(SelectionEvent::Dropped(SelectedFile::new("x.png", "image/png", vec![1u8])))
        .expect("drop while busy");
    assert_eq!(dropped, SelectionOutcome::Ignored);

    release.send(true).expect("release");
    assert_eq!(ctl.finish(attempt).await, Completion::Succeeded);
    assert_eq!(ctl.selector().selected().map(|f| f.name()), Some("sheet.jpg"));
}

#[tokio::test]
async fn reset_discards_the_in_flight_response() {
    let (release, hold) = watch::channel(false);
    let fake = FakeService::new(Reply::Hold(hold, result(8.0, 10.0)));
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");

    let attempt = ctl.begin_grading().expect("begin");
    ctl.reset();
    release.send(true).expect("release");

    assert_eq!(ctl.finish(attempt).await, Completion::Discarded);
    assert_eq!(ctl.state(), &LoadingState::Idle);
    assert!(ctl.result().is_none());
}

#[tokio::test]
async fn stale_outcomes_never_replace_a_newer_attempt() {
    let (release, hold) = watch::channel(false);
    let fake = FakeService::new(Reply::Hold(hold, result(8.0, 10.0)));
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");
    let first = ctl.begin_grading().expect("first");
    let first_id = first.id();
    ctl.reset();
    assert_eq!(ctl.finish(first).await, Completion::Discarded);

    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select again");
    let second = ctl.begin_grading().expect("second");
    assert_ne!(second.id(), first_id);

    assert_eq!(ctl.apply(first_id, Ok(result(1.0, 10.0))), Completion::Discarded);
    assert!(matches!(ctl.state(), LoadingState::Processing { .. }));

    release.send(true).expect("release");
    assert_eq!(ctl.finish(second).await, Completion::Succeeded);
    assert_eq!(ctl.result().expect("result").score, 8.0);
}

#[tokio::test]
async fn dropping_the_controller_cancels_the_call() {
    let (release, hold) = watch::channel(false);
    let fake = FakeService::new(Reply::Hold(hold, result(8.0, 10.0)));
    let mut ctl = controller(fake.clone());
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");
    ctl.begin_grading().expect("begin");

    drop(ctl);
    release.send(true).expect("release");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(fake.finished(), 0);
}

#[tokio::test]
async fn abandoned_grading_returns_to_idle_and_can_run_again() {
    let (release, hold) = watch::channel(false);
    let fake = FakeService::new(Reply::Hold(hold, result(8.0, 10.0)));
    let mut ctl = controller(fake.clone());
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");

    let timed_out = tokio::time::timeout(Duration::from_millis(20), ctl.grade()).await;

    assert!(timed_out.is_err());
    assert_eq!(ctl.state(), &LoadingState::Idle);
    assert!(ctl.affordances().can_grade);
    assert!(ctl.affordances().selector_enabled);
    assert_eq!(ctl.selector().selected().map(|f| f.name()), Some("sheet.jpg"));

    release.send(true).expect("release");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fake.finished(), 0);

    assert_eq!(ctl.grade().await.expect("second run"), Completion::Succeeded);
    assert_eq!(fake.finished(), 1);
}

#[tokio::test]
async fn file_selection_is_refused_while_a_result_is_shown() {
    let fake = FakeService::new(Reply::Grade(result(9.0, 10.0)));
    let mut ctl = controller(fake);
    ctl.select_file(SelectionEvent::Picked(jpeg()))
        .expect("select");
    ctl.grade().await.expect("grade");

    let png = SelectedFile::new("other.png", "image/png", vec![0x89, 0x50]);
    let err = ctl
        .select_file(SelectionEvent::Picked(png))
        .expect_err("refused");

    assert!(matches!(err, ControllerError::State(_)));
    assert_eq!(ctl.selector().selected().map(|f| f.name()), Some("sheet.jpg"));
    assert!(ctl.result().is_some());
}
