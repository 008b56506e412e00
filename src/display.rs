#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use colored::{ColoredString, Colorize};
use itertools::Itertools;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::{client::GradingResult, locale::Locale};

/// Qualitative band of a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    /// 90% and above.
    Excellent,
    /// 75% up to 89%.
    VeryGood,
    /// 50% up to 74%.
    Good,
    /// Below 50%.
    NeedsImprovement,
}

impl Verdict {
    /// Band for a rounded percentage.
    pub fn from_percentage(percentage: i64) -> Self {
        match percentage {
            p if p >= 90 => Verdict::Excellent,
            p if p >= 75 => Verdict::VeryGood,
            p if p >= 50 => Verdict::Good,
            _ => Verdict::NeedsImprovement,
        }
    }
}

/// `round(score / max_score * 100)`, with halves rounded toward positive
/// infinity. Scores are not validated, so this may exceed 100 or be
/// negative; a zero maximum saturates.
pub fn percentage(score: f64, max_score: f64) -> i64 {
    (score / max_score * 100.0 + 0.5).floor() as i64
}

/// Read-only view of a [`GradingResult`] for one locale.
#[derive(Debug, Clone, Copy)]
pub struct ResultCard<'a> {
    /// The rendered result.
    result: &'a GradingResult,
    /// Language for labels and headings.
    locale: Locale,
}

/// Machine-readable rendering: the result plus its derived fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultReport<'a> {
    /// The result as received.
    #[serde(flatten)]
    pub result:     &'a GradingResult,
    /// Rounded percentage.
    pub percentage: i64,
    /// Qualitative band.
    pub verdict:    Verdict,
    /// Localized label of the band.
    pub label:      &'static str,
}

impl<'a> ResultCard<'a> {
    /// Wraps a result for display.
    pub fn new(result: &'a GradingResult, locale: Locale) -> Self {
        Self { result, locale }
    }

    /// Rounded percentage of the maximum score.
    pub fn percentage(&self) -> i64 {
        percentage(self.result.score, self.result.max_score)
    }

    /// Qualitative band of the percentage.
    pub fn verdict(&self) -> Verdict {
        Verdict::from_percentage(self.percentage())
    }

    /// Localized label of the band.
    pub fn label(&self) -> &'static str {
        self.locale.verdict(self.verdict())
    }

    /// JSON-friendly view of the card.
    pub fn report(&self) -> ResultReport<'a> {
        ResultReport {
            result:     self.result,
            percentage: self.percentage(),
            verdict:    self.verdict(),
            label:      self.label(),
        }
    }

    /// Pretty-printed JSON of [`ResultCard::report`].
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.report())
    }

    /// Renders the card for a terminal.
    pub fn render(&self) -> String {
        let h = self.locale.headings();
        let result = self.result;

        let mut summary = Builder::default();
        summary.push_record([
            h.score.to_string(),
            format!("{} / {}", result.score, result.max_score),
        ]);
        summary.push_record([h.percentage.to_string(), format!("{}%", self.percentage())]);
        summary.push_record([String::new(), self.label().to_string()]);
        let mut summary = summary.build();
        summary.with(Style::rounded());

        format!(
            "{title}\n{summary}\n\n\
             {transcribed_h}\n\"{transcribed}\"\n\n\
             {feedback_h}\n{feedback}\n\n\
             {strengths_h}\n{strengths}\n\n\
             {weaknesses_h}\n{weaknesses}\n\n\
             {reasoning_h}\n{reasoning}",
            title = h.title.bold(),
            transcribed_h = h.transcribed.bold(),
            transcribed = result.transcribed_text,
            feedback_h = h.feedback.bold(),
            feedback = result.feedback,
            strengths_h = h.strengths.green().bold(),
            strengths = bullets(&result.strengths, |s| s.green()),
            weaknesses_h = h.weaknesses.red().bold(),
            weaknesses = bullets(&result.weaknesses, |s| s.red()),
            reasoning_h = h.reasoning.blue().bold(),
            reasoning = result.reasoning,
        )
    }
}

/// One indented bullet per item, in order.
fn bullets(items: &[String], paint: impl Fn(&str) -> ColoredString) -> String {
    items
        .iter()
        .map(|item| format!("  - {}", paint(item)))
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoffs_apply_to_the_rounded_percentage() {
        assert_eq!(Verdict::from_percentage(90), Verdict::Excellent);
        assert_eq!(Verdict::from_percentage(89), Verdict::VeryGood);
        assert_eq!(Verdict::from_percentage(75), Verdict::VeryGood);
        assert_eq!(Verdict::from_percentage(74), Verdict::Good);
        assert_eq!(Verdict::from_percentage(50), Verdict::Good);
        assert_eq!(Verdict::from_percentage(49), Verdict::NeedsImprovement);
        // 8.96 / 10 rounds up into the top band
        assert_eq!(Verdict::from_percentage(percentage(8.96, 10.0)), Verdict::Excellent);
    }

    #[test]
    fn out_of_range_scores_are_not_clamped() {
        assert_eq!(percentage(12.0, 10.0), 120);
        assert_eq!(percentage(-1.0, 10.0), -10);
    }

    #[test]
    fn halves_round_toward_positive_infinity() {
        assert_eq!(percentage(1.25, 10.0), 13);
        assert_eq!(percentage(-1.25, 10.0), -12);
    }
}
