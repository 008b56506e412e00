use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{display::Verdict, error::ValidationError};

/// Language used for every user-facing string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    English,
    /// Arabic.
    Arabic,
}

impl Locale {
    /// Message shown when grading is requested with a missing precondition.
    pub fn validation(self, err: ValidationError) -> &'static str {
        match (self, err) {
            (Locale::English, ValidationError::MissingFile) => {
                "Please upload the student's answer sheet."
            }
            (Locale::English, ValidationError::BlankReferenceAnswer) => {
                "Please enter the reference answer."
            }
            (Locale::Arabic, ValidationError::MissingFile) => "الرجاء رفع ورقة إجابة الطالب.",
            (Locale::Arabic, ValidationError::BlankReferenceAnswer) => {
                "الرجاء إدخال الإجابة النموذجية."
            }
        }
    }

    /// The single message shown for every grading failure.
    pub fn grading_failed(self) -> &'static str {
        match self {
            Locale::English => {
                "Something went wrong while processing the sheet. Please try again and make sure \
                 the image is clear."
            }
            Locale::Arabic => {
                "حدث خطأ أثناء معالجة الورقة. الرجاء المحاولة مرة أخرى والتأكد من وضوح الصورة."
            }
        }
    }

    /// Warning raised when a non-image file is offered to the selector.
    pub fn images_only(self) -> &'static str {
        match self {
            Locale::English => "Please upload an image file only (JPG, PNG).",
            Locale::Arabic => "الرجاء رفع ملف صورة فقط (JPG, PNG)",
        }
    }

    /// Shown while an attempt is in flight.
    pub fn processing(self) -> &'static str {
        match self {
            Locale::English => "Reading the handwriting and analysing the answer...",
            Locale::Arabic => "جاري قراءة خط اليد وتحليل الإجابة...",
        }
    }

    /// Qualitative label for a verdict.
    pub fn verdict(self, verdict: Verdict) -> &'static str {
        match (self, verdict) {
            (Locale::English, Verdict::Excellent) => "excellent",
            (Locale::English, Verdict::VeryGood) => "very good",
            (Locale::English, Verdict::Good) => "good",
            (Locale::English, Verdict::NeedsImprovement) => "needs improvement",
            (Locale::Arabic, Verdict::Excellent) => "ممتاز!",
            (Locale::Arabic, Verdict::VeryGood) => "جيد جداً",
            (Locale::Arabic, Verdict::Good) => "جيد",
            (Locale::Arabic, Verdict::NeedsImprovement) => "يحتاج تحسين",
        }
    }

    /// Section headings used by the result card.
    pub fn headings(self) -> Headings {
        match self {
            Locale::English => Headings {
                title:       "Grading result",
                score:       "Score",
                percentage:  "Percentage",
                transcribed: "Text extracted from the image",
                feedback:    "Overall assessment",
                strengths:   "Strengths",
                weaknesses:  "Needs improvement",
                reasoning:   "Reason for the grade",
            },
            Locale::Arabic => Headings {
                title:       "نتيجة التصحيح",
                score:       "الدرجة",
                percentage:  "النسبة المئوية",
                transcribed: "النص المستخرج من الصورة",
                feedback:    "التقييم العام",
                strengths:   "نقاط القوة",
                weaknesses:  "نقاط تحتاج تحسين",
                reasoning:   "سبب الدرجة",
            },
        }
    }
}

/// Localized headings for the result card.
#[derive(Debug, Clone, Copy)]
pub struct Headings {
    /// Card title.
    pub title:       &'static str,
    /// Score row.
    pub score:       &'static str,
    /// Percentage row.
    pub percentage:  &'static str,
    /// Transcription block.
    pub transcribed: &'static str,
    /// Feedback block.
    pub feedback:    &'static str,
    /// Strengths list.
    pub strengths:   &'static str,
    /// Weaknesses list.
    pub weaknesses:  &'static str,
    /// Reasoning block.
    pub reasoning:   &'static str,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "ar" | "arabic" => Ok(Locale::Arabic),
            other => Err(format!("unknown locale `{other}`, expected `en` or `ar`")),
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::English => write!(f, "en"),
            Locale::Arabic => write!(f, "ar"),
        }
    }
}
