// ============================================================
// Layer 3 - QuestionRecord Domain Type
// ============================================================
// One row of the support dataset: a question as a customer
// might phrase it, the label of the canned answer it maps to,
// and the canned answer text itself.
//
// Example:
//   raw_text:         "What is the interest rate?"
//   answer_label:     "rate"
//   canonical_answer: "12%"

use serde::{Deserialize, Serialize};

/// A labelled question/answer row. Immutable once loaded for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// The question text exactly as it appears in the dataset
    pub raw_text: String,

    /// Categorical identifier of the canned answer
    pub answer_label: String,

    /// The answer returned to the customer for this label
    pub canonical_answer: String,
}

impl QuestionRecord {
    pub fn new(
        raw_text:         impl Into<String>,
        answer_label:     impl Into<String>,
        canonical_answer: impl Into<String>,
    ) -> Self {
        Self {
            raw_text:         raw_text.into(),
            answer_label:     answer_label.into(),
            canonical_answer: canonical_answer.into(),
        }
    }

    /// Copy of this record with a different question text.
    /// Label and answer are always inherited from the parent.
    pub fn with_text(&self, raw_text: impl Into<String>) -> Self {
        Self {
            raw_text:         raw_text.into(),
            answer_label:     self.answer_label.clone(),
            canonical_answer: self.canonical_answer.clone(),
        }
    }
}
