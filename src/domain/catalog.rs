// ============================================================
// Layer 3 - Label Catalog / Answer Resolver
// ============================================================
// The (label, canonical answer) table, kept in dataset order.
// Resolving a label returns the answer of the FIRST row that
// carries it, so reordering the dataset can change which answer
// wins when a label has several rows.

use crate::domain::error::{ChatbotError, ChatbotResult};
use crate::domain::question_record::QuestionRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CatalogEntry {
    label:  String,
    answer: String,
}

#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    entries: Vec<CatalogEntry>,
}

impl LabelCatalog {
    pub fn from_records(records: &[QuestionRecord]) -> Self {
        let entries = records
            .iter()
            .map(|r| CatalogEntry {
                label:  r.answer_label.clone(),
                answer: r.canonical_answer.clone(),
            })
            .collect();
        Self { entries }
    }

    /// First matching answer in table order.
    pub fn resolve(&self, label: &str) -> ChatbotResult<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.answer.as_str())
            .ok_or_else(|| ChatbotError::LabelNotFound(label.to_string()))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e.label == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LabelCatalog {
        LabelCatalog::from_records(&[
            QuestionRecord::new("What is the interest rate?", "rate", "12%"),
            QuestionRecord::new("How do I apply?",            "apply", "Visit any branch."),
            QuestionRecord::new("Is the rate fixed?",         "rate", "Rates are floating."),
        ])
    }

    #[test]
    fn test_resolves_first_row_in_table_order() {
        assert_eq!(catalog().resolve("rate").unwrap(), "12%");
    }

    #[test]
    fn test_resolves_other_labels() {
        assert_eq!(catalog().resolve("apply").unwrap(), "Visit any branch.");
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let err = catalog().resolve("fees").unwrap_err();
        assert!(matches!(err, ChatbotError::LabelNotFound(l) if l == "fees"));
    }

    #[test]
    fn test_contains() {
        let c = catalog();
        assert!(c.contains("apply"));
        assert!(!c.contains("fees"));
        assert_eq!(c.len(), 3);
    }
}
