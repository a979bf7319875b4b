// ============================================================
// Layer 3 - Label Index
// ============================================================
// Bijection between answer label strings and the dense class
// indices the classifier predicts over.
//
// Indices are assigned by sorting the distinct labels, so the
// same label set always produces the same mapping:
//
//   labels seen:  ["rate", "fees", "rate", "apply"]
//   distinct:     ["apply", "fees", "rate"]
//   index:        apply=0, fees=1, rate=2
//
// The index is fixed at training time and persisted inside the
// artifact. Inference must decode with the persisted copy, never
// with one rebuilt from the dataset.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::error::{ChatbotError, ChatbotResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelIndex {
    labels:    Vec<String>,
    positions: HashMap<String, usize>,
}

impl LabelIndex {
    /// Build the index from every label occurrence in the dataset.
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let distinct: BTreeSet<&str> = labels.into_iter().collect();
        let labels: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let positions = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, positions }
    }

    /// Restore a persisted index. Duplicate entries break the
    /// bijection and are rejected as a corrupt artifact.
    pub fn from_persisted(labels: Vec<String>) -> ChatbotResult<Self> {
        let mut positions = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if positions.insert(label.clone(), i).is_some() {
                return Err(ChatbotError::ModelLoad(format!(
                    "label index lists '{label}' more than once"
                )));
            }
        }
        Ok(Self { labels, positions })
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl TryFrom<Vec<String>> for LabelIndex {
    type Error = ChatbotError;

    fn try_from(labels: Vec<String>) -> ChatbotResult<Self> {
        Self::from_persisted(labels)
    }
}

impl From<LabelIndex> for Vec<String> {
    fn from(index: LabelIndex) -> Self {
        index.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_sorted_order() {
        let index = LabelIndex::fit(["rate", "fees", "rate", "apply"]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.encode("apply"), Some(0));
        assert_eq!(index.encode("fees"),  Some(1));
        assert_eq!(index.encode("rate"),  Some(2));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let index = LabelIndex::fit(["tenure", "rate", "documents", "emi"]);
        for label in index.labels() {
            let i = index.encode(label).unwrap();
            assert_eq!(index.decode(i), Some(label.as_str()));
        }
    }

    #[test]
    fn test_single_label_dataset() {
        let index = LabelIndex::fit(["rate", "rate"]);
        assert_eq!(index.encode("rate"), Some(0));
        assert_eq!(index.decode(1), None);
    }

    #[test]
    fn test_unknown_label() {
        let index = LabelIndex::fit(["rate"]);
        assert_eq!(index.encode("fees"), None);
    }

    #[test]
    fn test_json_roundtrip_keeps_mapping() {
        let index = LabelIndex::fit(["b", "a", "c"]);
        let json  = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"["a","b","c"]"#);
        let back: LabelIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn test_duplicate_persisted_labels_rejected() {
        let err = serde_json::from_str::<LabelIndex>(r#"["a","a"]"#);
        assert!(err.is_err());
        assert!(matches!(
            LabelIndex::from_persisted(vec!["x".into(), "x".into()]),
            Err(ChatbotError::ModelLoad(_))
        ));
    }
}
