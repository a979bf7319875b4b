// ============================================================
// Layer 4 - Text Augmentation
// ============================================================
// Doubles the dataset by emitting, for every record, the record
// itself followed by one synthetic rephrasing.
//
// The rephrasing is a chain of literal, case-sensitive substring
// replacements applied in this order:
//
//   "What" -> "Tell me about"
//   "How"  -> "Explain"
//   "Can"  -> "Is it possible to"
//
// Replacements compound when a question holds several triggers.
// No randomness: the output depends only on the input order.
//
// Example:
//   "What is the interest rate?"
//   -> "Tell me about is the interest rate?"

use crate::domain::question_record::QuestionRecord;

pub const SUBSTITUTIONS: [(&str, &str); 3] = [
    ("What", "Tell me about"),
    ("How",  "Explain"),
    ("Can",  "Is it possible to"),
];

/// The synthetic variant of one question.
/// Equal to the input when no trigger word is present.
pub fn synthesize(question: &str) -> String {
    SUBSTITUTIONS
        .iter()
        .fold(question.to_string(), |text, (from, to)| text.replace(from, to))
}

/// Original rows interleaved with their synthetic variants:
/// [r0, r0', r1, r1', ...]
pub fn augment(records: &[QuestionRecord]) -> Vec<QuestionRecord> {
    let augmented: Vec<QuestionRecord> = records
        .iter()
        .flat_map(|r| [r.clone(), r.with_text(synthesize(&r.raw_text))])
        .collect();

    tracing::debug!("Augmented {} records into {}", records.len(), augmented.len());
    augmented
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_rate_scenario() {
        let records = vec![QuestionRecord::new("What is the interest rate?", "rate", "12%")];
        assert_eq!(augment(&records), vec![
            QuestionRecord::new("What is the interest rate?", "rate", "12%"),
            QuestionRecord::new("Tell me about is the interest rate?", "rate", "12%"),
        ]);
    }

    #[test]
    fn test_doubles_and_keeps_labels() {
        let records = vec![
            QuestionRecord::new("How do I apply?", "apply", "Visit any branch."),
            QuestionRecord::new("Loan tenure?",    "tenure", "Up to 5 years."),
            QuestionRecord::new("Can I prepay?",   "prepay", "Yes."),
        ];
        let out = augment(&records);
        assert_eq!(out.len(), 6);
        for pair in out.chunks(2) {
            assert_eq!(pair[0].answer_label,     pair[1].answer_label);
            assert_eq!(pair[0].canonical_answer, pair[1].canonical_answer);
        }
    }

    #[test]
    fn test_text_changes_only_when_trigger_present() {
        assert_ne!(synthesize("How do I apply?"), "How do I apply?");
        assert_eq!(synthesize("Loan tenure?"),    "Loan tenure?");
        assert_eq!(synthesize(""),                "");
    }

    #[test]
    fn test_case_sensitive_triggers() {
        // lowercase "can" and "what" are not triggers
        assert_eq!(synthesize("what can I do"), "what can I do");
        assert_eq!(synthesize("How can I pay?"), "Explain can I pay?");
    }

    #[test]
    fn test_substitutions_compound() {
        assert_eq!(
            synthesize("What and How? Can I?"),
            "Tell me about and Explain? Is it possible to I?"
        );
    }

    #[test]
    fn test_substring_inside_word_is_replaced() {
        // literal substring match, not whole-word
        assert_eq!(synthesize("Canara bank"), "Is it possible toara bank");
    }
}
