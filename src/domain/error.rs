// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Every failure the chatbot can report, as one typed enum.
//
//   DataFormat          - dataset missing a column or a value (training)
//   ModelLoad           - artifact directory missing or corrupt (startup)
//   LabelNotFound       - predicted label absent from the catalog
//   TranslationService  - the external translation call failed
//   ExternalStore       - login record persistence failed
//   EmptyInput          - nothing to classify
//   Scoring             - tokenisation or forward pass failed
//   Generative          - the generative answer service failed
//
// Application and CLI code wraps these in anyhow::Error with `?`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatbotError {
    #[error("dataset format error: {0}")]
    DataFormat(String),

    #[error("cannot load classifier artifact: {0}")]
    ModelLoad(String),

    #[error("label '{0}' has no answer in the catalog")]
    LabelNotFound(String),

    #[error("translation service error: {0}")]
    TranslationService(String),

    #[error("external store error: {0}")]
    ExternalStore(String),

    #[error("question is empty")]
    EmptyInput,

    #[error("scoring failed: {0}")]
    Scoring(String),

    #[error("generative answer service error: {0}")]
    Generative(String),
}

pub type ChatbotResult<T> = std::result::Result<T, ChatbotError>;
