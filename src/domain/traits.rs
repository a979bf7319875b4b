// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The seams between the pipeline and the things it treats as
// opaque: where records come from, who scores a question, who
// translates, where logins are written, and who answers in chat.
//
//   RecordSource      - CsvRecordLoader
//   Classifier        - BurnClassifier (any burn backend)
//   Translator        - IdentityTranslator, HttpTranslator
//   LoginStore        - file / spreadsheet / relational stores
//   QuestionAnswerer  - InferencePipeline, GenerativeClient

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::ChatbotResult;
use crate::domain::language::Language;
use crate::domain::question_record::QuestionRecord;
use crate::domain::session::{ConversationMode, LoginRecord};

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Anything that can produce the labelled question table.
pub trait RecordSource {
    fn load_all(&self) -> ChatbotResult<Vec<QuestionRecord>>;
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// Where a classifier runs its forward pass. Only affects how
/// the artifact is loaded, never the pipeline's control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeTarget {
    #[default]
    Cpu,
    Accelerator,
}

impl fmt::Display for ComputeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeTarget::Cpu         => f.write_str("cpu"),
            ComputeTarget::Accelerator => f.write_str("accelerator"),
        }
    }
}

impl FromStr for ComputeTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu"                          => Ok(ComputeTarget::Cpu),
            "accelerator" | "gpu" | "wgpu" => Ok(ComputeTarget::Accelerator),
            other => Err(format!("unknown compute target '{other}' (expected cpu or accelerator)")),
        }
    }
}

/// Scores normalised working-language text.
///
/// Returns one probability per label index; the vector length
/// equals the number of labels the classifier was trained on.
/// Implementations are read-only after load and shared across
/// requests without locking.
pub trait Classifier: Send + Sync {
    fn scores(&self, text: &str) -> ChatbotResult<Vec<f32>>;

    fn runs_on(&self) -> ComputeTarget;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// A translation backend. Same-language and blank-text shortcuts
/// live in `TranslationAdapter`, so backends only see real work.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, source: Language, target: Language) -> ChatbotResult<String>;
}

// ─── LoginStore ───────────────────────────────────────────────────────────────
/// Persistence for presence-only login records.
pub trait LoginStore: Send {
    fn record(&self, record: &LoginRecord) -> ChatbotResult<()>;

    fn load_all(&self) -> ChatbotResult<Vec<LoginRecord>>;
}

// ─── QuestionAnswerer ─────────────────────────────────────────────────────────
/// Anything the chat surface can send a question to.
///
/// Always returns text for the user: failures are already turned
/// into the fallback apology by the implementation.
pub trait QuestionAnswerer: Send + Sync {
    fn answer(&self, question: &str, language: Language, mode: ConversationMode) -> String;
}
