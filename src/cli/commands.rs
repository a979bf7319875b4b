// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `ask`, `serve` and `chat`
// and all their configurable flags. Deployment settings can also
// come from CHATBOT_* environment variables.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::cli::chat::Theme;
use crate::domain::{language::Language, traits::ComputeTarget};
use crate::infra::{
    generative::{DEFAULT_BASE_URL, DEFAULT_MODEL},
    login_store::PersistenceBackend,
    translation::{HttpTranslator, HttpTranslatorConfig, TranslationAdapter},
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the question classifier on a labelled CSV dataset
    Train(TrainArgs),

    /// Answer one question with a trained classifier
    Ask(AskArgs),

    /// Serve the messaging webhook
    Serve(ServeArgs),

    /// Interactive chat in the terminal
    Chat(ChatArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file with `questions`, `answers` and `labels` columns
    #[arg(long, env = "CHATBOT_DATASET", default_value = "data/dataset.csv")]
    pub dataset: String,

    /// Directory the trained artifact is written to (replaced as a whole)
    #[arg(long, env = "CHATBOT_ARTIFACT_DIR", default_value = "artifacts")]
    pub artifact_dir: String,

    /// Maximum tokens per question, [CLS] and [SEP] included
    #[arg(long, default_value_t = 128)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    /// AdamW decoupled weight decay
    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Fraction of rows held out for validation (rounded up)
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    /// Seed for the train/validation shuffle and the loader shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Hidden dimension of the transformer.
    /// Must be divisible by num_heads
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Upper bound on the tokenizer vocabulary, special tokens included
    #[arg(long, default_value_t = 30522)]
    pub max_vocab: usize,

    /// cpu or accelerator
    #[arg(long, env = "CHATBOT_RUNS_ON", default_value = "cpu")]
    pub runs_on: ComputeTarget,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset_path: a.dataset,
            artifact_dir: a.artifact_dir,
            max_seq_len:  a.max_seq_len,
            batch_size:   a.batch_size,
            epochs:       a.epochs,
            lr:           a.lr,
            weight_decay: a.weight_decay,
            val_fraction: a.val_fraction,
            seed:         a.seed,
            d_model:      a.d_model,
            num_heads:    a.num_heads,
            num_layers:   a.num_layers,
            d_ff:         a.d_ff,
            dropout:      a.dropout,
            max_vocab:    a.max_vocab,
            runs_on:      a.runs_on,
        }
    }
}

/// Where a trained classifier lives and how to run it.
#[derive(Args, Debug)]
pub struct ModelArgs {
    #[arg(long, env = "CHATBOT_ARTIFACT_DIR", default_value = "artifacts")]
    pub artifact_dir: String,

    /// The dataset the answers are read from (same file as used for training)
    #[arg(long, env = "CHATBOT_DATASET", default_value = "data/dataset.csv")]
    pub dataset: String,

    /// cpu or accelerator
    #[arg(long, env = "CHATBOT_RUNS_ON", default_value = "cpu")]
    pub runs_on: ComputeTarget,
}

/// Optional translation service. Without a URL, translation is identity.
#[derive(Args, Debug)]
pub struct TranslationArgs {
    /// LibreTranslate-style endpoint, e.g. http://localhost:5000/translate
    #[arg(long, env = "CHATBOT_TRANSLATE_URL")]
    pub translate_url: Option<String>,

    #[arg(long, env = "CHATBOT_TRANSLATE_API_KEY", hide_env_values = true)]
    pub translate_api_key: Option<String>,

    #[arg(long, default_value_t = 10)]
    pub translate_timeout_secs: u64,

    /// Extra attempts after a failed translation call
    #[arg(long, default_value_t = 0)]
    pub translate_retries: u32,
}

impl TranslationArgs {
    pub fn adapter(&self) -> Result<TranslationAdapter> {
        let Some(url) = &self.translate_url else {
            tracing::info!("No translation service configured; translation is identity");
            return Ok(TranslationAdapter::identity());
        };

        let mut cfg = HttpTranslatorConfig::new(url);
        cfg.api_key     = self.translate_api_key.clone();
        cfg.timeout     = Duration::from_secs(self.translate_timeout_secs);
        cfg.max_retries = self.translate_retries;

        tracing::info!("Translating through '{}'", url);
        Ok(TranslationAdapter::new(Box::new(HttpTranslator::new(cfg)?)))
    }
}

/// All arguments for the `ask` command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to answer
    #[arg(long)]
    pub question: String,

    /// Language the question is written in
    #[arg(long, default_value = "English")]
    pub language: Language,

    /// Also print the predicted label and its probability
    #[arg(long)]
    pub explain: bool,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub translation: TranslationArgs,
}

/// All arguments for the `serve` command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address the webhook listens on
    #[arg(long, env = "CHATBOT_ADDR", default_value = "0.0.0.0:5000")]
    pub addr: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub translation: TranslationArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnswerSource {
    /// Canned answers picked by the trained classifier
    Classifier,
    /// Free-text answers from the generative service, grounded on a policy document
    Generative,
}

/// All arguments for the `chat` command
#[derive(Args, Debug)]
pub struct ChatArgs {
    #[arg(long, value_enum, default_value_t = Theme::Dark)]
    pub theme: Theme,

    /// file, spreadsheet or relational
    #[arg(long, env = "CHATBOT_PERSISTENCE", default_value = "file")]
    pub persistence: PersistenceBackend,

    /// Login record location; defaults to a file named after the backend
    #[arg(long, env = "CHATBOT_LOGIN_STORE")]
    pub login_store: Option<String>,

    #[arg(long, value_enum, default_value_t = AnswerSource::Classifier)]
    pub source: AnswerSource,

    /// Language the conversation is held in
    #[arg(long, default_value = "English")]
    pub language: Language,

    /// Policy document the generative source answers from
    #[arg(long, env = "CHATBOT_POLICY", default_value = "data/policy.md")]
    pub policy: String,

    /// API key for the generative source
    #[arg(long, env = "CHATBOT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "CHATBOT_GENERATIVE_URL", default_value = DEFAULT_BASE_URL)]
    pub generative_url: String,

    #[arg(long, env = "CHATBOT_GENERATIVE_MODEL", default_value = DEFAULT_MODEL)]
    pub generative_model: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub translation: TranslationArgs,
}
