// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. `clap` parses the
// arguments; all business logic is delegated to Layer 2.
//
//   train  - train the classifier and write the artifact
//   ask    - answer one question (standalone test harness)
//   serve  - messaging webhook over HTTP
//   chat   - interactive terminal chat with a login gate

pub mod commands;
pub mod webhook;
pub mod chat;

use std::{io, path::Path, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use commands::{AnswerSource, AskArgs, ChatArgs, Commands, ServeArgs, TrainArgs};

use crate::application::{
    ask_use_case::InferencePipeline,
    chat_use_case::ChatService,
    train_use_case::TrainUseCase,
};
use crate::domain::{session::FALLBACK_APOLOGY, traits::QuestionAnswerer};
use crate::infra::{
    checkpoint::ArtifactStore,
    generative::{GenerativeClient, API_KEY_ENV},
    login_store::open_login_store,
};

#[derive(Parser, Debug)]
#[command(
    name = "support-chatbot",
    version,
    about = "Train a question classifier on canned support answers, then answer questions over CLI, webhook or chat."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Ask(args)   => run_ask(args),
            Commands::Serve(args) => run_serve(args),
            Commands::Chat(args)  => run_chat(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on dataset: {}", args.dataset);

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete: {} records ({} after augmentation), {} labels, {} train / {} validation.",
        summary.records, summary.augmented, summary.num_labels, summary.train_size, summary.val_size,
    );
    Ok(())
}

fn run_ask(args: AskArgs) -> Result<()> {
    let translator = args.translation.adapter()?;
    let pipeline = InferencePipeline::load(
        &args.model.artifact_dir, &args.model.dataset, args.model.runs_on, translator,
    )?;

    match pipeline.infer_detailed(&args.question, args.language) {
        Ok(outcome) => {
            println!("\nAnswer: {}", outcome.answer);
            if args.explain {
                println!("Label: {} ({:.1}%)", outcome.label, outcome.confidence * 100.0);
                if outcome.translation_degraded {
                    println!("Note: translation failed; text was passed through untranslated.");
                }
                match ArtifactStore::new(&args.model.artifact_dir).load_train_config() {
                    Ok(cfg) => println!("Model: {}", cfg.describe()),
                    Err(e)  => tracing::warn!("Training settings unavailable: {e}"),
                }
            }
        }
        Err(e) => {
            tracing::warn!("No answer: {e}");
            println!("\nAnswer: {FALLBACK_APOLOGY}");
        }
    }
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    // Built before the async runtime starts: the translation client is blocking.
    let translator = args.translation.adapter()?;
    let pipeline = InferencePipeline::load(
        &args.model.artifact_dir, &args.model.dataset, args.model.runs_on, translator,
    )?;
    webhook::serve(Arc::new(pipeline), &args.addr)
}

fn run_chat(args: ChatArgs) -> Result<()> {
    let answerer: Box<dyn QuestionAnswerer> = match args.source {
        AnswerSource::Classifier => {
            let translator = args.translation.adapter()?;
            Box::new(InferencePipeline::load(
                &args.model.artifact_dir, &args.model.dataset, args.model.runs_on, translator,
            )?)
        }
        AnswerSource::Generative => {
            let api_key = args
                .api_key
                .clone()
                .with_context(|| format!("API key is missing. Set {API_KEY_ENV} to use the generative source."))?;
            let policy = GenerativeClient::load_policy(Path::new(&args.policy))?;
            Box::new(GenerativeClient::new(api_key, &args.generative_url, &args.generative_model, policy)?)
        }
    };

    let store_path = args
        .login_store
        .clone()
        .unwrap_or_else(|| args.persistence.default_path().to_string());
    let store = open_login_store(args.persistence, &store_path)?;

    let service = ChatService::new(answerer, store, args.language);
    let stdin   = io::stdin();
    let mut ui  = chat::ChatUi::new(stdin.lock(), io::stdout(), args.theme);
    ui.run(&service)
}
