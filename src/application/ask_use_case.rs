// ============================================================
// Layer 2 - Inference Pipeline (AskUseCase)
// ============================================================
// Answers one question in the caller's language:
//
//   Step 1: Translate into the working language   (fail-open)
//   Step 2: Normalise the text                    (Layer 4)
//   Step 3: Score with the classifier, arg-max    (Layer 5)
//   Step 4: Decode the label, resolve the answer  (Layer 3)
//   Step 5: Translate the answer back             (fail-open)
//
// `infer` reports failures as typed errors. `respond` is the
// user-facing entry point and turns every failure into the fixed
// apology. Nothing is cached: each call re-tokenises and
// re-scores.
//
// The pipeline is immutable after construction and is shared
// across webhook requests behind an Arc.

use std::path::Path;

use anyhow::Result;

use crate::data::{loader::CsvRecordLoader, preprocessor::Preprocessor};
use crate::domain::{
    catalog::LabelCatalog,
    error::{ChatbotError, ChatbotResult},
    label_index::LabelIndex,
    language::{Language, WORKING_LANGUAGE},
    session::{ConversationMode, FALLBACK_APOLOGY},
    traits::{Classifier, ComputeTarget, QuestionAnswerer, RecordSource},
};
use crate::infra::{checkpoint::ArtifactStore, translation::TranslationAdapter};
use crate::ml::inferencer::{argmax, load_classifier};

/// Everything one inference produced, for logging and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOutcome {
    pub answer:               String,
    pub label:                String,
    pub confidence:           f32,
    /// True when a translation step failed and text passed through untranslated.
    pub translation_degraded: bool,
}

pub struct InferencePipeline {
    classifier:   Box<dyn Classifier>,
    label_index:  LabelIndex,
    catalog:      LabelCatalog,
    translator:   TranslationAdapter,
    preprocessor: Preprocessor,
}

impl InferencePipeline {
    /// Load the artifact and the answer table from disk. An artifact
    /// whose model and label index disagree is refused here.
    pub fn load(
        artifact_dir: impl AsRef<Path>,
        dataset_path: impl AsRef<Path>,
        runs_on:      ComputeTarget,
        translator:   TranslationAdapter,
    ) -> Result<Self> {
        let store       = ArtifactStore::new(artifact_dir.as_ref());
        let label_index = store.load_label_index()?;
        let model_cfg   = store.load_model_config()?;
        if model_cfg.num_labels != label_index.len() {
            return Err(ChatbotError::ModelLoad(format!(
                "model in '{}' predicts {} labels but label_index.json lists {}",
                store.dir().display(),
                model_cfg.num_labels,
                label_index.len(),
            ))
            .into());
        }
        let classifier  = load_classifier(&store, runs_on)?;
        let records     = CsvRecordLoader::new(dataset_path).load_all()?;
        let catalog     = LabelCatalog::from_records(&records);

        Ok(Self::from_parts(classifier, label_index, catalog, translator))
    }

    /// Assemble a pipeline from already-loaded parts.
    pub fn from_parts(
        classifier:  Box<dyn Classifier>,
        label_index: LabelIndex,
        catalog:     LabelCatalog,
        translator:  TranslationAdapter,
    ) -> Self {
        // The dataset may have changed since training.
        for label in label_index.labels() {
            if !catalog.contains(label) {
                tracing::warn!("Label '{}' was trained on but has no answer in the current dataset", label);
            }
        }
        tracing::debug!(
            "Pipeline ready: {} labels, {} catalog rows, classifier on {}",
            label_index.len(), catalog.len(), classifier.runs_on(),
        );
        Self {
            classifier,
            label_index,
            catalog,
            translator,
            preprocessor: Preprocessor::new(),
        }
    }

    pub fn runs_on(&self) -> ComputeTarget {
        self.classifier.runs_on()
    }

    /// Answer text for `question`, or the reason there is none.
    pub fn infer(&self, question: &str, language: Language) -> ChatbotResult<String> {
        self.infer_detailed(question, language).map(|o| o.answer)
    }

    pub fn infer_detailed(&self, question: &str, language: Language) -> ChatbotResult<InferenceOutcome> {
        if question.trim().is_empty() {
            return Err(ChatbotError::EmptyInput);
        }
        let mut degraded = false;

        // ── Step 1: into the working language ─────────────────────────────────
        let working = self.translate_fail_open(question, language, WORKING_LANGUAGE, &mut degraded);

        // ── Step 2: normalise ─────────────────────────────────────────────────
        let text = self.preprocessor.normalize(&working);
        if text.is_empty() {
            return Err(ChatbotError::EmptyInput);
        }

        // ── Step 3: score ─────────────────────────────────────────────────────
        let scores = self.classifier.scores(&text)?;
        if scores.len() != self.label_index.len() {
            return Err(ChatbotError::Scoring(format!(
                "classifier returned {} scores for {} labels",
                scores.len(),
                self.label_index.len()
            )));
        }
        let index = argmax(&scores)
            .ok_or_else(|| ChatbotError::Scoring("classifier returned no scores".to_string()))?;

        // ── Step 4: label → answer ────────────────────────────────────────────
        let label = self
            .label_index
            .decode(index)
            .ok_or_else(|| ChatbotError::LabelNotFound(format!("#{index}")))?;
        let answer = self.catalog.resolve(label).map_err(|e| {
            tracing::error!("{e}");
            e
        })?;
        tracing::debug!("'{}' → label '{}' ({:.3})", text, label, scores[index]);

        // ── Step 5: back into the caller's language ───────────────────────────
        let answer = self.translate_fail_open(answer, WORKING_LANGUAGE, language, &mut degraded);

        Ok(InferenceOutcome {
            answer,
            label:                label.to_string(),
            confidence:           scores[index],
            translation_degraded: degraded,
        })
    }

    /// User-facing answer. Never fails: any error becomes the apology.
    pub fn respond(&self, question: &str, language: Language) -> String {
        match self.infer(question, language) {
            Ok(answer) => answer,
            Err(ChatbotError::EmptyInput) => {
                tracing::debug!("Empty question; replying with the apology");
                FALLBACK_APOLOGY.to_string()
            }
            Err(e) => {
                tracing::warn!("Inference failed: {e}");
                FALLBACK_APOLOGY.to_string()
            }
        }
    }

    fn translate_fail_open(&self, text: &str, source: Language, target: Language, degraded: &mut bool) -> String {
        match self.translator.translate(text, source, target) {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!("Translation {} → {} failed, passing text through: {e}", source, target);
                *degraded = true;
                text.to_string()
            }
        }
    }
}

impl QuestionAnswerer for InferencePipeline {
    /// Canned answers are fixed text, so the mode is ignored.
    fn answer(&self, question: &str, language: Language, _mode: ConversationMode) -> String {
        self.respond(question, language)
    }
}
