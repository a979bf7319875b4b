// ============================================================
// Layer 5 - Inferencer
// ============================================================
// Loads the trained classifier artifact onto a burn backend and
// exposes it through the Classifier trait:
//
//   normalised question ─► QuestionEncoder ─► [1, S] ids + mask
//                       ─► TransformerClassifier ─► logits [1, L]
//                       ─► softmax ─► Vec<f32> of length L
//
// ComputeTarget::Cpu loads onto NdArray, ComputeTarget::Accelerator
// onto Wgpu. Callers never see which one they got.

use std::sync::Mutex;

use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::{batcher::ClassificationBatcher, dataset::ClassificationSample};
use crate::domain::error::{ChatbotError, ChatbotResult};
use crate::domain::traits::{Classifier, ComputeTarget};
use crate::infra::checkpoint::ArtifactStore;
use crate::infra::tokenizer_store::{QuestionEncoder, TokenizerStore};
use crate::ml::model::TransformerClassifier;

/// Index of the highest score. Ties go to the lowest index.
/// Returns None for an empty slice.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

pub struct BurnClassifier<B: Backend> {
    // burn modules are Send but not Sync; the lock lets one loaded
    // model serve concurrent requests.
    model:   Mutex<TransformerClassifier<B>>,
    encoder: QuestionEncoder,
    device:  B::Device,
    runs_on: ComputeTarget,
}

impl<B: Backend> BurnClassifier<B> {
    pub fn new(
        model:   TransformerClassifier<B>,
        encoder: QuestionEncoder,
        device:  B::Device,
        runs_on: ComputeTarget,
    ) -> Self {
        Self { model: Mutex::new(model), encoder, device, runs_on }
    }

    /// Rebuild the architecture from model_config.json and load the weights.
    pub fn from_artifact(
        store:   &ArtifactStore,
        device:  B::Device,
        runs_on: ComputeTarget,
    ) -> ChatbotResult<Self> {
        let model_cfg = store.load_model_config()?;

        let tokenizer = TokenizerStore::new(store.dir())
            .load()
            .map_err(|e| ChatbotError::ModelLoad(format!("{e:#}")))?;
        let encoder = QuestionEncoder::new(tokenizer, model_cfg.max_seq_len)
            .map_err(|e| ChatbotError::ModelLoad(format!("{e:#}")))?;

        let model: TransformerClassifier<B> = model_cfg.init(&device);
        let model = store.load_model(model, &device)?;
        tracing::info!(
            "Classifier loaded from '{}' ({} labels, runs on {})",
            store.dir().display(), model_cfg.num_labels, runs_on,
        );

        Ok(Self::new(model, encoder, device, runs_on))
    }
}

impl<B: Backend> Classifier for BurnClassifier<B>
where
    B::Device: Send + Sync,
{
    fn scores(&self, text: &str) -> ChatbotResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(ChatbotError::EmptyInput);
        }

        let (input_ids, attention_mask) = self
            .encoder
            .encode(text)
            .map_err(|e| ChatbotError::Scoring(format!("{e:#}")))?;
        let sample = ClassificationSample { input_ids, attention_mask, label: 0 };
        let batch  = ClassificationBatcher::new().build::<B>(vec![sample], &self.device);

        let logits = {
            let model = self
                .model
                .lock()
                .map_err(|_| ChatbotError::Scoring("classifier lock poisoned".to_string()))?;
            model.forward(batch.input_ids, batch.padding_mask)
        };

        let [_, num_labels] = logits.dims();
        let probs = softmax(logits, 1).reshape([num_labels]);
        probs
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| ChatbotError::Scoring(format!("cannot read scores: {e:?}")))
    }

    fn runs_on(&self) -> ComputeTarget {
        self.runs_on
    }
}

/// Load the artifact in `store` onto the backend for `runs_on`.
pub fn load_classifier(store: &ArtifactStore, runs_on: ComputeTarget) -> ChatbotResult<Box<dyn Classifier>> {
    Ok(match runs_on {
        ComputeTarget::Cpu => Box::new(BurnClassifier::<NdArray>::from_artifact(
            store, NdArrayDevice::default(), runs_on,
        )?),
        ComputeTarget::Accelerator => Box::new(BurnClassifier::<Wgpu>::from_artifact(
            store, WgpuDevice::default(), runs_on,
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::TransformerClassifierConfig;

    #[test]
    fn test_argmax_picks_highest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
    }

    #[test]
    fn test_argmax_ties_go_to_lowest_index() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), Some(0));
        assert_eq!(argmax(&[0.1, 0.45, 0.45]), Some(1));
    }

    #[test]
    fn test_argmax_empty() {
        assert_eq!(argmax(&[]), None);
    }

    fn untrained_artifact(dir: &std::path::Path) -> ArtifactStore {
        let store = ArtifactStore::new(dir);
        let tok = TokenizerStore::new(dir)
            .build_and_save(&["what is the interest rate".to_string(), "how do i apply".to_string()], 100)
            .unwrap();
        let encoder = QuestionEncoder::new(tok, 12).unwrap();
        let cfg = TransformerClassifierConfig::new(encoder.vocab_size(), 12, 8, 2, 1, 16, 0.0, 3);
        let model: TransformerClassifier<NdArray> = cfg.init(&NdArrayDevice::default());
        store.save_model_config(&cfg).unwrap();
        store.save_model(&model).unwrap();
        store
    }

    #[test]
    fn test_loaded_classifier_returns_distribution() {
        let dir   = tempfile::tempdir().unwrap();
        let store = untrained_artifact(dir.path());

        let classifier = load_classifier(&store, ComputeTarget::Cpu).unwrap();
        assert_eq!(classifier.runs_on(), ComputeTarget::Cpu);

        let scores = classifier.scores("what is the interest rate").unwrap();
        assert_eq!(scores.len(), 3);
        let total: f32 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_blank_text_is_empty_input() {
        let dir   = tempfile::tempdir().unwrap();
        let store = untrained_artifact(dir.path());
        let classifier = load_classifier(&store, ComputeTarget::Cpu).unwrap();
        assert!(matches!(classifier.scores("  "), Err(ChatbotError::EmptyInput)));
    }

    #[test]
    fn test_missing_artifact_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_classifier(&ArtifactStore::new(dir.path()), ComputeTarget::Cpu);
        assert!(matches!(result, Err(ChatbotError::ModelLoad(_))));
    }
}
