// ============================================================
// Layer 6 - Artifact Store
// ============================================================
// Reads and writes the classifier artifact directory:
//
//   artifacts/
//     model.mpk.gz        ← weights (gzipped named MessagePack)
//     model_config.json   ← architecture needed to rebuild the model
//     train_config.json   ← the full training run configuration
//     label_index.json    ← label strings in index order
//     tokenizer.json      ← written by TokenizerStore
//     metrics.csv         ← written by MetricsLogger
//
// Training writes into a sibling staging directory and commits it
// with a rename, so a reader never sees a half-written artifact.
// Every load failure is reported as ChatbotError::ModelLoad.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{HalfPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::{ChatbotError, ChatbotResult};
use crate::domain::label_index::LabelIndex;
use crate::ml::model::{TransformerClassifier, TransformerClassifierConfig};

const MODEL_FILE:        &str = "model";
const MODEL_CONFIG_FILE: &str = "model_config.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";
const LABEL_INDEX_FILE:  &str = "label_index.json";

type WeightsRecorder = NamedMpkGzFileRecorder<HalfPrecisionSettings>;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A fresh, empty staging directory next to this one.
    pub fn staging(&self) -> Result<ArtifactStore> {
        let mut name = self
            .dir
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "artifact".into());
        name.push(".staging");
        let staging = self.dir.with_file_name(name);

        if staging.exists() {
            fs::remove_dir_all(&staging)
                .with_context(|| format!("Cannot clear stale staging dir '{}'", staging.display()))?;
        }
        fs::create_dir_all(&staging)
            .with_context(|| format!("Cannot create staging dir '{}'", staging.display()))?;

        Ok(ArtifactStore::new(staging))
    }

    /// Replace `target` with this (staging) directory.
    pub fn commit(self, target: &ArtifactStore) -> Result<()> {
        if let Some(parent) = target.dir.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if target.dir.exists() {
            fs::remove_dir_all(&target.dir)
                .with_context(|| format!("Cannot remove old artifact '{}'", target.dir.display()))?;
        }
        fs::rename(&self.dir, &target.dir).with_context(|| {
            format!("Cannot move '{}' to '{}'", self.dir.display(), target.dir.display())
        })?;

        tracing::info!("Artifact committed to '{}'", target.dir.display());
        Ok(())
    }

    // ─── Weights ──────────────────────────────────────────────────────────────

    pub fn save_model<B: Backend>(&self, model: &TransformerClassifier<B>) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;
        tracing::debug!("Saved weights to '{}'", path.display());
        Ok(())
    }

    pub fn load_model<B: Backend>(
        &self,
        model:  TransformerClassifier<B>,
        device: &B::Device,
    ) -> ChatbotResult<TransformerClassifier<B>> {
        let path = self.dir.join(MODEL_FILE);
        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .map_err(|e| ChatbotError::ModelLoad(format!(
                "cannot load weights '{}': {e}. Have you trained the model first?",
                path.display()
            )))?;
        Ok(model.load_record(record))
    }

    // ─── Configuration ────────────────────────────────────────────────────────

    pub fn save_model_config(&self, cfg: &TransformerClassifierConfig) -> Result<()> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        cfg.save(&path)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    pub fn load_model_config(&self) -> ChatbotResult<TransformerClassifierConfig> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        TransformerClassifierConfig::load(&path)
            .map_err(|e| ChatbotError::ModelLoad(format!("cannot read '{}': {e}", path.display())))
    }

    pub fn save_train_config(&self, cfg: &TrainConfig) -> Result<()> {
        write_json(&self.dir.join(TRAIN_CONFIG_FILE), cfg)
    }

    pub fn load_train_config(&self) -> ChatbotResult<TrainConfig> {
        read_json(&self.dir.join(TRAIN_CONFIG_FILE))
    }

    // ─── Label index ──────────────────────────────────────────────────────────

    pub fn save_label_index(&self, index: &LabelIndex) -> Result<()> {
        write_json(&self.dir.join(LABEL_INDEX_FILE), index)
    }

    pub fn load_label_index(&self) -> ChatbotResult<LabelIndex> {
        let index: LabelIndex = read_json(&self.dir.join(LABEL_INDEX_FILE))?;
        if index.is_empty() {
            return Err(ChatbotError::ModelLoad("label index is empty".to_string()));
        }
        Ok(index)
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> ChatbotResult<T> {
    let json = fs::read_to_string(path).map_err(|e| {
        ChatbotError::ModelLoad(format!(
            "cannot read '{}': {e}. Make sure you have run 'train' before 'ask'.",
            path.display()
        ))
    })?;
    serde_json::from_str(&json)
        .map_err(|e| ChatbotError::ModelLoad(format!("corrupt '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_label_index_roundtrip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let index = LabelIndex::fit(["rate", "apply", "fees"]);
        store.save_label_index(&index).unwrap();
        assert_eq!(store.load_label_index().unwrap(), index);
    }

    #[test]
    fn test_train_config_roundtrip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let cfg   = TrainConfig { epochs: 7, ..TrainConfig::default() };
        store.save_train_config(&cfg).unwrap();
        let back = store.load_train_config().unwrap();
        assert_eq!(back.epochs, 7);
        assert_eq!(back.max_seq_len, 128);
    }

    #[test]
    fn test_missing_artifact_is_model_load_error() {
        let store = ArtifactStore::new("/no/such/artifact");
        assert!(matches!(store.load_label_index(), Err(ChatbotError::ModelLoad(_))));
        assert!(matches!(store.load_model_config(), Err(ChatbotError::ModelLoad(_))));
    }

    #[test]
    fn test_corrupt_label_index_is_model_load_error() {
        let dir   = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LABEL_INDEX_FILE), "{not json").unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(store.load_label_index(), Err(ChatbotError::ModelLoad(_))));
    }

    #[test]
    fn test_model_weights_roundtrip() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = ArtifactStore::new(dir.path());
        let device = Default::default();
        let cfg    = TransformerClassifierConfig::new(12, 6, 8, 2, 1, 16, 0.0, 2);
        let model: TransformerClassifier<NdArray> = cfg.init(&device);

        store.save_model_config(&cfg).unwrap();
        store.save_model(&model).unwrap();

        let cfg_back = store.load_model_config().unwrap();
        assert_eq!(cfg_back.num_labels, 2);
        let fresh: TransformerClassifier<NdArray> = cfg_back.init(&device);
        assert!(store.load_model(fresh, &device).is_ok());
    }

    #[test]
    fn test_weights_are_written_gzipped() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = ArtifactStore::new(dir.path());
        let cfg    = TransformerClassifierConfig::new(12, 6, 8, 2, 1, 16, 0.0, 2);
        let model: TransformerClassifier<NdArray> = cfg.init(&Default::default());
        store.save_model(&model).unwrap();

        assert!(dir.path().join("model.mpk.gz").exists());
        assert!(!dir.path().join("model.mpk").exists());
    }

    #[test]
    fn test_staging_commit_replaces_target() {
        let root   = tempfile::tempdir().unwrap();
        let target = ArtifactStore::new(root.path().join("artifacts"));
        fs::create_dir_all(target.dir()).unwrap();
        fs::write(target.dir().join("stale.txt"), "old").unwrap();

        let staging = target.staging().unwrap();
        assert_eq!(staging.dir(), root.path().join("artifacts.staging"));
        staging.save_label_index(&LabelIndex::fit(["rate"])).unwrap();
        staging.commit(&target).unwrap();

        assert!(!target.dir().join("stale.txt").exists());
        assert!(target.load_label_index().is_ok());
        assert!(!root.path().join("artifacts.staging").exists());
    }
}
