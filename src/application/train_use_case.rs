// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the CSV dataset          (Layer 4 - data)
//   Step 2: Augment with rephrasings      (Layer 4 - data)
//   Step 3: Index the labels              (Layer 3 - domain)
//   Step 4: Split train/validation        (Layer 4 - data)
//   Step 5: Build the tokenizer           (Layer 6 - infra)
//   Step 6: Encode both splits            (Layer 4 - data)
//   Step 7: Save configs + label index    (Layer 6 - infra)
//   Step 8: Run training loop             (Layer 5 - ml)
//   Step 9: Save weights and commit       (Layer 6 - infra)
//
// Everything is written into a staging directory first; the
// artifact directory is only replaced once every file is on disk.
// Any failure aborts the run and leaves the old artifact alone.

use anyhow::{Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    augmenter::augment,
    dataset::{ClassificationDataset, ClassificationSample},
    loader::CsvRecordLoader,
    preprocessor::Preprocessor,
    splitter::split_train_val,
};
use crate::domain::{
    label_index::LabelIndex,
    question_record::QuestionRecord,
    traits::{ComputeTarget, RecordSource},
};
use crate::infra::{
    checkpoint::ArtifactStore,
    metrics::MetricsLogger,
    tokenizer_store::{QuestionEncoder, TokenizerStore},
};
use crate::ml::{model::TransformerClassifierConfig, trainer::run_training};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Saved into the artifact
// as train_config.json so a run can be traced back to its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset_path:  String,
    pub artifact_dir:  String,
    pub max_seq_len:   usize,
    pub batch_size:    usize,
    pub epochs:        usize,
    pub lr:            f64,
    pub weight_decay:  f64,
    pub val_fraction:  f64,
    pub seed:          u64,
    pub d_model:       usize,
    pub num_heads:     usize,
    pub num_layers:    usize,
    pub d_ff:          usize,
    pub dropout:       f64,
    pub max_vocab:     usize,
    pub runs_on:       ComputeTarget,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset_path:  "data/dataset.csv".to_string(),
            artifact_dir:  "artifacts".to_string(),
            max_seq_len:   128,
            batch_size:    16,
            epochs:        3,
            lr:            2e-5,
            weight_decay:  0.01,
            val_fraction:  0.2,
            seed:          42,
            d_model:       256,
            num_heads:     8,
            num_layers:    6,
            d_ff:          1024,
            dropout:       0.1,
            max_vocab:     30522,
            runs_on:       ComputeTarget::Cpu,
        }
    }
}

impl TrainConfig {
    /// One line naming the data and the main settings of the run.
    pub fn describe(&self) -> String {
        format!(
            "trained on '{}' for {} epochs (batch {}, lr {:e}, seq len {}, seed {}, {} layers, runs on {})",
            self.dataset_path, self.epochs, self.batch_size, self.lr,
            self.max_seq_len, self.seed, self.num_layers, self.runs_on,
        )
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub records:    usize,
    pub augmented:  usize,
    pub num_labels: usize,
    pub train_size: usize,
    pub val_size:   usize,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Load the dataset ──────────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.dataset_path);
        let records = CsvRecordLoader::new(&cfg.dataset_path).load_all()?;
        tracing::info!("Loaded {} records", records.len());

        // ── Step 2: Augment ───────────────────────────────────────────────────
        let augmented = augment(&records);
        let augmented_len = augmented.len();
        tracing::info!("Augmented to {} records", augmented_len);

        // ── Step 3: Label index ───────────────────────────────────────────────
        let label_index = LabelIndex::fit(augmented.iter().map(|r| r.answer_label.as_str()));
        tracing::info!("Indexed {} distinct labels", label_index.len());

        // ── Step 4: Seeded train / validation split ───────────────────────────
        let (train_records, val_records) = split_train_val(augmented, cfg.val_fraction, cfg.seed);
        tracing::info!("Split: {} train, {} validation", train_records.len(), val_records.len());

        // ── Step 5: Tokenizer from the training split only ────────────────────
        let target  = ArtifactStore::new(&cfg.artifact_dir);
        let staging = target.staging()?;

        let preprocessor = Preprocessor::new();
        let normalize = |records: &[QuestionRecord]| -> Vec<String> {
            records.iter().map(|r| preprocessor.normalize(&r.raw_text)).collect()
        };
        let train_questions = normalize(&train_records);
        let val_questions   = normalize(&val_records);

        let tokenizer = TokenizerStore::new(staging.dir()).build_and_save(&train_questions, cfg.max_vocab)?;
        let encoder   = QuestionEncoder::new(tokenizer, cfg.max_seq_len)?;

        // ── Step 6: Encode samples ────────────────────────────────────────────
        let encode = |questions: &[String], records: &[QuestionRecord]| -> Result<Vec<ClassificationSample>> {
            questions
                .iter()
                .zip(records)
                .map(|(question, record)| {
                    let (input_ids, attention_mask) = encoder.encode(question)?;
                    let label = label_index
                        .encode(&record.answer_label)
                        .with_context(|| format!("label '{}' missing from index", record.answer_label))?;
                    Ok(ClassificationSample { input_ids, attention_mask, label })
                })
                .collect()
        };
        let train_samples = encode(&train_questions, &train_records)?;
        let val_samples   = encode(&val_questions, &val_records)?;

        let longest = train_samples
            .iter()
            .chain(&val_samples)
            .map(ClassificationSample::token_count)
            .max()
            .unwrap_or(0);
        tracing::debug!("Longest encoded question: {} of {} tokens", longest, cfg.max_seq_len);

        let summary = TrainSummary {
            records:    records.len(),
            augmented:  augmented_len,
            num_labels: label_index.len(),
            train_size: train_samples.len(),
            val_size:   val_samples.len(),
        };

        // ── Step 7: Configs and label index ───────────────────────────────────
        let model_cfg = TransformerClassifierConfig::new(
            encoder.vocab_size(), cfg.max_seq_len, cfg.d_model,
            cfg.num_heads, cfg.num_layers, cfg.d_ff, cfg.dropout,
            label_index.len(),
        );
        staging.save_train_config(cfg)?;
        staging.save_model_config(&model_cfg)?;
        staging.save_label_index(&label_index)?;

        // ── Step 8 + 9: Train on the requested backend, save weights ──────────
        let train_dataset = ClassificationDataset::new(train_samples);
        let val_dataset   = ClassificationDataset::new(val_samples);
        let mut metrics   = MetricsLogger::new(staging.dir())?;

        match cfg.runs_on {
            ComputeTarget::Cpu => fit::<Autodiff<NdArray>>(
                cfg, &model_cfg, train_dataset, val_dataset, NdArrayDevice::default(), &mut metrics, &staging,
            )?,
            ComputeTarget::Accelerator => fit::<Autodiff<Wgpu>>(
                cfg, &model_cfg, train_dataset, val_dataset, WgpuDevice::default(), &mut metrics, &staging,
            )?,
        }
        drop(metrics);

        staging.commit(&target)?;
        Ok(summary)
    }
}

fn fit<B: AutodiffBackend>(
    cfg:       &TrainConfig,
    model_cfg: &TransformerClassifierConfig,
    train:     ClassificationDataset,
    val:       ClassificationDataset,
    device:    B::Device,
    metrics:   &mut MetricsLogger,
    staging:   &ArtifactStore,
) -> Result<()> {
    tracing::info!("Training on {}: {:?}", cfg.runs_on, device);
    let model = run_training::<B>(cfg, model_cfg, train, val, device, metrics)?;
    staging.save_model(&model)
}
