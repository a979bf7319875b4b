// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Fixed-length fine-tuning of the question classifier with
// AdamW. No early stopping: every run trains for cfg.epochs.
//
//   - Training uses B (an AutodiffBackend) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - The validation loader therefore batches on B::InnerBackend
//   - argmax(1) returns [batch, 1], reshaped to [batch] before .equal()

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::ClassificationBatcher, dataset::ClassificationDataset};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{TransformerClassifier, TransformerClassifierConfig};

pub fn run_training<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model_cfg:     &TransformerClassifierConfig,
    train_dataset: ClassificationDataset,
    val_dataset:   ClassificationDataset,
    device:        B::Device,
    metrics:       &mut MetricsLogger,
) -> Result<TransformerClassifier<B>> {
    ensure!(cfg.epochs > 0, "epochs must be at least 1");
    ensure!(cfg.batch_size > 0, "batch_size must be at least 1");

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: TransformerClassifier<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} layers, d_model={}, {} labels",
        model_cfg.num_layers, model_cfg.d_model, model_cfg.num_labels,
    );

    // ── AdamW optimiser ───────────────────────────────────────────────────────
    // Adam with decoupled weight decay: θ = θ - lr * (m / (√v + ε) + wd * θ)
    let optim_cfg = AdamWConfig::new()
        .with_epsilon(1e-8)
        .with_weight_decay(cfg.weight_decay as f32);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::<B, _, _>::new(ClassificationBatcher::new())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .set_device(device.clone())
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, no autodiff overhead) ───────────
    let val_loader = DataLoaderBuilder::<B::InnerBackend, _, _>::new(ClassificationBatcher::new())
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .set_device(device.clone())
        .build(val_dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let output = model.forward_classification(batch);

            let loss_val: f64 = output.loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            let grads = output.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        // dropout disabled for deterministic evaluation
        let model_valid = model.valid();

        let mut val_loss_sum  = 0.0f64;
        let mut val_batches   = 0usize;
        let mut correct       = 0usize;
        let mut total_samples = 0usize;

        for batch in val_loader.iter() {
            let logits = model_valid.forward(batch.input_ids, batch.padding_mask);

            let ce = CrossEntropyLossConfig::new().init(&logits.device());
            let batch_loss: f64 = ce
                .forward(logits.clone(), batch.labels.clone())
                .into_scalar()
                .elem::<f64>();
            val_loss_sum += batch_loss;
            val_batches  += 1;

            let n = batch.labels.dims()[0];
            let predicted = logits.argmax(1).reshape([n]);
            let hits: i64 = predicted
                .equal(batch.labels)
                .int().sum().into_scalar().elem::<i64>();

            correct       += hits as usize;
            total_samples += n;
        }

        let avg_val_loss = if val_batches   > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
        let val_accuracy = if total_samples > 0 { correct as f64 / total_samples as f64 } else { 0.0 };

        let row = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, val_accuracy);
        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, val_accuracy * 100.0,
        );
        metrics.log(&row)?;
    }

    tracing::info!("Training complete!");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};

    use crate::data::dataset::ClassificationSample;

    fn sample(ids: [u32; 6], label: usize) -> ClassificationSample {
        let attention_mask = ids.iter().map(|&id| u32::from(id != 0)).collect();
        ClassificationSample { input_ids: ids.to_vec(), attention_mask, label }
    }

    #[test]
    fn test_run_training_logs_every_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let mut metrics = MetricsLogger::new(dir.path()).unwrap();

        let cfg = TrainConfig { epochs: 2, batch_size: 2, lr: 1e-3, ..TrainConfig::default() };
        let model_cfg = TransformerClassifierConfig::new(12, 6, 8, 2, 1, 16, 0.0, 2);

        let train = ClassificationDataset::new(vec![
            sample([2, 5, 6, 3, 0, 0], 0),
            sample([2, 7, 8, 3, 0, 0], 1),
            sample([2, 5, 9, 3, 0, 0], 0),
            sample([2, 7, 10, 3, 0, 0], 1),
        ]);
        let val = ClassificationDataset::new(vec![sample([2, 5, 6, 3, 0, 0], 0)]);

        let model = run_training::<Autodiff<NdArray>>(
            &cfg, &model_cfg, train, val, NdArrayDevice::default(), &mut metrics,
        );
        assert!(model.is_ok());

        let rows = crate::infra::metrics::read_metrics(metrics.csv_path()).unwrap();
        assert_eq!(rows.iter().map(|r| r.epoch).collect::<Vec<_>>(), vec![1, 2]);
        assert!(rows.iter().all(|r| r.train_loss.is_finite()));
        assert!(rows.iter().all(|r| (0.0..=1.0).contains(&r.val_accuracy)));
    }
}
