// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:        the epoch number (1, 2, 3, ...)
//   - train_loss:   average cross-entropy loss on the training set
//   - val_loss:     average cross-entropy loss on the validation set
//   - val_accuracy: fraction of validation questions labelled correctly
//
// Output file: <artifact dir>/metrics.csv
//
//   epoch,train_loss,val_loss,val_accuracy
//   1,3.124500,3.089200,0.123000
//   2,2.890100,2.854300,0.184000
//
// A rising val_loss under a falling train_loss means overfitting.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use serde::{Deserialize, Serialize};

pub const METRICS_FILE: &str = "metrics.csv";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all training batches
    pub train_loss: f64,

    /// Average cross-entropy loss on the validation set
    pub val_loss: f64,

    /// Range: [0.0, 1.0]
    pub val_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, val_accuracy: f64) -> Self {
        Self { epoch, train_loss, val_loss, val_accuracy }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
    writer:   csv::Writer<fs::File>,
}

impl MetricsLogger {
    /// Start a fresh metrics log in `dir`. The header is written with
    /// the first row.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join(METRICS_FILE);
        let writer = csv::Writer::from_path(&csv_path)
            .with_context(|| format!("Cannot create metrics CSV '{}'", csv_path.display()))?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path, writer })
    }

    /// Append one epoch's metrics and flush, so a crashed run still
    /// leaves every finished epoch on disk.
    pub fn log(&mut self, m: &EpochMetrics) -> Result<()> {
        self.writer.serialize(m)?;
        self.writer.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Read a metrics log back, e.g. to report the final epoch after training.
pub fn read_metrics(path: &Path) -> Result<Vec<EpochMetrics>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open metrics CSV '{}'", path.display()))?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<EpochMetrics>, _>>()?;
    Ok(rows)
}
