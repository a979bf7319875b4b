// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between the dataset CSV and tensor batches:
//
//   dataset.csv
//       │
//       ▼
//   CsvRecordLoader   → QuestionRecords (validated columns)
//       │
//       ▼
//   augment           → original + synthetic rephrasing per row
//       │
//       ▼
//   Preprocessor      → whitespace / control-character cleanup
//       │
//       ▼
//   QuestionEncoder   → [CLS] ids [SEP] + padding (infra layer)
//       │
//       ▼
//   split_train_val   → seeded 80/20 split
//       │
//       ▼
//   ClassificationDataset / ClassificationBatcher → DataLoader

/// Reads the questions/answers/labels CSV
pub mod loader;

/// Deterministic synthetic rephrasings
pub mod augmenter;

/// Normalises question text before tokenisation
pub mod preprocessor;

/// Implements Burn's Dataset trait for classification samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
