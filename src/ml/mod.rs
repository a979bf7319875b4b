// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All burn-specific model code lives here:
//
//   model.rs      - transformer encoder with a classification
//                   head on the [CLS] position
//
//   trainer.rs    - AdamW training loop with per-epoch
//                   validation loss and accuracy
//
//   inferencer.rs - loads the artifact onto NdArray or Wgpu and
//                   implements the Classifier trait
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Devlin et al. (2019) BERT

/// Transformer encoder question classifier
pub mod model;

/// Training loop with validation and metrics logging
pub mod trainer;

/// Classifier loading and scoring
pub mod inferencer;
