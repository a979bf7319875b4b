// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct file or network access (that's Layers 4 and 6)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;

// The inference pipeline: translate, classify, resolve, translate back
pub mod ask_use_case;

// Login gate and conversation handling for the chat surface
pub mod chat_use_case;
