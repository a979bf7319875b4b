// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Everything that touches the disk or the network on behalf of
// the other layers:
//
//   checkpoint.rs      - the classifier artifact directory
//                        (weights, configs, label index) with
//                        staged, all-or-nothing commits
//
//   tokenizer_store.rs - word-level tokenizer build/load and the
//                        question encoder shared by training and
//                        inference
//
//   metrics.rs         - per-epoch training metrics CSV
//
//   translation.rs     - translation adapter and its backends
//
//   login_store.rs     - login record persistence (JSON lines,
//                        CSV, SQLite)
//
//   generative.rs      - generative answer client for the chat

/// Classifier artifact saving and loading
pub mod checkpoint;

/// Tokenizer training, saving, loading and question encoding
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

/// Translation to and from the working language
pub mod translation;

/// Login record stores behind the LoginStore trait
pub mod login_store;

/// Generative answer source
pub mod generative;
