// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the chatbot:
// question records, the label index and catalog, languages,
// chat sessions, the error taxonomy and the seams to the
// classifier, translator and stores.
//
// No burn, no HTTP and no file I/O in here.

pub mod error;

pub mod question_record;

/// Label string <-> class index bijection
pub mod label_index;

/// Label -> canonical answer lookup
pub mod catalog;

pub mod language;

/// Conversation log, login flag and login records
pub mod session;

pub mod traits;
