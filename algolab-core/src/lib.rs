//! # Algolab Core
//!
//! Platform plumbing around the execution and evaluation engines: the
//! content store serving algorithm documents, the write-through
//! persistence layer, the learning-path bookkeeping built on it, layered
//! configuration, and the shared error taxonomy.
//!
//! The engines themselves live in `algolab-sandbox` and `algolab-eval`;
//! they depend only on the narrow interfaces defined here
//! ([`content::ContentStore`], [`persistence::KvStore`]), never on the
//! concrete file-backed implementations.

pub mod config;
pub mod content;
pub mod error;
pub mod learning;
pub mod persistence;

// Re-exports
pub use config::PlatformConfig;
pub use content::{AlgorithmDoc, AlgorithmSummary, ContentStore, FileContentStore};
pub use error::{CoreError, Result};
pub use learning::{Certificate, LearningPath, ProgressRecord, SyncOutcome};
pub use persistence::{CachedFileStore, KvStore, MemoryStore};
