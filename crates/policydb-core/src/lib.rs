//! policydb-core
//!
//! Shared domain types, the error taxonomy, configuration, and the ingestion
//! front half of the pipeline (corpus loading and chunking). Also hosts the
//! collaborator traits the retrieval, generation and tracing crates plug into.

pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod trace;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
