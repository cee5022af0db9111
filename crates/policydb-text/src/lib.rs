//! policydb-text
//!
//! Term analysis and the TF-IDF weighting model. The analyzer reuses
//! tantivy's tokenizer pipeline so queries and documents are normalized the
//! same way.
pub mod analyzer;
pub mod tfidf;

pub use analyzer::analyze;
pub use tfidf::{dot, l2_normalize, DenseMatrix, QueryVector, TfIdfModel};
