//! policydb-vector
//!
//! Builds and serves the retrieval index. The exact backend scores every
//! chunk in memory; with the `lance` feature the accelerated backend keeps the
//! same vectors in a LanceDB table with an IVF index.
pub mod artifact;
pub mod builder;
pub mod exact;
#[cfg(feature = "lance")]
pub mod lance;
pub mod retriever;
pub mod status;

pub use builder::{rebuild, BuildSummary, IndexBuilder};
pub use retriever::{retrieve_once, Retriever};
pub use status::{index_status, IndexStatus};
