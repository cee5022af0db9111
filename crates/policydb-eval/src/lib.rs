//! policydb-eval
//!
//! Offline evaluation of retrieval quality and of the compliance agent's
//! validation step against newline-delimited JSON fixtures. Summaries are
//! written next to the index; the harness never rebuilds it.
pub mod agent;
pub mod fixtures;
pub mod retrieval;
pub mod summary;

pub use agent::{evaluate_agent, run_agent_eval, AgentCaseResult, AgentSummary};
pub use fixtures::{read_fixtures, AgentFixture, RetrievalFixture};
pub use retrieval::{evaluate_retrieval, run_retrieval_eval, RetrievalCaseResult, RetrievalFailure, RetrievalSummary};
pub use summary::{round3, write_summary};
