//! policydb-agent
//!
//! Flows composed from a [`PassageRetriever`](policydb_core::traits::PassageRetriever)
//! and a [`TextGenerator`](policydb_core::traits::TextGenerator): the
//! discharge-summary compliance review, policy question answering and
//! drafting summaries from clinician notes.
pub mod compliance;
pub mod draft;
pub mod prompts;
pub mod qa;
pub mod redact;

pub use compliance::{parse_missing, validate, AgentRun, ComplianceAgent, ReportMode, StepName, StepTrace};
pub use draft::{draft_discharge, DischargeDraft};
pub use qa::{answer_question, QaAnswer, QaOutcome};
pub use redact::redact_pii;
