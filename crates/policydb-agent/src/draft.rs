use serde::Serialize;
use std::time::Instant;

use policydb_core::traits::TextGenerator;
use policydb_core::Result;

use crate::prompts::{draft_prompt, SYSTEM_INSTRUCTIONS};

/// A generated discharge summary split from its patient instructions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DischargeDraft {
    pub draft: String,
    /// Empty when the reply had no blank-line separated second part.
    pub instructions: String,
    pub latency_ms: u64,
}

/// Turn clinician notes into a draft summary plus patient instructions.
///
/// The reply is split at its first blank line. No retrieval is involved.
pub fn draft_discharge<G>(generator: &G, notes: &str) -> Result<DischargeDraft>
where
    G: TextGenerator + ?Sized,
{
    let start = Instant::now();
    let reply = generator.generate(&draft_prompt(notes), SYSTEM_INSTRUCTIONS)?;
    let (draft, instructions) = match reply.split_once("\n\n") {
        Some((draft, rest)) => (draft.to_string(), rest.to_string()),
        None => (reply, String::new()),
    };
    Ok(DischargeDraft { draft, instructions, latency_ms: start.elapsed().as_millis() as u64 })
}
