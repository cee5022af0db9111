//! Four-step discharge-summary compliance review.
//!
//! PLAN lists the checklist, RETRIEVE pulls the governing policy passages,
//! VALIDATE runs keyword checks on the draft and REPORT asks the generator for
//! a written review. Every run produces all four steps in that order.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use policydb_core::traits::{PassageRetriever, TextGenerator};
use policydb_core::types::RetrievalResult;
use policydb_core::Result;

use crate::prompts::{report_prompt, NO_CITATIONS, OFFLINE_REPORT, PLAN_STEPS, RETRIEVAL_QUERY, SYSTEM_INSTRUCTIONS};

const RETRIEVAL_TOP_K: usize = 3;

/// `(substring searched in the lowercased draft, VALIDATE line label, missing-item label)`
const REQUIRED_SECTIONS: [(&str, &str, &str); 3] = [
    ("diagnos", "Diagnosis present", "Diagnosis"),
    ("follow", "Follow-up present", "Follow-up plan"),
    ("med", "Medication list present", "Medication list"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepName {
    Plan,
    Retrieve,
    Validate,
    Report,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "PLAN",
            Self::Retrieve => "RETRIEVE",
            Self::Validate => "VALIDATE",
            Self::Report => "REPORT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTrace {
    pub step: StepName,
    pub input_text: String,
    pub output_text: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRun {
    pub steps: Vec<StepTrace>,
    pub citations: Vec<RetrievalResult>,
    pub latency_ms: u64,
}

impl AgentRun {
    pub fn step(&self, name: StepName) -> Option<&StepTrace> {
        self.steps.iter().find(|s| s.step == name)
    }

    pub fn report(&self) -> &str {
        self.step(StepName::Report).map_or("", |s| s.output_text.as_str())
    }
}

/// Whether REPORT calls the text generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    #[default]
    Generate,
    /// Use a fixed placeholder report; the generator is never called.
    Offline,
}

pub struct ComplianceAgent<'a, R: ?Sized, G: ?Sized> {
    retriever: &'a R,
    generator: &'a G,
}

impl<'a, R, G> ComplianceAgent<'a, R, G>
where
    R: PassageRetriever + ?Sized,
    G: TextGenerator + ?Sized,
{
    pub fn new(retriever: &'a R, generator: &'a G) -> Self {
        Self { retriever, generator }
    }

    pub fn run(&self, draft: &str, mode: ReportMode) -> Result<AgentRun> {
        let start = Instant::now();
        let mut steps = Vec::with_capacity(4);

        let t = Instant::now();
        steps.push(StepTrace {
            step: StepName::Plan,
            input_text: draft.to_string(),
            output_text: PLAN_STEPS.join("\n"),
            latency_ms: elapsed_ms(t),
        });

        let t = Instant::now();
        let retrieval = self.retriever.retrieve(RETRIEVAL_QUERY, RETRIEVAL_TOP_K)?;
        let cite_text = format_citations(&retrieval.results);
        steps.push(StepTrace {
            step: StepName::Retrieve,
            input_text: RETRIEVAL_QUERY.to_string(),
            output_text: if cite_text.is_empty() { NO_CITATIONS.to_string() } else { cite_text.clone() },
            latency_ms: elapsed_ms(t),
        });

        let t = Instant::now();
        steps.push(StepTrace {
            step: StepName::Validate,
            input_text: draft.to_string(),
            output_text: validate(draft),
            latency_ms: elapsed_ms(t),
        });

        let t = Instant::now();
        let prompt = report_prompt(draft, &cite_text);
        let report = match mode {
            ReportMode::Offline => OFFLINE_REPORT.to_string(),
            ReportMode::Generate => self.generator.generate(&prompt, SYSTEM_INSTRUCTIONS)?,
        };
        steps.push(StepTrace { step: StepName::Report, input_text: prompt, output_text: report, latency_ms: elapsed_ms(t) });

        let latency_ms = elapsed_ms(start);
        debug!(latency_ms, citations = retrieval.results.len(), ?mode, "compliance review finished");
        Ok(AgentRun { steps, citations: retrieval.results, latency_ms })
    }
}

/// `- <source>: <snippet>` per citation.
pub fn format_citations(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .map(|c| format!("- {}: {}", c.source, c.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keyword checklist over the draft; identical drafts give identical output.
pub fn validate(draft: &str) -> String {
    let lower = draft.to_lowercase();
    REQUIRED_SECTIONS
        .iter()
        .map(|(needle, label, _)| format!("{}: {}", label, if lower.contains(needle) { "yes" } else { "no" }))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Missing-item labels for every `no` line of a VALIDATE output.
pub fn parse_missing(validate_output: &str) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for line in validate_output.lines() {
        let Some((label, answer)) = line.split_once(':') else { continue };
        if answer.trim() != "no" {
            continue;
        }
        if let Some((_, _, item)) = REQUIRED_SECTIONS.iter().find(|(_, l, _)| *l == label.trim()) {
            missing.push(*item);
        }
    }
    missing
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
