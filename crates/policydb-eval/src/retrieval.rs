use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use policydb_core::config::Settings;
use policydb_core::traits::PassageRetriever;
use policydb_core::Result;
use policydb_vector::Retriever;

use crate::fixtures::{read_fixtures, RetrievalFixture};
use crate::summary::{round3, write_summary};

pub const RESULTS_FILE: &str = "rag_eval_results.json";
const FAILURES_SHOWN: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalCaseResult {
    pub question: String,
    pub hits: usize,
    pub min_hits: usize,
    pub pass: bool,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalFailure {
    pub question: String,
    pub hits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalSummary {
    pub pass_rate: f64,
    pub avg_latency_ms: u64,
    pub total: usize,
    pub passed: usize,
    pub failing_count: usize,
    /// First few failing questions.
    pub failures: Vec<RetrievalFailure>,
    pub results: Vec<RetrievalCaseResult>,
}

/// Count expected keywords found (case-insensitive) anywhere in the retrieved
/// text and snippets for each fixture question.
pub fn evaluate_retrieval<R>(retriever: &R, fixtures: &[RetrievalFixture], top_k: usize) -> Result<RetrievalSummary>
where
    R: PassageRetriever + ?Sized,
{
    let mut results = Vec::with_capacity(fixtures.len());
    let mut failures = Vec::new();
    let mut latency_sum = 0u64;
    for fixture in fixtures {
        let retrieval = retriever.retrieve(&fixture.question, top_k)?;
        latency_sum += retrieval.latency_ms;
        let combined = retrieval
            .results
            .iter()
            .map(|r| format!("{} {}", r.text, r.snippet))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let hits = fixture.expected_keywords.iter().filter(|kw| combined.contains(&kw.to_lowercase())).count();
        let pass = hits >= fixture.min_hits;
        if !pass {
            failures.push(RetrievalFailure { question: fixture.question.clone(), hits });
        }
        results.push(RetrievalCaseResult {
            question: fixture.question.clone(),
            hits,
            min_hits: fixture.min_hits,
            pass,
            latency_ms: retrieval.latency_ms,
        });
    }

    let total = results.len();
    let passed = results.iter().filter(|r| r.pass).count();
    let failing_count = failures.len();
    failures.truncate(FAILURES_SHOWN);
    Ok(RetrievalSummary {
        pass_rate: if total > 0 { round3(passed as f64 / total as f64) } else { 0.0 },
        avg_latency_ms: if total > 0 { latency_sum / total as u64 } else { 0 },
        total,
        passed,
        failing_count,
        failures,
        results,
    })
}

/// Evaluate the built index against the configured (or given) fixture file
/// and write the summary into the artifacts directory.
pub fn run_retrieval_eval(settings: &Settings, fixture: Option<&Path>) -> Result<(RetrievalSummary, PathBuf)> {
    let fixture_path = fixture.unwrap_or(&settings.eval.rag_fixture);
    let fixtures: Vec<RetrievalFixture> = read_fixtures(fixture_path)?;
    let retriever = Retriever::open(settings)?;
    if !retriever.is_built() {
        warn!(dir = %settings.artifacts_dir.display(), "no index built; every question will fail");
    }
    let summary = evaluate_retrieval(&retriever, &fixtures, settings.eval.top_k)?;
    let out = settings.artifacts_dir.join(RESULTS_FILE);
    write_summary(&out, &summary)?;
    info!(pass_rate = summary.pass_rate, total = summary.total, out = %out.display(), "retrieval eval complete");
    Ok((summary, out))
}
