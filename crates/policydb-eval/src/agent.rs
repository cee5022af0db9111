use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use policydb_agent::{parse_missing, ComplianceAgent, ReportMode, StepName};
use policydb_core::config::Settings;
use policydb_core::traits::{PassageRetriever, TextGenerator};
use policydb_core::{Error, Result};
use policydb_vector::Retriever;

use crate::fixtures::{read_fixtures, AgentFixture};
use crate::summary::{round3, write_summary};

pub const RESULTS_FILE: &str = "agent_eval_results.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentCaseResult {
    pub expected_missing: Vec<String>,
    pub missing_found: Vec<String>,
    pub score: usize,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub avg_score: f64,
    pub avg_hit_rate: f64,
    pub count: usize,
    pub results: Vec<AgentCaseResult>,
}

/// Generator for offline runs; the agent never calls it in offline mode.
struct NoGenerator;

impl TextGenerator for NoGenerator {
    fn provider(&self) -> &str {
        "none"
    }

    fn generate(&self, _prompt: &str, _system: &str) -> Result<String> {
        Err(Error::Configuration("evaluation runs the agent offline".into()))
    }
}

/// Run the agent offline on every draft and score how many expected missing
/// sections its VALIDATE step reports.
pub fn evaluate_agent<R>(retriever: &R, fixtures: &[AgentFixture]) -> Result<AgentSummary>
where
    R: PassageRetriever + ?Sized,
{
    let agent = ComplianceAgent::new(retriever, &NoGenerator);
    let mut results = Vec::with_capacity(fixtures.len());
    for fixture in fixtures {
        let run = agent.run(&fixture.draft, ReportMode::Offline)?;
        let missing_found: Vec<String> = run
            .step(StepName::Validate)
            .map(|s| parse_missing(&s.output_text).into_iter().map(String::from).collect())
            .unwrap_or_default();
        let score = fixture.expected_missing.iter().filter(|item| missing_found.contains(item)).count();
        let hit_rate = if fixture.expected_missing.is_empty() {
            0.0
        } else {
            round3(score as f64 / fixture.expected_missing.len() as f64)
        };
        results.push(AgentCaseResult { expected_missing: fixture.expected_missing.clone(), missing_found, score, hit_rate });
    }

    let count = results.len();
    let (avg_score, avg_hit_rate) = if count > 0 {
        let score_sum: usize = results.iter().map(|r| r.score).sum();
        let rate_sum: f64 = results.iter().map(|r| r.hit_rate).sum();
        (round3(score_sum as f64 / count as f64), round3(rate_sum / count as f64))
    } else {
        (0.0, 0.0)
    };
    Ok(AgentSummary { avg_score, avg_hit_rate, count, results })
}

pub fn run_agent_eval(settings: &Settings, fixture: Option<&Path>) -> Result<(AgentSummary, PathBuf)> {
    let fixture_path = fixture.unwrap_or(&settings.eval.agent_fixture);
    let fixtures: Vec<AgentFixture> = read_fixtures(fixture_path)?;
    let retriever = Retriever::open(settings)?;
    let summary = evaluate_agent(&retriever, &fixtures)?;
    let out = settings.artifacts_dir.join(RESULTS_FILE);
    write_summary(&out, &summary)?;
    info!(avg_score = summary.avg_score, count = summary.count, out = %out.display(), "agent eval complete");
    Ok((summary, out))
}
