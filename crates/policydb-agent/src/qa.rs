use serde::Serialize;
use std::time::Instant;

use policydb_core::traits::{PassageRetriever, TextGenerator};
use policydb_core::types::RetrievalResult;
use policydb_core::Result;

use crate::compliance::format_citations;
use crate::prompts::{qa_prompt, SYSTEM_INSTRUCTIONS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    pub citations: Vec<RetrievalResult>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QaOutcome {
    Answered(QaAnswer),
    /// Nothing in the corpus matched; the generator was not called.
    NoRelevantDocuments,
}

/// Retrieve passages for `question` and have the generator answer from them.
///
/// Passages scoring zero share no terms with the question and are not cited.
pub fn answer_question<R, G>(retriever: &R, generator: &G, question: &str, top_k: usize) -> Result<QaOutcome>
where
    R: PassageRetriever + ?Sized,
    G: TextGenerator + ?Sized,
{
    let start = Instant::now();
    let retrieval = retriever.retrieve(question, top_k)?;
    let citations: Vec<RetrievalResult> = retrieval.results.into_iter().filter(|c| c.score > 0.0).collect();
    if citations.is_empty() {
        return Ok(QaOutcome::NoRelevantDocuments);
    }
    let prompt = qa_prompt(question, &format_citations(&citations));
    let answer = generator.generate(&prompt, SYSTEM_INSTRUCTIONS)?;
    Ok(QaOutcome::Answered(QaAnswer { answer, citations, latency_ms: start.elapsed().as_millis() as u64 }))
}
