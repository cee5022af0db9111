use crate::error::Result;
use crate::trace::TraceRecord;
use crate::types::Retrieval;

/// Ranked passage lookup over an indexed corpus.
pub trait PassageRetriever: Send + Sync {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Retrieval>;
    /// Short label recorded in traces (`rag_provider`).
    fn kind(&self) -> &str;
}

/// Text-generation collaborator used for reports and answers.
pub trait TextGenerator: Send + Sync {
    /// Short label recorded in traces (`llm_provider`).
    fn provider(&self) -> &str;
    fn generate(&self, prompt: &str, system: &str) -> Result<String>;
}

pub trait RequestTracer: Send + Sync {
    fn record(&self, record: &TraceRecord) -> Result<()>;
}
