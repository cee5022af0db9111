//! Per-request trace records and the sinks that persist them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::traits::RequestTracer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub request_id: Uuid,
    pub route: String,
    pub operation_type: String,
    pub llm_provider: String,
    pub rag_provider: String,
    pub latency_ms: u64,
    pub success: bool,
    pub error_message: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// What is known about a request before it runs.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub route: String,
    pub operation_type: String,
    pub llm_provider: String,
    pub rag_provider: String,
}

impl TraceContext {
    pub fn new(route: impl Into<String>, operation_type: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            operation_type: operation_type.into(),
            llm_provider: String::new(),
            rag_provider: String::new(),
        }
    }

    pub fn with_providers(mut self, llm: impl Into<String>, rag: impl Into<String>) -> Self {
        self.llm_provider = llm.into();
        self.rag_provider = rag.into();
        self
    }
}

pub fn trace_success(ctx: &TraceContext, latency_ms: u64, metadata: Value) -> TraceRecord {
    build_record(ctx, latency_ms, true, String::new(), metadata)
}

pub fn trace_error(ctx: &TraceContext, latency_ms: u64, error: &Error, metadata: Value) -> TraceRecord {
    build_record(ctx, latency_ms, false, error.to_string(), metadata)
}

fn build_record(ctx: &TraceContext, latency_ms: u64, success: bool, error_message: String, metadata: Value) -> TraceRecord {
    let metadata = if metadata.is_object() { metadata } else { Value::Object(Default::default()) };
    TraceRecord {
        request_id: Uuid::new_v4(),
        route: ctx.route.clone(),
        operation_type: ctx.operation_type.clone(),
        llm_provider: ctx.llm_provider.clone(),
        rag_provider: ctx.rag_provider.clone(),
        latency_ms,
        success,
        error_message,
        metadata,
        created_at: Utc::now(),
    }
}

/// Run `op`, then record its outcome. The operation's result is returned
/// unchanged; a tracer failure is only logged.
pub fn traced<T, F>(tracer: &dyn RequestTracer, ctx: &TraceContext, op: F) -> Result<T>
where
    F: FnOnce() -> Result<(T, Value)>,
{
    let start = Instant::now();
    let outcome = op();
    let latency_ms = start.elapsed().as_millis() as u64;
    let (record, result) = match outcome {
        Ok((value, metadata)) => (trace_success(ctx, latency_ms, metadata), Ok(value)),
        Err(e) => (trace_error(ctx, latency_ms, &e, Value::Object(Default::default())), Err(e)),
    };
    if let Err(e) = tracer.record(&record) {
        warn!(error = %e, route = %ctx.route, "failed to record trace");
    }
    result
}

/// Appends one JSON object per line.
pub struct JsonlTracer {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlTracer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RequestTracer for JsonlTracer {
    fn record(&self, record: &TraceRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let _guard = self.lock.lock().map_err(|_| Error::Other(anyhow::anyhow!("trace lock poisoned")))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        writeln!(file, "{line}").map_err(|e| Error::io(&self.path, e))
    }
}

#[derive(Default)]
pub struct MemoryTracer {
    records: Mutex<Vec<TraceRecord>>,
}

impl MemoryTracer {
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl RequestTracer for MemoryTracer {
    fn record(&self, record: &TraceRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| Error::Other(anyhow::anyhow!("trace lock poisoned")))?
            .push(record.clone());
        Ok(())
    }
}

pub struct NullTracer;

impl RequestTracer for NullTracer {
    fn record(&self, _record: &TraceRecord) -> Result<()> {
        Ok(())
    }
}
