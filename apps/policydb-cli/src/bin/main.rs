use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use policydb_agent::{answer_question, draft_discharge, redact_pii, ComplianceAgent, QaOutcome, ReportMode};
use policydb_core::config::{Config, Settings};
use policydb_core::trace::{traced, JsonlTracer, NullTracer, TraceContext};
use policydb_core::traits::{PassageRetriever, RequestTracer, TextGenerator};
use policydb_generate::Collaborator;
use policydb_vector::{index_status, IndexBuilder, Retriever};

#[derive(Parser)]
#[command(name = "policydb", version, about = "Policy document retrieval and discharge-summary compliance review")]
struct Cli {
    /// Directory holding config.toml (defaults to the current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the index from the knowledge directory
    Build {
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show whether an index exists and if it is out of date
    Status,
    /// Rank policy passages for a query
    Query {
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Answer a question from the policy corpus
    Ask {
        question: String,
        #[arg(long)]
        top_k: Option<usize>,
        /// Mask e-mail addresses and long numbers before retrieval
        #[arg(long)]
        redact: bool,
    },
    /// Review a discharge summary draft (`-` reads stdin)
    Check {
        file: String,
        /// Skip the generated report
        #[arg(long)]
        offline: bool,
        #[arg(long)]
        redact: bool,
    },
    /// Draft a discharge summary and patient instructions from notes (`-` reads stdin)
    Draft {
        notes: String,
        #[arg(long)]
        redact: bool,
    },
    /// Run an evaluation harness against the built index
    Eval {
        #[arg(value_enum)]
        suite: Suite,
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Suite {
    Retrieval,
    Agent,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config_dir {
        Some(dir) => Config::load_from(dir),
        None => Config::load(),
    }
    .map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let tracer: Box<dyn RequestTracer> =
        if settings.trace.enabled { Box::new(JsonlTracer::new(settings.trace_path())) } else { Box::new(NullTracer) };

    match cli.command {
        Command::Build { dir, top_k } => build(settings, dir, top_k, cli.json),
        Command::Status => status(&settings, cli.json),
        Command::Query { query, top_k } => run_query(&settings, tracer.as_ref(), &query, top_k, cli.json),
        Command::Ask { question, top_k, redact } => ask(&settings, tracer.as_ref(), &question, top_k, redact, cli.json),
        Command::Check { file, offline, redact } => check(&settings, tracer.as_ref(), &file, offline, redact, cli.json),
        Command::Draft { notes, redact } => draft(&settings, tracer.as_ref(), &notes, redact, cli.json),
        Command::Eval { suite, fixture } => eval(&settings, suite, fixture, cli.json),
    }
}

fn build(mut settings: Settings, dir: Option<PathBuf>, top_k: Option<usize>, as_json: bool) -> anyhow::Result<()> {
    if let Some(dir) = dir {
        settings.knowledge_dir = dir;
    }
    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let documents = policydb_core::loader::load_docs(&settings.knowledge_dir)?;
    let summary = IndexBuilder::new(&settings).build(&documents, top_k)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Indexed {} chunks from {} documents ({} terms, {} backend). Default top_k: {}",
            summary.chunk_count, summary.document_count, summary.vocabulary_size, summary.backend, summary.top_k
        );
    }
    Ok(())
}

fn status(settings: &Settings, as_json: bool) -> anyhow::Result<()> {
    let status = index_status(settings)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    if !status.present {
        println!("No index in {}. Run `policydb build`.", settings.artifacts_dir.display());
        return Ok(());
    }
    let backend = status.backend.map_or("unknown", |b| b.as_str());
    let built = status.built_at.map(|t| t.to_rfc3339()).unwrap_or_default();
    let freshness = match status.stale {
        Some(true) => "stale (knowledge directory changed)",
        Some(false) => "up to date",
        None => "unknown",
    };
    println!("Index: {} chunks from {} documents, {} backend, built {}", status.chunk_count, status.document_count, backend, built);
    println!("Status: {}", freshness);
    Ok(())
}

fn run_query(settings: &Settings, tracer: &dyn RequestTracer, query: &str, top_k: Option<usize>, as_json: bool) -> anyhow::Result<()> {
    let retriever = Retriever::open(settings)?;
    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let ctx = TraceContext::new("query", "rag").with_providers("none", retriever.kind());
    let retrieval = traced(tracer, &ctx, || {
        let r = retriever.retrieve(query, top_k)?;
        let meta = json!({
            "top_k": top_k,
            "sources": r.results.iter().map(|c| c.source.as_str()).collect::<Vec<_>>(),
            "scores": r.results.iter().map(|c| c.score).collect::<Vec<_>>(),
        });
        Ok((r, meta))
    })?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&retrieval)?);
        return Ok(());
    }
    if !retriever.is_built() {
        println!("No index built yet. Run `policydb build`.");
        return Ok(());
    }
    println!("{} results in {} ms", retrieval.results.len(), retrieval.latency_ms);
    for (i, hit) in retrieval.results.iter().enumerate() {
        println!("{}. [{:.3}] {}: {}", i + 1, hit.score, hit.source, hit.snippet.replace('\n', " "));
    }
    Ok(())
}

fn ask(
    settings: &Settings,
    tracer: &dyn RequestTracer,
    question: &str,
    top_k: Option<usize>,
    redact: bool,
    as_json: bool,
) -> anyhow::Result<()> {
    let retriever = Retriever::open(settings)?;
    let generator = Collaborator::from_settings(&settings.generation)?;
    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let question = if redact { redact_pii(question) } else { question.to_string() };
    let ctx = TraceContext::new("ask", "qa").with_providers(generator.provider(), retriever.kind());
    let outcome = traced(tracer, &ctx, || {
        let outcome = answer_question(&retriever, &generator, &question, top_k)?;
        let meta = match &outcome {
            QaOutcome::Answered(a) => json!({
                "top_k": top_k,
                "citations_count": a.citations.len(),
                "sources": a.citations.iter().map(|c| c.source.as_str()).collect::<Vec<_>>(),
                "redact": redact,
            }),
            QaOutcome::NoRelevantDocuments => json!({ "top_k": top_k, "citations_count": 0, "redact": redact }),
        };
        Ok((outcome, meta))
    })?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    match outcome {
        QaOutcome::Answered(a) => {
            println!("{}\n", a.answer.trim());
            println!("Sources:");
            for c in &a.citations {
                println!("- {} ({:.3})", c.source, c.score);
            }
        }
        QaOutcome::NoRelevantDocuments => println!("No relevant documents found."),
    }
    Ok(())
}

fn check(
    settings: &Settings,
    tracer: &dyn RequestTracer,
    file: &str,
    offline: bool,
    redact: bool,
    as_json: bool,
) -> anyhow::Result<()> {
    let draft = read_input(file)?;
    let draft = if redact { redact_pii(&draft) } else { draft };
    let retriever = Retriever::open(settings)?;
    let generator = Collaborator::from_settings(&settings.generation)?;
    let mode = if offline {
        ReportMode::Offline
    } else if matches!(generator, Collaborator::Disabled) {
        warn!("no generation provider configured; producing the offline report");
        ReportMode::Offline
    } else {
        ReportMode::Generate
    };
    let ctx = TraceContext::new("check", "agent").with_providers(generator.provider(), retriever.kind());
    let run = traced(tracer, &ctx, || {
        let run = ComplianceAgent::new(&retriever, &generator).run(&draft, mode)?;
        let meta = json!({
            "retrieved_sources": run.citations.iter().map(|c| c.source.as_str()).collect::<Vec<_>>(),
            "citations_count": run.citations.len(),
            "offline": mode == ReportMode::Offline,
            "redact": redact,
        });
        Ok((run, meta))
    })?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }
    for step in &run.steps {
        println!("== {} ({} ms)\n{}\n", step.step.as_str(), step.latency_ms, step.output_text.trim_end());
    }
    println!("Total: {} ms", run.latency_ms);
    Ok(())
}

fn draft(settings: &Settings, tracer: &dyn RequestTracer, notes: &str, redact: bool, as_json: bool) -> anyhow::Result<()> {
    let notes = read_input(notes)?;
    let notes = if redact { redact_pii(&notes) } else { notes };
    let generator = Collaborator::from_settings(&settings.generation)?;
    let ctx = TraceContext::new("draft", "draft").with_providers(generator.provider(), "none");
    let drafted = traced(tracer, &ctx, || {
        let d = draft_discharge(&generator, &notes)?;
        let meta = json!({ "notes": notes, "redact": redact, "has_instructions": !d.instructions.is_empty() });
        Ok((d, meta))
    })?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&drafted)?);
        return Ok(());
    }
    println!("== Draft summary\n{}\n", drafted.draft.trim_end());
    println!("== Patient instructions\n{}", drafted.instructions.trim_end());
    Ok(())
}

/// File contents, or stdin for `-`.
fn read_input(file: &str) -> anyhow::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("reading {file}"))
    }
}

fn eval(settings: &Settings, suite: Suite, fixture: Option<PathBuf>, as_json: bool) -> anyhow::Result<()> {
    match suite {
        Suite::Retrieval => {
            let (summary, out) = policydb_eval::run_retrieval_eval(settings, fixture.as_deref())?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("RAG eval complete. Pass rate: {}. Output: {}", summary.pass_rate, out.display());
            }
        }
        Suite::Agent => {
            let (summary, out) = policydb_eval::run_agent_eval(settings, fixture.as_deref())?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Compliance eval complete. Avg score: {}. Output: {}", summary.avg_score, out.display());
            }
        }
    }
    Ok(())
}
