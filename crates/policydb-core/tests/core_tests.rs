use std::fs;
use tempfile::TempDir;

use policydb_core::chunker::{chunk, chunk_document, ChunkingConfig};
use policydb_core::config::{Config, ProviderKind};
use policydb_core::loader::{checksum, corpus_fingerprint, load_docs, load_document};
use policydb_core::trace::{JsonlTracer, TraceContext, trace_success, TraceRecord};
use policydb_core::traits::RequestTracer;
use policydb_core::types::BackendKind;
use policydb_core::Error;

/// Reassemble a chunk sequence: the first window whole, then each later
/// window minus the characters it shares with its predecessor.
fn reassemble(chunks: &[String], overlap: usize) -> String {
    let mut out = chunks.first().cloned().unwrap_or_default();
    for c in chunks.iter().skip(1) {
        out.extend(c.chars().skip(overlap));
    }
    out
}

#[test]
fn chunks_reassemble_to_the_original_text() {
    // no whitespace and no repeats within a window, so trimming is a no-op
    // and any dropped or duplicated span changes the result
    let text: String = (0..2000u32)
        .map(|i| if i % 7 == 0 { char::from(b'0' + (i % 10) as u8) } else { char::from(b'a' + (i % 26) as u8) })
        .collect();
    for (size, overlap) in [(500, 50), (120, 30), (64, 0), (100, 99), (333, 100), (2000, 10), (5000, 100)] {
        let chunks = chunk(&text, size, overlap).expect("chunk");
        assert!(chunks.iter().all(|c| c.chars().count() <= size), "({size}, {overlap}) window too long");
        assert_eq!(reassemble(&chunks, overlap), text, "({size}, {overlap}) lost or duplicated text");
        for w in chunks.windows(2) {
            let tail: String = w[0].chars().skip(size - overlap).collect();
            assert!(w[1].starts_with(&tail), "({size}, {overlap}) windows do not overlap");
        }
    }
    assert!(chunk(&text, 500, 50).unwrap().len() > 1);
}

#[test]
fn long_text_yields_at_least_three_chunks() {
    let text = "x".repeat(2000);
    let chunks = chunk(&text, 500, 50).expect("chunk");
    assert!(chunks.len() >= 3, "got {} chunks", chunks.len());
    assert!(chunks.iter().all(|c| c.chars().count() <= 500));
}

#[test]
fn overlap_equal_to_size_is_rejected() {
    assert!(matches!(chunk("abc", 10, 10), Err(Error::InvalidChunking { chunk_size: 10, overlap: 10 })));
    assert!(matches!(chunk("abc", 0, 0), Err(Error::InvalidChunking { .. })));
}

#[test]
fn load_docs_skips_unsupported_broken_and_nested_files() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("b_refund.txt"), "Refund policy: 30 days.").unwrap();
    fs::write(dir.join("a_sop.md"), "# SOP\nSign-off required.").unwrap();
    fs::write(dir.join("notes.docx"), "ignored").unwrap();
    fs::write(dir.join("broken.pdf"), "not really a pdf").unwrap();
    fs::create_dir(dir.join("nested")).unwrap();
    fs::write(dir.join("nested").join("deep.txt"), "not loaded").unwrap();

    let docs = load_docs(dir).expect("load");
    let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a_sop.md", "b_refund.txt"]);
    assert_eq!(docs[1].raw_text, "Refund policy: 30 days.");
    assert_eq!(docs[1].checksum.len(), 64);
}

/// Write a PDF with one Courier text line per page.
fn write_pdf(path: &std::path::Path, pages: &[&str]) {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn pdf_pages_are_extracted_in_order_and_joined() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("discharge_policy.pdf");
    write_pdf(&path, &["Refund window is 90 days", "Discharge needs physician sign-off"]);

    let doc = load_document(&path).expect("load").expect("pdf is a supported format");
    eprintln!("extracted: {:?}", doc.raw_text);
    assert_eq!(doc.name, "discharge_policy.pdf");
    assert_eq!(doc.checksum, checksum(&doc.raw_text));

    let first = doc.raw_text.find("Refund window is 90 days").expect("page 1 text");
    let second = doc.raw_text.find("Discharge needs physician sign-off").expect("page 2 text");
    assert!(first < second, "pages out of order");
    assert!(doc.raw_text[first..second].contains('\n'), "pages must be newline separated");

    let pdf = lopdf::Document::load(&path).unwrap();
    let expected: Vec<String> = pdf.get_pages().keys().map(|&p| pdf.extract_text(&[p]).unwrap()).collect();
    assert_eq!(expected.len(), 2);
    assert_eq!(doc.raw_text, expected.join("\n"));

    let docs = load_docs(tmp.path()).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].raw_text, doc.raw_text);
}

#[test]
fn load_docs_missing_directory_is_hard_error() {
    let tmp = TempDir::new().unwrap();
    let err = load_docs(&tmp.path().join("nope")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn fingerprint_ignores_order_but_tracks_content() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.txt"), "alpha").unwrap();
    fs::write(tmp.path().join("b.txt"), "bravo").unwrap();
    let docs = load_docs(tmp.path()).unwrap();
    let mut reversed = docs.clone();
    reversed.reverse();
    assert_eq!(corpus_fingerprint(&docs), corpus_fingerprint(&reversed));

    fs::write(tmp.path().join("b.txt"), "bravo changed").unwrap();
    let changed = load_docs(tmp.path()).unwrap();
    assert_ne!(corpus_fingerprint(&docs), corpus_fingerprint(&changed));
}

#[test]
fn chunk_document_carries_provenance() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("sop.txt"), "word ".repeat(400)).unwrap();
    let docs = load_docs(tmp.path()).unwrap();
    let cfg = ChunkingConfig { chunk_size: 500, overlap: 50, snippet_len: 40 };
    let chunks = chunk_document(&docs[0], &cfg).unwrap();
    assert!(chunks.len() >= 4);
    for c in &chunks {
        assert_eq!(c.meta.source, "sop.txt");
        assert!(c.meta.snippet.chars().count() <= 40);
        assert!(c.text.starts_with(&c.meta.snippet));
    }
}

#[test]
fn config_file_overrides_defaults_and_resolves_paths() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        r#"
knowledge_dir = "kb"
[retrieval]
backend = "accelerated"
top_k = 5
[generation]
provider = "anthropic"
"#,
    )
    .unwrap();

    let config = Config::load_from(tmp.path()).expect("load config");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.knowledge_dir, tmp.path().join("kb"));
    assert_eq!(settings.artifacts_dir, tmp.path().join("artifacts"));
    assert_eq!(settings.retrieval.backend, BackendKind::Accelerated);
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.generation.provider, ProviderKind::Anthropic);
    assert_eq!(settings.chunking.chunk_size, 800);

    let top_k: usize = config.get("retrieval.top_k").unwrap();
    assert_eq!(top_k, 5);
}

#[test]
fn invalid_chunking_in_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[chunking]\nchunk_size = 100\noverlap = 200\n").unwrap();
    let config = Config::load_from(tmp.path()).unwrap();
    assert!(matches!(config.settings(), Err(Error::InvalidChunking { .. })));
}

#[test]
fn jsonl_tracer_appends_one_line_per_record() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("logs").join("ai_traces.jsonl");
    let tracer = JsonlTracer::new(&path);
    let ctx = TraceContext::new("check", "agent").with_providers("none", "exact");
    tracer.record(&trace_success(&ctx, 12, serde_json::json!({"steps": 4}))).unwrap();
    tracer.record(&trace_success(&ctx, 8, serde_json::json!({}))).unwrap();

    let body = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: TraceRecord = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first.route, "check");
    assert_eq!(first.latency_ms, 12);
    assert!(first.success);
    let second: TraceRecord = serde_json::from_str(lines[1]).unwrap();
    assert_ne!(first.request_id, second.request_id);
}
