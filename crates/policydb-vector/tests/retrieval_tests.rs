use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use policydb_core::config::Settings;
use policydb_core::loader::load_docs;
use policydb_core::types::BackendKind;
use policydb_core::Error;
use policydb_vector::artifact::artifact_path;
use policydb_vector::{index_status, rebuild, retrieve_once, IndexBuilder, Retriever};

fn knowledge_dir() -> PathBuf {
    // crates/policydb-vector -> crates -> repo root
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).unwrap().to_path_buf();
    root.join("test_data/knowledge")
}

fn copy_knowledge(dest: &Path) {
    fs::create_dir_all(dest).unwrap();
    for entry in fs::read_dir(knowledge_dir()).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dest.join(entry.file_name())).unwrap();
    }
}

#[test]
fn missing_index_returns_empty_results() {
    let tmp = TempDir::new().unwrap();
    let retriever = Retriever::open_dir(tmp.path()).expect("open");
    assert!(!retriever.is_built());
    let r = retriever.retrieve("refund policy", 3).expect("retrieve");
    assert!(r.results.is_empty());
    assert_eq!(r.latency_ms, 0);

    let settings = Settings::with_dirs(knowledge_dir(), tmp.path());
    assert!(retrieve_once(&settings, "refund policy", 3).unwrap().is_empty());
}

#[test]
fn build_and_query_returns_at_most_k_with_sources() {
    let tmp = TempDir::new().unwrap();
    let settings = Settings::with_dirs(knowledge_dir(), tmp.path());
    let summary = rebuild(&settings, 3).expect("build");
    eprintln!("built {} chunks from {} documents", summary.chunk_count, summary.document_count);
    assert_eq!(summary.document_count, 5);
    assert!(summary.chunk_count >= summary.document_count);
    assert_eq!(summary.backend, BackendKind::Exact);
    assert!(artifact_path(tmp.path()).exists());

    let retriever = Retriever::open(&settings).expect("open");
    assert_eq!(retriever.chunk_count(), summary.chunk_count);
    for (q, k) in [("What is the refund policy for duplicate charges?", 3), ("discharge summary sign-off", 2), ("zebra", 4)] {
        let r = retriever.retrieve(q, k).expect("retrieve");
        assert!(r.results.len() <= k, "q='{q}' returned {} results", r.results.len());
        assert!(r.results.iter().all(|hit| !hit.source.is_empty()));
        assert!(r.results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    let refund = retriever.retrieve("refund duplicate charges", 3).unwrap();
    assert_eq!(refund.results[0].source, "refund_policy.txt");
    assert!(refund.results[0].score > 0.0);

    let unknown = retriever.retrieve("refund zebra", 3).unwrap();
    assert_eq!(unknown.unmatched_terms, vec!["zebra"]);

    assert!(retriever.retrieve("refund", 0).unwrap().is_empty());
}

#[test]
fn rebuild_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let settings = Settings::with_dirs(knowledge_dir(), tmp.path());
    let first = rebuild(&settings, 3).unwrap();
    let before = Retriever::open(&settings).unwrap().retrieve("medication list follow-up", 3).unwrap();
    let second = rebuild(&settings, 3).unwrap();
    let after = Retriever::open(&settings).unwrap().retrieve("medication list follow-up", 3).unwrap();

    assert_eq!(first.chunk_count, second.chunk_count);
    let order = |r: &policydb_core::types::Retrieval| r.results.iter().map(|h| (h.source.clone(), h.text.clone())).collect::<Vec<_>>();
    assert_eq!(order(&before), order(&after));
}

#[test]
fn empty_corpus_is_rejected_without_writing() {
    let tmp = TempDir::new().unwrap();
    let kb = tmp.path().join("kb");
    fs::create_dir(&kb).unwrap();
    fs::write(kb.join("blank.txt"), "   \n\n  ").unwrap();
    let arts = tmp.path().join("arts");
    let settings = Settings::with_dirs(&kb, &arts);

    let docs = load_docs(&kb).unwrap();
    assert_eq!(docs.len(), 1);
    let err = IndexBuilder::new(&settings).build(&docs, 3).unwrap_err();
    assert!(matches!(err, Error::EmptyCorpus));
    assert!(!artifact_path(&arts).exists());
}

#[test]
fn corrupt_artifact_fails_to_open() {
    let tmp = TempDir::new().unwrap();
    fs::write(artifact_path(tmp.path()), b"garbage").unwrap();
    assert!(matches!(Retriever::open_dir(tmp.path()), Err(Error::Artifact(_))));
}

#[test]
fn status_tracks_corpus_changes() {
    let tmp = TempDir::new().unwrap();
    let kb = tmp.path().join("kb");
    copy_knowledge(&kb);
    let settings = Settings::with_dirs(&kb, tmp.path().join("arts"));

    let status = index_status(&settings).unwrap();
    assert!(!status.present);

    rebuild(&settings, 3).unwrap();
    let status = index_status(&settings).unwrap();
    assert!(status.present);
    assert_eq!(status.stale, Some(false));
    assert_eq!(status.backend, Some(BackendKind::Exact));

    fs::write(kb.join("new_policy.txt"), "Visitors must sign in at reception.").unwrap();
    assert_eq!(index_status(&settings).unwrap().stale, Some(true));
}

#[cfg(feature = "lance")]
#[test]
fn accelerated_backend_matches_exact_top_hit() {
    let tmp = TempDir::new().unwrap();
    let mut settings = Settings::with_dirs(knowledge_dir(), tmp.path().join("accel"));
    settings.retrieval.backend = BackendKind::Accelerated;
    let summary = rebuild(&settings, 3).expect("accelerated build");
    assert_eq!(summary.backend, BackendKind::Accelerated);

    let exact_settings = Settings::with_dirs(knowledge_dir(), tmp.path().join("exact"));
    rebuild(&exact_settings, 3).unwrap();

    let accel = Retriever::open(&settings).unwrap();
    assert_eq!(accel.backend(), Some(BackendKind::Accelerated));
    let exact = Retriever::open(&exact_settings).unwrap();
    for q in ["refund duplicate charges", "red flag symptoms chest pain", "pharmacist anticoagulants"] {
        let a = accel.retrieve(q, 3).unwrap();
        let e = exact.retrieve(q, 3).unwrap();
        assert!(a.results.len() <= 3);
        assert_eq!(a.results[0].source, e.results[0].source, "q='{q}'");
        assert!((a.results[0].score - e.results[0].score).abs() < 1e-3);
    }
}

#[cfg(feature = "lance")]
#[test]
fn accelerated_rebuild_prunes_old_tables_and_falls_back_when_missing() {
    let tmp = TempDir::new().unwrap();
    let mut settings = Settings::with_dirs(knowledge_dir(), tmp.path());
    settings.retrieval.backend = BackendKind::Accelerated;
    rebuild(&settings, 3).unwrap();
    rebuild(&settings, 3).unwrap();

    let ann = policydb_vector::artifact::ann_dir(tmp.path());
    let tables: Vec<_> = fs::read_dir(&ann).unwrap().flatten().filter(|e| e.file_name().to_string_lossy().starts_with("chunks_")).collect();
    assert_eq!(tables.len(), 1);

    fs::remove_dir_all(&ann).unwrap();
    let retriever = Retriever::open(&settings).unwrap();
    assert_eq!(retriever.backend(), Some(BackendKind::Exact));
    assert_eq!(retriever.retrieve("refund duplicate charges", 3).unwrap().results[0].source, "refund_policy.txt");
}
