//! Integration tests for fragment retrieval
//!
//! These tests verify ranking, provenance and corpus loading end to end.

use attest_domain::traits::FragmentStore;
use attest_store::{CorpusChunk, InMemoryFragmentStore, StoreError};
use std::io::Write;

fn policy_corpus() -> Vec<CorpusChunk> {
    vec![
        CorpusChunk {
            source_name: "access_control_sop.pdf".to_string(),
            page: Some(2),
            chunk_index: 0,
            text: "AC-2.2 User accounts must be reviewed quarterly by the system owner.".to_string(),
        },
        CorpusChunk {
            source_name: "access_control_sop.pdf".to_string(),
            page: Some(5),
            chunk_index: 1,
            text: "AC-5.1 Contractors may be granted VPN access for up to 90 days with manager justification."
                .to_string(),
        },
        CorpusChunk {
            source_name: "physical_security_sop.pdf".to_string(),
            page: None,
            chunk_index: 0,
            text: "PS-1.3 Visitor badges must be worn visibly and returned at reception.".to_string(),
        },
    ]
}

#[test]
fn test_relevant_chunk_ranks_first() {
    let store = InMemoryFragmentStore::from_chunks(policy_corpus()).unwrap();

    let fragments = store
        .retrieve("Can a contractor get VPN access for 90 days?", 3)
        .unwrap();

    assert_eq!(fragments.len(), 3);
    assert_eq!(fragments[0].id(), "access_control_sop.pdf#1");
    assert!(fragments[0].text().contains("AC-5.1"));
}

#[test]
fn test_results_ranked_descending_and_bounded() {
    let store = InMemoryFragmentStore::from_chunks(policy_corpus()).unwrap();

    let fragments = store.retrieve("access review badges VPN", 2).unwrap();

    assert!(fragments.len() <= 2);
    for pair in fragments.windows(2) {
        assert!(pair[0].similarity() >= pair[1].similarity());
    }
    for fragment in &fragments {
        assert!((0.0..=1.0).contains(&fragment.similarity()));
    }
}

#[test]
fn test_provenance_is_carried() {
    let store = InMemoryFragmentStore::from_chunks(policy_corpus()).unwrap();

    let fragments = store.retrieve("visitor badges reception", 1).unwrap();
    let provenance = fragments[0].provenance();

    assert_eq!(provenance.source_name(), "physical_security_sop.pdf");
    assert_eq!(provenance.page(), None);
    assert_eq!(provenance.chunk_index(), 0);
}

#[test]
fn test_retrieval_is_repeatable() {
    let store = InMemoryFragmentStore::from_chunks(policy_corpus()).unwrap();

    let first = store.retrieve("contractor VPN", 3).unwrap();
    let second = store.retrieve("contractor VPN", 3).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_load_corpus_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = serde_json::to_string(&policy_corpus()).unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let store = InMemoryFragmentStore::from_json_file(file.path(), 256).unwrap();
    assert_eq!(store.len(), 3);

    let fragments = store.retrieve("quarterly account review", 1).unwrap();
    assert_eq!(fragments[0].id(), "access_control_sop.pdf#0");
}

#[test]
fn test_load_corpus_page_is_optional() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"[{"source_name": "sop.pdf", "chunk_index": 0, "text": "VPN access"}]"#)
        .unwrap();

    let store = InMemoryFragmentStore::from_json_file(file.path(), 64).unwrap();
    let fragments = store.retrieve("vpn", 1).unwrap();
    assert_eq!(fragments[0].provenance().page(), None);
}

#[test]
fn test_load_malformed_corpus() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{not json").unwrap();

    let result = InMemoryFragmentStore::from_json_file(file.path(), 64);
    assert!(matches!(result, Err(StoreError::InvalidCorpus(_))));
}

#[test]
fn test_load_missing_corpus() {
    let result = InMemoryFragmentStore::from_json_file("/nonexistent/corpus.json", 64);
    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[test]
fn test_blank_page_does_not_block_corpus() {
    let mut corpus = policy_corpus();
    corpus.push(CorpusChunk {
        source_name: "access_control_sop.pdf".to_string(),
        page: Some(6),
        chunk_index: 2,
        text: "   ".to_string(),
    });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&corpus).unwrap().as_bytes())
        .unwrap();

    let store = InMemoryFragmentStore::from_json_file(file.path(), 256).unwrap();
    assert_eq!(store.len(), 3);

    let fragments = store.retrieve("contractor VPN access", 4).unwrap();
    assert_eq!(fragments[0].id(), "access_control_sop.pdf#1");
    assert!(fragments.iter().all(|f| f.id() != "access_control_sop.pdf#2"));
}

#[test]
fn test_stopword_question_retrieves_nothing() {
    let store = InMemoryFragmentStore::from_chunks(policy_corpus()).unwrap();
    assert!(store.retrieve("Is it?", 3).unwrap().is_empty());
}
