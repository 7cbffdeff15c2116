//! Scenario tests for the DecisionEngine

#[cfg(test)]
mod tests {
    use crate::{DecisionEngine, EngineConfig, EngineError, Rejection, RetrievalError};
    use attest_domain::traits::FragmentStore;
    use attest_domain::{Fragment, Provenance, VerdictKind};
    use attest_llm::MockProvider;
    use attest_store::{CorpusChunk, InMemoryFragmentStore};
    use std::sync::Arc;
    use std::time::Duration;

    const VPN_QUESTION: &str = "Can a contractor get VPN access for 90 days?";
    const VPN_VERDICT: &str = r#"{"verdict": "YES", "rationale": "AC-5.1 allows contractor VPN access for up to 90 days with manager justification.", "citations": ["AC-5.1"]}"#;
    const UNGROUNDED_VERDICT: &str = r#"{"verdict": "YES", "rationale": "Allowed.", "citations": ["ZZ-9.9"]}"#;

    fn policy_store() -> InMemoryFragmentStore {
        InMemoryFragmentStore::from_chunks(vec![
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
        ])
        .unwrap()
    }

    /// Returns the same fragments for every query
    struct StaticStore(Vec<Fragment>);

    impl FragmentStore for StaticStore {
        type Error = String;

        fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<Fragment>, Self::Error> {
            Ok(self.0.iter().take(k).cloned().collect())
        }
    }

    /// Always fails
    struct BrokenStore;

    impl FragmentStore for BrokenStore {
        type Error = String;

        fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<Fragment>, Self::Error> {
            Err("index unavailable".to_string())
        }
    }

    /// Answers only after a delay
    struct SlowStore(Duration);

    impl FragmentStore for SlowStore {
        type Error = String;

        fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<Fragment>, Self::Error> {
            std::thread::sleep(self.0);
            Ok(vec![Fragment::new("x#0", "AC-1 text", Provenance::new("x", None, 0))])
        }
    }

    #[tokio::test]
    async fn test_contractor_vpn_repaired_once() {
        let llm = MockProvider::scripted(["Sure! The answer is yes.", VPN_VERDICT]);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), EngineConfig::default()).unwrap();

        let verdict = engine.ask(VPN_QUESTION).await.unwrap();

        assert_eq!(verdict.kind(), VerdictKind::Yes);
        assert_eq!(verdict.citations()[0].as_str(), "AC-5.1");
        assert_eq!(llm.call_count(), 2);

        let history = engine.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, VPN_QUESTION);
        assert_eq!(history[0].attempts, 2);
        assert!(history[0].fragments.iter().any(|f| f.id() == "access_control_sop.pdf#1"));
    }

    #[tokio::test]
    async fn test_invented_citation_exhausts_budget() {
        let llm = MockProvider::new(UNGROUNDED_VERDICT);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), EngineConfig::default()).unwrap();

        let result = engine.ask(VPN_QUESTION).await;

        match result {
            Err(EngineError::DecisionParse(err)) => {
                assert_eq!(err.attempts, 3);
                assert_eq!(err.reason, Rejection::UnknownCitation("ZZ-9.9".to_string()));
                assert_eq!(err.last_output, UNGROUNDED_VERDICT);
            }
            other => panic!("expected DecisionParse error, got {:?}", other.map(|v| v.kind())),
        }
        assert_eq!(llm.call_count(), 3);
        assert!(engine.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_every_accepted_citation_resolves() {
        let llm = MockProvider::new(
            r#"{"verdict": "NO", "rationale": "Reviews are quarterly.", "citations": ["AC-2.2", "physical_security_sop.pdf#0"]}"#,
        );
        let engine = DecisionEngine::new(policy_store(), llm, EngineConfig::default()).unwrap();

        let turn = engine.ask_turn("How often are accounts reviewed?").await.unwrap();

        for citation in turn.verdict.citations() {
            let cited = citation.as_str();
            assert!(turn
                .fragments
                .iter()
                .any(|f| f.id() == cited || f.text().contains(cited)));
        }
    }

    #[tokio::test]
    async fn test_retrieve_only_skips_model_and_memory() {
        let llm = MockProvider::new(VPN_VERDICT);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), EngineConfig::default()).unwrap();

        let fragments = engine.retrieve_only(VPN_QUESTION).await.unwrap();

        assert_eq!(fragments[0].id(), "access_control_sop.pdf#1");
        assert_eq!(llm.call_count(), 0);
        assert!(engine.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_question_rejected_before_retrieval() {
        let llm = MockProvider::new(VPN_VERDICT);
        let engine = DecisionEngine::new(BrokenStore, llm.clone(), EngineConfig::default()).unwrap();

        let result = engine.ask("   ").await;
        assert!(matches!(
            result,
            Err(EngineError::Retrieval(RetrievalError::EmptyQuery))
        ));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_retrieval_error() {
        let llm = MockProvider::new(VPN_VERDICT);
        let engine = DecisionEngine::new(BrokenStore, llm.clone(), EngineConfig::default()).unwrap();

        let result = engine.ask(VPN_QUESTION).await;
        match result {
            Err(EngineError::Retrieval(RetrievalError::Backend(message))) => {
                assert!(message.contains("index unavailable"));
            }
            other => panic!("expected backend error, got {:?}", other.map(|v| v.kind())),
        }
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stopword_question_has_no_evidence() {
        let llm = MockProvider::new(VPN_VERDICT);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), EngineConfig::default()).unwrap();

        let result = engine.ask("Is it?").await;
        assert!(matches!(
            result,
            Err(EngineError::Retrieval(RetrievalError::NoEvidence))
        ));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_timing_out_every_attempt_fails() {
        let llm = MockProvider::new(VPN_VERDICT).with_delay(Duration::from_millis(300));
        let config = EngineConfig {
            model_timeout_ms: 50,
            ..EngineConfig::default()
        };
        let engine = DecisionEngine::new(policy_store(), llm.clone(), config).unwrap();

        match engine.ask(VPN_QUESTION).await {
            Err(EngineError::DecisionParse(err)) => {
                assert_eq!(err.attempts, 3);
                assert_eq!(err.reason, Rejection::Timeout(Duration::from_millis(50)));
                assert_eq!(err.last_output, "");
            }
            other => panic!("expected DecisionParse error, got {:?}", other.map(|v| v.kind())),
        }
        assert!(engine.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_no_evidence_means_no_verdict() {
        let llm = MockProvider::new(VPN_VERDICT);
        let engine = DecisionEngine::new(StaticStore(vec![]), llm.clone(), EngineConfig::default()).unwrap();

        let result = engine.ask(VPN_QUESTION).await;
        assert!(matches!(
            result,
            Err(EngineError::Retrieval(RetrievalError::NoEvidence))
        ));
        assert_eq!(llm.call_count(), 0);

        assert!(engine.retrieve_only(VPN_QUESTION).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_timeout() {
        let config = EngineConfig {
            retrieval_timeout_ms: 50,
            ..EngineConfig::default()
        };
        let llm = MockProvider::new(VPN_VERDICT);
        let engine = DecisionEngine::new(SlowStore(Duration::from_millis(300)), llm.clone(), config).unwrap();

        let result = engine.ask(VPN_QUESTION).await;
        assert!(matches!(
            result,
            Err(EngineError::Retrieval(RetrievalError::Timeout(_)))
        ));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_timeout_consumes_attempt() {
        let config = EngineConfig {
            model_timeout_ms: 50,
            ..EngineConfig::default()
        };
        let llm = MockProvider::default();
        llm.push_delayed_response(VPN_VERDICT, Duration::from_millis(300));
        llm.push_response(VPN_VERDICT);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), config).unwrap();

        let turn = engine.ask_turn(VPN_QUESTION).await.unwrap();

        assert_eq!(turn.attempts, 2);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_memory_feeds_follow_up_prompt() {
        let llm = MockProvider::new(VPN_VERDICT);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), EngineConfig::default()).unwrap();

        engine.ask(VPN_QUESTION).await.unwrap();
        engine.ask("And for 120 days?").await.unwrap();

        let prompts = llm.prompts();
        assert!(!prompts[0].contains("Earlier in this conversation"));
        assert!(prompts[1].contains(&format!("Q: {}", VPN_QUESTION)));
        assert!(prompts[1].contains("Question: And for 120 days?"));
        assert_eq!(engine.history().await.len(), 2);
    }

    #[tokio::test]
    async fn test_reset_clears_memory() {
        let llm = MockProvider::new(VPN_VERDICT);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), EngineConfig::default()).unwrap();

        engine.ask(VPN_QUESTION).await.unwrap();
        engine.reset().await.unwrap();

        assert!(engine.history().await.is_empty());
        engine.ask("And for 120 days?").await.unwrap();
        assert!(!llm.prompts()[1].contains("Earlier in this conversation"));
    }

    #[tokio::test]
    async fn test_concurrent_ask_is_rejected() {
        let llm = MockProvider::new(VPN_VERDICT).with_delay(Duration::from_millis(100));
        let engine = DecisionEngine::new(policy_store(), llm.clone(), EngineConfig::default()).unwrap();

        let (first, second) = tokio::join!(engine.ask(VPN_QUESTION), engine.ask(VPN_QUESTION));

        let busy = [&first, &second]
            .iter()
            .filter(|r| matches!(r, Err(EngineError::SessionBusy)))
            .count();
        let answered = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(busy, 1);
        assert_eq!(answered, 1);
        assert_eq!(llm.call_count(), 1);
        assert_eq!(engine.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_during_ask_is_rejected() {
        let llm = MockProvider::new(VPN_VERDICT).with_delay(Duration::from_millis(100));
        let engine = Arc::new(
            DecisionEngine::new(policy_store(), llm, EngineConfig::default()).unwrap(),
        );

        let asking = Arc::clone(&engine);
        let handle = tokio::spawn(async move { asking.ask(VPN_QUESTION).await });
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(matches!(engine.reset().await, Err(EngineError::SessionBusy)));
        assert!(handle.await.unwrap().is_ok());
        assert!(engine.reset().await.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_ask_leaves_memory_unchanged() {
        let llm = MockProvider::default();
        llm.push_delayed_response(VPN_VERDICT, Duration::from_millis(300));
        llm.push_response(VPN_VERDICT);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), EngineConfig::default()).unwrap();

        let cancelled = tokio::time::timeout(Duration::from_millis(50), engine.ask(VPN_QUESTION)).await;
        assert!(cancelled.is_err());
        assert!(engine.history().await.is_empty());

        // The in-flight guard was released with the dropped future
        engine.ask(VPN_QUESTION).await.unwrap();
        assert_eq!(engine.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_uncited_verdict_policy() {
        let uncited = r#"{"verdict": "CONDITIONAL", "rationale": "Manager justification is not mentioned.", "citations": []}"#;

        let engine = DecisionEngine::new(policy_store(), MockProvider::new(uncited), EngineConfig::default()).unwrap();
        match engine.ask(VPN_QUESTION).await {
            Err(EngineError::DecisionParse(err)) => assert_eq!(err.reason, Rejection::NoCitations),
            other => panic!("expected DecisionParse error, got {:?}", other.map(|v| v.kind())),
        }

        let config = EngineConfig {
            require_citations: false,
            ..EngineConfig::default()
        };
        let engine = DecisionEngine::new(policy_store(), MockProvider::new(uncited), config).unwrap();
        let verdict = engine.ask(VPN_QUESTION).await.unwrap();
        assert_eq!(verdict.kind(), VerdictKind::Conditional);
        assert!(verdict.citations().is_empty());
    }

    #[tokio::test]
    async fn test_fragment_id_citation_without_clauses() {
        let config = EngineConfig {
            clause_pattern: String::new(),
            ..EngineConfig::default()
        };
        let llm = MockProvider::scripted([
            VPN_VERDICT,
            r#"{"verdict": "YES", "rationale": "Allowed for 90 days.", "citations": ["access_control_sop.pdf#1"]}"#,
        ]);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), config).unwrap();

        let turn = engine.ask_turn(VPN_QUESTION).await.unwrap();

        assert_eq!(turn.attempts, 2);
        assert_eq!(turn.verdict.citations()[0].as_str(), "access_control_sop.pdf#1");
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = EngineConfig {
            clause_pattern: "[".to_string(),
            ..EngineConfig::default()
        };
        let result = DecisionEngine::new(policy_store(), MockProvider::default(), config);
        assert!(matches!(result, Err(EngineError::Config(_))));

        let config = EngineConfig {
            top_k: 0,
            ..EngineConfig::default()
        };
        let result = DecisionEngine::new(policy_store(), MockProvider::default(), config);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[tokio::test]
    async fn test_sessions_are_distinct() {
        let a = DecisionEngine::new(policy_store(), MockProvider::default(), EngineConfig::default()).unwrap();
        let b = DecisionEngine::new(policy_store(), MockProvider::default(), EngineConfig::default()).unwrap();
        assert_ne!(a.session_id(), b.session_id());
    }

    #[tokio::test]
    async fn test_top_k_bounds_evidence() {
        let config = EngineConfig {
            top_k: 1,
            ..EngineConfig::default()
        };
        let engine = DecisionEngine::new(policy_store(), MockProvider::new(VPN_VERDICT), config).unwrap();

        let turn = engine.ask_turn(VPN_QUESTION).await.unwrap();
        assert_eq!(turn.fragments.len(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_only_with_overrides_top_k() {
        let llm = MockProvider::new(VPN_VERDICT);
        let engine = DecisionEngine::new(policy_store(), llm.clone(), EngineConfig::default()).unwrap();

        let fragments = engine.retrieve_only_with(VPN_QUESTION, 2).await.unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].id(), "access_control_sop.pdf#1");

        let result = engine.retrieve_only_with(VPN_QUESTION, 0).await;
        assert!(matches!(result, Err(EngineError::Config(_))));
        assert_eq!(llm.call_count(), 0);
    }
}
