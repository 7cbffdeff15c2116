//! Core DecisionEngine implementation

use crate::citation::{CitationIndex, ClausePattern};
use crate::config::EngineConfig;
use crate::decision::{DecisionLoop, DecisionOutcome};
use crate::error::{EngineError, RetrievalError};
use crate::prompt::PromptAssembler;
use attest_domain::traits::{FragmentStore, LlmProvider};
use attest_domain::{ConversationMemory, Fragment, Turn, Verdict};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Answers questions for one conversation session
///
/// The engine owns the session's [`ConversationMemory`]. Only one question
/// may be in flight at a time; a concurrent `ask` or `reset` fails with
/// [`EngineError::SessionBusy`].
pub struct DecisionEngine<S, L>
where
    S: FragmentStore,
    L: LlmProvider,
{
    store: Arc<S>,
    llm_provider: Arc<L>,
    config: EngineConfig,
    clause_pattern: ClausePattern,
    assembler: PromptAssembler,
    memory: RwLock<ConversationMemory>,
    in_flight: AtomicBool,
    session_id: Uuid,
}

impl<S, L> DecisionEngine<S, L>
where
    S: FragmentStore + Send + Sync + 'static,
    L: LlmProvider + Send + Sync + 'static,
    S::Error: std::fmt::Display,
    L::Error: std::fmt::Display,
{
    /// Create a new engine with an empty memory
    pub fn new(store: S, llm_provider: L, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;
        let clause_pattern = config.clause_matcher().map_err(EngineError::Config)?;
        let session_id = Uuid::now_v7();

        info!(
            "[session {}] Engine ready: top_k {}, memory window {}, {} attempt(s) per question",
            session_id,
            config.top_k,
            config.memory_window,
            config.max_attempts()
        );

        Ok(Self {
            store: Arc::new(store),
            llm_provider: Arc::new(llm_provider),
            assembler: PromptAssembler::new(config.memory_window),
            config,
            clause_pattern,
            memory: RwLock::new(ConversationMemory::new()),
            in_flight: AtomicBool::new(false),
            session_id,
        })
    }

    /// Session identifier used in log lines
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer a question with a grounded verdict
    pub async fn ask(&self, question: &str) -> Result<Verdict, EngineError> {
        self.ask_turn(question).await.map(|turn| turn.verdict)
    }

    /// Answer a question and return the whole recorded turn
    ///
    /// The turn carries the evidence and attempt count alongside the verdict,
    /// for callers that display them.
    pub async fn ask_turn(&self, question: &str) -> Result<Turn, EngineError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(EngineError::SessionBusy)?;
        let question = question.trim();

        info!("[session {}] Question: {}", self.session_id, question);

        let fragments = self.retrieve(question, self.config.top_k).await?;
        if fragments.is_empty() {
            warn!("[session {}] No evidence retrieved", self.session_id);
            return Err(RetrievalError::NoEvidence.into());
        }

        let index = CitationIndex::build(fragments, &self.clause_pattern);
        debug!(
            "[session {}] {} fragment(s), {} citable key(s)",
            self.session_id,
            index.len(),
            index.valid_citations().len()
        );

        let prompt = {
            let memory = self.memory.read().await;
            self.assembler.build(question, &memory, &index)
        };

        let outcome = DecisionLoop::new(
            Arc::clone(&self.llm_provider),
            &index,
            &self.assembler,
            self.config.max_attempts(),
            self.config.model_timeout(),
        )
        .with_require_citations(self.config.require_citations)
        .with_label(format!("session {}", self.session_id))
        .run(&prompt)
        .await;

        match outcome {
            DecisionOutcome::Accepted { verdict, attempts } => {
                let turn = Turn {
                    question: question.to_string(),
                    verdict,
                    fragments: index.into_fragments(),
                    attempts,
                };
                let mut memory = self.memory.write().await;
                memory.append(turn.clone());
                info!(
                    "[session {}] Turn {} recorded",
                    self.session_id,
                    memory.len()
                );
                Ok(turn)
            }
            DecisionOutcome::Failed(err) => {
                warn!("[session {}] {}", self.session_id, err);
                Err(err.into())
            }
        }
    }

    /// Retrieve the evidence a question would be answered from
    ///
    /// Never calls the model and never touches memory.
    pub async fn retrieve_only(&self, question: &str) -> Result<Vec<Fragment>, EngineError> {
        self.retrieve_only_with(question, self.config.top_k).await
    }

    /// [`retrieve_only`](Self::retrieve_only) with a per-call fragment limit
    pub async fn retrieve_only_with(
        &self,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<Fragment>, EngineError> {
        if top_k == 0 {
            return Err(EngineError::Config("top_k must be greater than 0".to_string()));
        }
        Ok(self.retrieve(question.trim(), top_k).await?)
    }

    /// Snapshot of the conversation so far, oldest first
    pub async fn history(&self) -> Vec<Turn> {
        self.memory.read().await.turns().to_vec()
    }

    /// Forget every prior turn
    pub async fn reset(&self) -> Result<(), EngineError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(EngineError::SessionBusy)?;
        self.memory.write().await.clear();
        info!("[session {}] Memory cleared", self.session_id);
        Ok(())
    }

    async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<Fragment>, RetrievalError> {
        if question.is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }

        let store = Arc::clone(&self.store);
        let query = question.to_string();
        let deadline = self.config.retrieval_timeout();

        // Call in a blocking context since FragmentStore is not async
        let call = tokio::task::spawn_blocking(move || {
            store.retrieve(&query, top_k).map_err(|e| e.to_string())
        });

        let fragments = match timeout(deadline, call).await {
            Err(_) => return Err(RetrievalError::Timeout(deadline)),
            Ok(Err(e)) => return Err(RetrievalError::Backend(format!("Task join error: {}", e))),
            Ok(Ok(Err(e))) => return Err(RetrievalError::Backend(e)),
            Ok(Ok(Ok(fragments))) => fragments,
        };

        debug!(
            "[session {}] Retrieved {} fragment(s)",
            self.session_id,
            fragments.len()
        );
        Ok(fragments)
    }
}

/// Marks the session busy until dropped
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
