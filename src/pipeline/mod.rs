
use itertools::Itertools;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dataset::load_regulations;
use crate::embeddings::{Embedder, EmbeddingClient};
use crate::extract::extract_result;
use crate::index::{RegulationIndex, ScoredClause};
use crate::llm::{ChatProvider, OllamaChatClient};
use crate::rules;
use crate::schema::ComplianceResult;
use crate::{ComplianceError, Result};

/// Progress of one analysis call, used to attribute faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Retrieving,
    Prompting,
    AwaitingModel,
    Extracting,
    Overriding,
    Done,
    Failed,
}

impl fmt::Display for AnalysisStage {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            Self::Retrieving => "retrieving regulation context",
            Self::Prompting => "assembling the prompt",
            Self::AwaitingModel => "awaiting the model response",
            Self::Extracting => "extracting the structured result",
            Self::Overriding => "applying rule overrides",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(description)
    }
}

/// The full analysis pipeline: retrieval, model judgment, extraction and
/// rule override, behind a single `analyze` call that always returns a
/// well-formed result.
///
/// Owns all process-wide state explicitly: the built index, the releasable
/// embedding provider and the chat client. Safe to share for concurrent
/// `analyze` calls; releasing the embedding provider requires exclusive
/// access, so it cannot race an in-flight search.
pub struct ComplianceAnalyzer {
    index: RegulationIndex,
    embedder: Option<Box<dyn Embedder>>,
    chat: Box<dyn ChatProvider>,
    top_k: usize,
}

impl ComplianceAnalyzer {
    /// Wire the pipeline from configuration: load the dataset, build the
    /// index, connect the Ollama clients.
    ///
    /// Dataset and configuration faults propagate; the process must not
    /// start without a valid regulation index.
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ComplianceError::Config(e.to_string()))?;

        let clauses = load_regulations(&config.retrieval.dataset_path)?;
        let embedder = EmbeddingClient::new(config)?;
        let index = RegulationIndex::build(clauses, &embedder)?;
        let chat = OllamaChatClient::new(config)?;

        Ok(Self {
            index,
            embedder: Some(Box::new(embedder)),
            chat: Box::new(chat),
            top_k: config.retrieval.top_k,
        })
    }

    /// Assemble the pipeline from pre-built parts.
    #[inline]
    pub fn from_parts(
        index: RegulationIndex,
        embedder: Box<dyn Embedder>,
        chat: Box<dyn ChatProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder: Some(embedder),
            chat,
            top_k,
        }
    }

    #[inline]
    pub fn index(&self) -> &RegulationIndex {
        &self.index
    }

    /// Retrieval only: the `k` regulation clauses nearest to the query.
    ///
    /// Fails with `NotBuilt` after the embedding provider has been
    /// released.
    #[inline]
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredClause<'_>>> {
        let embedder = self.embedder.as_deref().ok_or_else(|| {
            ComplianceError::NotBuilt(
                "embedding provider has been released; the index can no longer serve queries"
                    .to_string(),
            )
        })?;
        self.index.search(embedder, query, k)
    }

    /// Analyze a contract clause for GDPR compliance.
    ///
    /// Never fails and never panics: every fault along the way degrades to
    /// the canonical Unknown result carrying the stage and fault
    /// description. Empty clause text is permitted.
    #[inline]
    pub fn analyze(&self, clause_text: &str) -> ComplianceResult {
        debug!("Analyzing clause ({} characters)", clause_text.len());

        let retrieved = match self.retrieve(clause_text, self.top_k) {
            Ok(retrieved) => retrieved,
            Err(e) => return fail(AnalysisStage::Retrieving, &e),
        };

        debug!(
            "Stage {}: retrieved {} clauses",
            AnalysisStage::Retrieving,
            retrieved.len()
        );

        let prompt = build_prompt(clause_text, &retrieved);
        debug!(
            "Stage {}: prompt is {} characters",
            AnalysisStage::Prompting,
            prompt.len()
        );

        let raw_response = match self.chat.chat(&prompt) {
            Ok(raw) => raw,
            Err(e) => {
                return fail(
                    AnalysisStage::AwaitingModel,
                    &ComplianceError::ModelClient(format!("{e:#}")),
                );
            }
        };

        debug!("Stage {}", AnalysisStage::Extracting);
        let extracted = extract_result(&raw_response);

        debug!("Stage {}", AnalysisStage::Overriding);
        let result = rules::apply(clause_text, extracted);

        debug!("Stage {}", AnalysisStage::Done);
        result
    }

    /// Release the embedding provider to free memory before a heavier
    /// model is loaded.
    ///
    /// One-way and idempotent. Requires `&mut self`, so it cannot overlap
    /// an in-flight search; subsequent queries degrade to an Unknown
    /// result rather than panicking.
    #[inline]
    pub fn release_embedding_provider(&mut self) {
        if self.embedder.take().is_some() {
            info!("Released embedding provider");
        } else {
            debug!("Embedding provider already released");
        }
    }

    #[inline]
    pub fn embedding_provider_released(&self) -> bool {
        self.embedder.is_none()
    }
}

/// The terminal `Failed` transition: absorb the fault into a canonical
/// Unknown result so no error escapes the pipeline boundary.
fn fail(stage: AnalysisStage, error: &ComplianceError) -> ComplianceResult {
    warn!("Analysis failed while {stage}: {error}");
    ComplianceResult::unknown(format!("Analysis failed while {stage}: {error}"))
}

/// Assemble the model prompt from the clause under analysis and the
/// retrieved regulation context.
fn build_prompt(clause_text: &str, retrieved: &[ScoredClause<'_>]) -> String {
    let regulation_context = retrieved
        .iter()
        .map(|scored| format!("{}: {}", scored.clause.clause_id, scored.clause.text))
        .join("\n\n");

    format!(
        r#"You are a JSON generator. Output ONLY valid JSON. No other text.

Contract Clause: {clause_text}

GDPR Rules: {regulation_context}

Analyze if the contract clause complies with GDPR rules.

Output this exact JSON format:
{{
  "compliance_status": "Compliant" or "Non-Compliant",
  "reason": "brief explanation of why it does or does not comply",
  "risk_level": "Low" or "Medium" or "High",
  "confidence_score": number between 0.0 and 1.0
}}

JSON:"#
    )
}
