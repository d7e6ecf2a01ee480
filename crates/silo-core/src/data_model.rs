//! Data Model: PipelineState, partial updates, and the invocation surface
use crate::stage::StageKind;
use serde::{Deserialize, Serialize};

/// The single record threaded through every stage of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    query: String,
    pub plan: Vec<String>,
    pub evidence: Vec<String>,
    pub answer: String,
    pub audit_log: Vec<String>,
    pub revision_count: u32,
}

impl PipelineState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            plan: Vec::new(),
            evidence: Vec::new(),
            answer: String::new(),
            audit_log: Vec::new(),
            revision_count: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Apply a stage's partial update.
    ///
    /// `audit_log` and `evidence` are concatenated; every other field present
    /// in the update replaces the current value wholesale.
    pub fn merge(&mut self, update: StateUpdate) {
        if let Some(plan) = update.plan {
            self.plan = plan;
        }
        self.evidence.extend(update.evidence);
        if let Some(answer) = update.answer {
            self.answer = answer;
        }
        if let Some(revision_count) = update.revision_count {
            self.revision_count = revision_count;
        }
        self.audit_log.extend(update.audit_log);
    }

    /// blake3 digest of the serialized state, used for stage proofs
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        format!("blake3:{}", blake3::hash(&bytes))
    }
}

/// The fields a stage changed. Anything left at its default is untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub plan: Option<Vec<String>>,
    pub evidence: Vec<String>,
    pub answer: Option<String>,
    pub revision_count: Option<u32>,
    pub audit_log: Vec<String>,
}

impl StateUpdate {
    pub fn log(entry: impl Into<String>) -> Self {
        Self {
            audit_log: vec![entry.into()],
            ..Self::default()
        }
    }

    pub fn with_plan(mut self, plan: Vec<String>) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn with_revision(mut self, revision_count: u32) -> Self {
        self.revision_count = Some(revision_count);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub query: String,
    pub max_revisions: u32,
}

impl PipelineRequest {
    pub fn new(query: impl Into<String>, max_revisions: u32) -> Self {
        Self {
            query: query.into(),
            max_revisions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "stage", rename_all = "snake_case")]
pub enum Terminal {
    /// Audit passed
    Verified,
    /// Revision budget exhausted with a failing audit
    Unverified,
    /// Cancelled while the given stage was pending or in flight
    Cancelled(StageKind),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageProof {
    pub id: String,
    pub in_hash: String,
    pub out_hash: String,
    pub latency_ms: u64,
    pub verdict: Option<String>,
    /// Audit log length after the stage's update was merged
    pub audit_entries: usize,
}

/// Terminal state of a run, as produced by the engine.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub trace_id: String,
    pub pipeline_id: String,
    pub terminal: Terminal,
    pub state: PipelineState,
    pub proofs: Vec<StageProof>,
}

impl PipelineRun {
    pub fn verified(&self) -> bool {
        self.terminal == Terminal::Verified
    }

    pub fn into_response(self) -> PipelineResponse {
        PipelineResponse {
            verified: self.verified(),
            outcome: self.terminal,
            answer: self.state.answer,
            audit_log: self.state.audit_log,
            revision_count: self.state.revision_count,
            trace_id: self.trace_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub answer: String,
    pub verified: bool,
    pub audit_log: Vec<String>,
    pub revision_count: u32,
    pub outcome: Terminal,
    pub trace_id: String,
}
