//! Stage capabilities: the contracts the engine drives
//!
//! Planning, retrieval and synthesis cross into external services, so their
//! traits are async; auditing is a pure function of answer and evidence.
use crate::context::RequestContext;
use crate::error::SiloError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Planning,
    Retrieving,
    Reasoning,
    Auditing,
}

impl StageKind {
    /// Stable stage id (ex: "reason.synthesize.v1")
    pub fn id(&self) -> &'static str {
        match self {
            Self::Planning => "plan.decompose.v1",
            Self::Retrieving => "retrieve.evidence.v1",
            Self::Reasoning => "reason.synthesize.v1",
            Self::Auditing => "audit.citations.v1",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Retrieving => "retrieval",
            Self::Reasoning => "reasoning",
            Self::Auditing => "audit",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decomposes a query into ordered step descriptions
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, query: &str, ctx: &RequestContext) -> Result<Vec<String>, SiloError>;
}

/// Produces the ordered evidence list for a query
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn gather(&self, query: &str, ctx: &RequestContext) -> Result<Vec<String>, SiloError>;
}

/// External answer generation; may fail with `SynthesisUnavailable`
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, query: &str, evidence: &[String]) -> Result<String, SiloError>;
}

/// Sole gate of the revision loop
pub trait Auditor: Send + Sync {
    fn verify(&self, answer: &str, evidence: &[String]) -> AuditVerdict;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditVerdict {
    pub passed: bool,
    /// Human-readable reasons, empty on a clean pass
    pub findings: Vec<String>,
}

impl AuditVerdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            findings: Vec::new(),
        }
    }

    pub fn fail(findings: Vec<String>) -> Self {
        Self {
            passed: false,
            findings,
        }
    }

    pub fn summary(&self) -> String {
        if self.findings.is_empty() {
            if self.passed { "ok" } else { "unspecified" }.to_string()
        } else {
            self.findings.join("; ")
        }
    }
}
