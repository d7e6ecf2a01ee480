//! Unified Error Model
use crate::stage::StageKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SiloError {
    #[error("AUTH/unauthorized tenant: {0}")]
    UnauthorizedTenant(String),

    #[error("AUTH/tenant {requested} cannot be activated inside the scope of {active}")]
    TenantConflict { active: String, requested: String },

    #[error("AUTH/no tenant scope is active")]
    NoActiveTenant,

    #[error("SYNTH/{0}")]
    SynthesisUnavailable(String),

    #[error("DOC/document not found: {0}")]
    DocumentNotFound(String),

    #[error("PLAN/{0}")]
    PlanningFailed(String),

    #[error("CONFIG/{0}")]
    ConfigError(String),
}

/// A run that stopped because a stage capability failed.
///
/// The audit log carries everything recorded up to and including the failure
/// entry, so callers can report which stage broke without ever seeing a
/// half-populated state presented as an answer.
#[derive(Error, Debug, Clone)]
#[error("stage {stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: StageKind,
    pub error: SiloError,
    pub audit_log: Vec<String>,
    pub trace_id: String,
}
