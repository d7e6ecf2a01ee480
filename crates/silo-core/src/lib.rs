//! Silo Core: tenant scope, pipeline state, and the revision-bounded engine
//!
//! Every run executes inside exactly one tenant's isolation scope.

pub mod cancel;
pub mod context;
pub mod data_model;
pub mod error;
pub mod runner;
pub mod stage;
pub mod tenant;

pub use cancel::{CancelSignal, Deadline};
pub use context::RequestContext;
pub use data_model::{
    PipelineRequest, PipelineResponse, PipelineRun, PipelineState, StageProof, StateUpdate,
    Terminal,
};
pub use error::{PipelineFailure, SiloError};
pub use runner::{Phase, PipelineEngine, StageOutcome};
pub use stage::{AuditVerdict, Auditor, Planner, Retriever, StageKind, Synthesizer};
pub use tenant::{current_tenant, SecretHandle, TenantConfig, TenantRegistry, TenantScope};

/// Engine version reported by the API health endpoint
pub const SILO_VERSION: &str = "1.0.0";

/// Revision budget used when a caller does not supply one
pub const DEFAULT_MAX_REVISIONS: u32 = 2;
