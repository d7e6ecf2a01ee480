//! Silo Stages: reference capabilities for the analyst pipeline.
//!
//! Deterministic stand-ins for the model-backed planner and synthesizer,
//! plus the bundled reference scenario. Swap in real capabilities by
//! building a `PipelineEngine` with your own trait objects.
//!
//! # Pipeline Flow
//!
//! ```text
//! query → StaticPlanner → EvidenceGatherer → TemplateSynthesizer → CitationAuditor
//!                                                 ↑                      │
//!                                                 └──── revision ────────┘
//! ```

pub mod fixtures;
mod planner;
mod synthesizer;

pub use fixtures::{
    engine_with_expectations, reference_documents, reference_engine, reference_graph,
    reference_registry, revenue_expectation, REFERENCE_DOCUMENT, REFERENCE_QUERY,
};
pub use planner::StaticPlanner;
pub use synthesizer::TemplateSynthesizer;
