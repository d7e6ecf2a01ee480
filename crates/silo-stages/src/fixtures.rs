//! Bundled reference data: the ShellCompany_X ownership graph, its 10-K
//! table extract, and the two demo tenants.

use crate::planner::StaticPlanner;
use crate::synthesizer::TemplateSynthesizer;
use silo_core::{Auditor, PipelineEngine, SiloError, TenantRegistry};
use silo_evidence::{DocumentFacts, EvidenceGatherer, FactExpectation, InMemoryDocuments};
use silo_graph::GraphStore;
use std::sync::Arc;

pub const REFERENCE_QUERY: &str = "Who owns ShellCompany_X and what is the revenue?";
pub const REFERENCE_DOCUMENT: &str = "fake_10k.pdf";

const GRAPH_YAML: &str = include_str!("../fixtures/graph.yaml");
const TENANTS_YAML: &str = include_str!("../fixtures/tenants.yaml");
const FILING_JSON: &str = include_str!("../fixtures/10k_data.json");

pub fn reference_graph() -> Result<GraphStore, SiloError> {
    GraphStore::from_yaml(GRAPH_YAML).map_err(|e| SiloError::ConfigError(e.to_string()))
}

/// Document provider holding the extracted 10-K tables under `REFERENCE_DOCUMENT`
pub fn reference_documents() -> Result<InMemoryDocuments, SiloError> {
    InMemoryDocuments::new().with_json(REFERENCE_DOCUMENT, FILING_JSON)
}

/// `hedge_fund_a` (gpt-4o) and `bank_b` (claude-3-5)
pub fn reference_registry() -> Result<TenantRegistry, SiloError> {
    TenantRegistry::from_yaml(TENANTS_YAML)
}

pub fn revenue_expectation() -> FactExpectation {
    FactExpectation::new("/tables/data/2024", "2024 Revenue was {value}")
}

/// Reference pipeline reporting 2024 revenue from the extracted tables
pub fn reference_engine(
    graph: Arc<GraphStore>,
    documents: Arc<dyn DocumentFacts>,
    auditor: Arc<dyn Auditor>,
) -> PipelineEngine {
    engine_with_expectations(graph, documents, auditor, vec![revenue_expectation()])
}

pub fn engine_with_expectations(
    graph: Arc<GraphStore>,
    documents: Arc<dyn DocumentFacts>,
    auditor: Arc<dyn Auditor>,
    expectations: Vec<FactExpectation>,
) -> PipelineEngine {
    let gatherer = expectations
        .into_iter()
        .fold(EvidenceGatherer::new(graph, documents), |g, e| g.with_expectation(e));

    PipelineEngine::new(
        Arc::new(StaticPlanner::default()),
        Arc::new(gatherer),
        Arc::new(TemplateSynthesizer::new()),
        auditor,
    )
}
