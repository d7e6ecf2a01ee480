//! Evidence gatherer: graph lines first, then one line per expected document fact
use crate::entities::primary_subject;
use crate::provider::{DocumentFacts, FactMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use silo_core::{current_tenant, RequestContext, Retriever, SiloError};
use silo_graph::{GraphStore, DEFAULT_MAX_DEPTH};
use std::sync::Arc;

/// Sentinel for an expected fact the document did not contain
pub const UNKNOWN: &str = "Unknown";

/// Sentinel for a query with no recognizable subject entity
pub const NO_SUBJECT: &str = "No subject entity identified in query";

/// A document fact the evidence must report, present or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactExpectation {
    /// Top-level key (ex: "2024") or JSON pointer (ex: "/tables/data/2024")
    pub key: String,
    /// Evidence line template; `{value}` is replaced by the fact
    pub label: String,
}

impl FactExpectation {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// Evidence line for this expectation against `facts`
    pub fn render(&self, facts: Option<&FactMap>) -> String {
        let value = facts.and_then(|f| self.lookup(f)).unwrap_or_else(|| UNKNOWN.to_string());
        self.label.replace("{value}", &value)
    }

    fn lookup(&self, facts: &FactMap) -> Option<String> {
        let value = if self.key.starts_with('/') {
            let mut segments = self.key[1..].split('/');
            let first = segments.next()?;
            let rest: Vec<&str> = segments.collect();
            let head = facts.get(first)?;
            if rest.is_empty() {
                head
            } else {
                head.pointer(&format!("/{}", rest.join("/")))?
            }
        } else {
            facts.get(&self.key)?
        };

        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

pub struct EvidenceGatherer {
    graph: Arc<GraphStore>,
    documents: Arc<dyn DocumentFacts>,
    expectations: Vec<FactExpectation>,
    max_depth: usize,
}

impl EvidenceGatherer {
    pub fn new(graph: Arc<GraphStore>, documents: Arc<dyn DocumentFacts>) -> Self {
        Self {
            graph,
            documents,
            expectations: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_expectation(mut self, expectation: FactExpectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn expectations(&self) -> &[FactExpectation] {
        &self.expectations
    }

    /// Explicit `ctx.subject` wins; otherwise the first entity in the query,
    /// preferring one the graph knows.
    pub fn subject_for(&self, query: &str, ctx: &RequestContext) -> Option<String> {
        ctx.subject
            .clone()
            .or_else(|| primary_subject(query, |e| self.graph.contains(e)))
    }

    pub async fn gather_evidence(
        &self,
        query: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<String>, SiloError> {
        let tenant = current_tenant().map(|t| t.tenant_id.clone()).unwrap_or_default();
        let mut evidence = Vec::new();

        match self.subject_for(query, ctx) {
            Some(subject) => {
                evidence.extend(self.graph.query_relationships(&subject, self.max_depth));
                tracing::info!(%tenant, %subject, lines = evidence.len(), "graph evidence");
            }
            None => evidence.push(NO_SUBJECT.to_string()),
        }

        if self.expectations.is_empty() {
            return Ok(evidence);
        }

        let facts = match &ctx.document_ref {
            Some(document_ref) => {
                let facts = self.documents.extract_facts(document_ref).await?;
                tracing::info!(%tenant, %document_ref, keys = facts.len(), "document evidence");
                Some(facts)
            }
            None => {
                tracing::warn!(%tenant, "no document reference; expected facts are Unknown");
                None
            }
        };

        evidence.extend(self.expectations.iter().map(|e| e.render(facts.as_ref())));
        Ok(evidence)
    }
}

#[async_trait]
impl Retriever for EvidenceGatherer {
    async fn gather(&self, query: &str, ctx: &RequestContext) -> Result<Vec<String>, SiloError> {
        self.gather_evidence(query, ctx).await
    }
}
