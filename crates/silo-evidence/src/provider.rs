//! Document-facts capability
//!
//! In production this wraps a table-extraction service; the in-memory
//! provider serves pre-extracted facts for tests and demos.
use async_trait::async_trait;
use serde_json::{Map, Value};
use silo_core::SiloError;
use std::collections::HashMap;

/// Structured facts extracted from one document
pub type FactMap = Map<String, Value>;

#[async_trait]
pub trait DocumentFacts: Send + Sync {
    /// Fails with `DocumentNotFound` for unknown documents. A document that
    /// lacks a field is not an error: the field is simply absent.
    async fn extract_facts(&self, document_ref: &str) -> Result<FactMap, SiloError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDocuments {
    documents: HashMap<String, FactMap>,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, document_ref: impl Into<String>, facts: FactMap) -> Self {
        self.documents.insert(document_ref.into(), facts);
        self
    }

    /// Register a document from its JSON extraction result (must be an object)
    pub fn with_json(self, document_ref: impl Into<String>, json: &str) -> Result<Self, SiloError> {
        let document_ref = document_ref.into();
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(facts)) => Ok(self.with_document(document_ref, facts)),
            Ok(_) => Err(SiloError::ConfigError(format!(
                "{}: extracted facts must be a JSON object",
                document_ref
            ))),
            Err(e) => Err(SiloError::ConfigError(format!("{}: {}", document_ref, e))),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentFacts for InMemoryDocuments {
    async fn extract_facts(&self, document_ref: &str) -> Result<FactMap, SiloError> {
        tracing::debug!(document_ref, "extracting document facts");
        self.documents
            .get(document_ref)
            .cloned()
            .ok_or_else(|| SiloError::DocumentNotFound(document_ref.to_string()))
    }
}
