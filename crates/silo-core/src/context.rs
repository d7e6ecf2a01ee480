//! Request Context: explicit per-request inputs shared by every stage
//!
//! Tenant identity is deliberately absent here; it is read from the ambient
//! scope (see [`crate::tenant`]) so no stage can be handed the wrong one.
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: String,
    /// Primary entity for graph traversal (ex: "ShellCompany_X")
    pub subject: Option<String>,
    /// Document handed to the document-facts provider (ex: "annual_report_10k.pdf")
    pub document_ref: Option<String>,
    pub started_at: DateTime<Utc>,
    pub metadata: HashMap<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            subject: None,
            document_ref: None,
            started_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_document(mut self, document_ref: impl Into<String>) -> Self {
        self.document_ref = Some(document_ref.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
