//! Silo Evidence: ordered evidence from graph traversal and document facts
//!
//! # Evidence order
//!
//! ```text
//! query ─► subject entity ─► graph traversal lines        (1)
//! ctx.document_ref ─► DocumentFacts ─► expectation lines  (2)
//! ```
//!
//! Downstream auditing cross-references evidence textually, so the gatherer
//! never reorders or deduplicates what it collects.

pub mod entities;
pub mod gatherer;
pub mod provider;

pub use entities::{extract_entities, primary_subject};
pub use gatherer::{EvidenceGatherer, FactExpectation, NO_SUBJECT, UNKNOWN};
pub use provider::{DocumentFacts, FactMap, InMemoryDocuments};
