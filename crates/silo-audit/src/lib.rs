//! Silo Audit: answer verification against evidence
//!
//! The auditor is the sole gate of the revision loop. Its matching rule is
//! explicit and configurable:
//!
//! - `normalized` (default): every quantity in the answer must equal, after
//!   scaling (`k`, `m`, `b`/`bn`, `t`, `thousand` … `trillion`), some quantity
//!   in the evidence within the profile's relative tolerance. Currency
//!   symbols are ignored; percentages only match percentages.
//! - `exact`: every quantity must appear verbatim in some evidence entry.
//!
//! Empty evidence always fails.
//!
//! # Example
//!
//! ```
//! use silo_audit::CitationAuditor;
//!
//! let auditor = CitationAuditor::strict();
//! let evidence = vec!["2024 Revenue was $5.5B".to_string()];
//!
//! let report = auditor.evaluate("Revenue in 2024 was 5.5 billion dollars.", &evidence);
//! assert!(report.passed);
//!
//! let report = auditor.evaluate("Revenue in 2024 was $6B.", &evidence);
//! assert!(!report.passed);
//! ```

pub mod auditor;
pub mod claims;
pub mod profile;

pub use auditor::{AuditReport, Check, CheckStatus, CitationAuditor};
pub use claims::{extract_quantities, Quantity};
pub use profile::{AuditProfile, MatchRule, ProfileError};
