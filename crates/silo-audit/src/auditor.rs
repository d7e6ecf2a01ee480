//! Citation auditor
//!
//! Evaluates a draft answer against the evidence it was built from and
//! produces a report of individual checks. Any `Fail` check fails the audit;
//! `Warn` checks are reported but do not trigger a revision.

use crate::claims::{extract_quantities, Quantity};
use crate::profile::{AuditProfile, MatchRule};
use serde::{Deserialize, Serialize};
use silo_core::{AuditVerdict, Auditor};
use silo_evidence::extract_entities;
use std::collections::HashSet;

/// Single check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

impl Check {
    fn ok(name: &str, message: impl Into<String>) -> Self {
        Self { name: name.to_string(), status: CheckStatus::Ok, message: message.into() }
    }

    fn warn(name: &str, message: impl Into<String>) -> Self {
        Self { name: name.to_string(), status: CheckStatus::Warn, message: message.into() }
    }

    fn fail(name: &str, message: impl Into<String>) -> Self {
        Self { name: name.to_string(), status: CheckStatus::Fail, message: message.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub passed: bool,

    /// Individual check results, in evaluation order
    pub checks: Vec<Check>,

    /// Profile used for evaluation
    pub profile: String,

    pub summary: String,
}

impl AuditReport {
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Fail)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Warn)
    }

    pub fn check(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Collapse to the engine's verdict; findings are the failure messages
    pub fn into_verdict(self) -> AuditVerdict {
        if self.passed {
            AuditVerdict::pass()
        } else {
            AuditVerdict::fail(self.failures().map(|c| c.message.clone()).collect())
        }
    }
}

pub struct CitationAuditor {
    profile: AuditProfile,
}

impl CitationAuditor {
    pub fn new(profile: AuditProfile) -> Self {
        Self { profile }
    }

    pub fn strict() -> Self {
        Self::new(AuditProfile::strict())
    }

    pub fn for_mode(mode: &str) -> Self {
        Self::new(AuditProfile::for_mode(mode))
    }

    pub fn profile(&self) -> &AuditProfile {
        &self.profile
    }

    pub fn evaluate(&self, answer: &str, evidence: &[String]) -> AuditReport {
        let mut checks = Vec::new();

        // === Evidence ===
        let usable = evidence.iter().filter(|e| !e.trim().is_empty()).count();
        if usable == 0 {
            checks.push(Check::fail(
                "evidence_present",
                "No evidence available to support the answer",
            ));
        } else {
            checks.push(Check::ok("evidence_present", format!("{usable} evidence items")));
        }

        // === Answer ===
        let length = answer.trim().chars().count();
        if length < self.profile.min_answer_chars {
            checks.push(Check::fail(
                "answer_present",
                format!(
                    "Answer too short ({} chars, minimum {})",
                    length, self.profile.min_answer_chars
                ),
            ));
        } else {
            checks.push(Check::ok("answer_present", format!("{length} chars")));
        }

        // === Quantities ===
        let claims = extract_quantities(answer);
        if claims.is_empty() {
            checks.push(Check::ok("quantities_traced", "No quantitative claims"));
        } else {
            let untraced = self.untraced_quantities(&claims, evidence);
            if untraced.is_empty() {
                checks.push(Check::ok(
                    "quantities_traced",
                    format!("{} quantitative claims traced", claims.len()),
                ));
            } else {
                checks.push(Check::fail(
                    "quantities_traced",
                    format!("Untraced quantitative claims: {}", untraced.join(", ")),
                ));
            }
        }

        // === Entities ===
        if self.profile.trace_entities {
            let known: HashSet<String> = evidence.iter().flat_map(|e| extract_entities(e)).collect();
            let untraced: Vec<String> = extract_entities(answer)
                .into_iter()
                .filter(|e| !known.contains(e))
                .collect();

            if untraced.is_empty() {
                checks.push(Check::ok("entities_traced", "All entities appear in evidence"));
            } else {
                let message = format!("Entities not in evidence: {}", untraced.join(", "));
                if self.profile.entities_blocking {
                    checks.push(Check::fail("entities_traced", message));
                } else {
                    checks.push(Check::warn("entities_traced", message));
                }
            }
        }

        let failed = checks.iter().filter(|c| c.status == CheckStatus::Fail).count();
        let warned = checks.iter().filter(|c| c.status == CheckStatus::Warn).count();
        let passed = failed == 0;

        let summary = if passed && warned == 0 {
            "All citation checks passed".to_string()
        } else if passed {
            format!("Passed with {warned} warnings")
        } else {
            format!("{failed} checks failed")
        };

        tracing::debug!(
            profile = %self.profile.name,
            passed,
            failed,
            warned,
            "citation audit evaluated"
        );

        AuditReport {
            passed,
            checks,
            profile: self.profile.name.clone(),
            summary,
        }
    }

    fn untraced_quantities(&self, claims: &[Quantity], evidence: &[String]) -> Vec<String> {
        match self.profile.matching {
            MatchRule::Exact => claims
                .iter()
                .filter(|c| !evidence.iter().any(|e| e.contains(c.text.as_str())))
                .map(|c| c.text.clone())
                .collect(),
            MatchRule::Normalized => {
                let supported: Vec<Quantity> =
                    evidence.iter().flat_map(|e| extract_quantities(e)).collect();
                claims
                    .iter()
                    .filter(|c| {
                        !supported
                            .iter()
                            .any(|s| c.approx_eq(s, self.profile.tolerance))
                    })
                    .map(|c| c.text.clone())
                    .collect()
            }
        }
    }
}

impl Default for CitationAuditor {
    fn default() -> Self {
        Self::strict()
    }
}

impl Auditor for CitationAuditor {
    fn verify(&self, answer: &str, evidence: &[String]) -> AuditVerdict {
        self.evaluate(answer, evidence).into_verdict()
    }
}
