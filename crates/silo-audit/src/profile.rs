//! Audit profiles for strict and lenient verification

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("CONFIG/invalid audit profile: {0}")]
pub struct ProfileError(String);

/// How quantitative claims are matched against evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Claim text must appear verbatim in an evidence entry
    Exact,
    /// Scaled numeric comparison with a relative tolerance
    Normalized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditProfile {
    /// Profile name (e.g., "strict@1.0")
    pub name: String,

    pub matching: MatchRule,

    /// Relative tolerance for `Normalized` matching
    pub tolerance: f64,

    /// Shorter answers fail `answer_present`
    pub min_answer_chars: usize,

    /// Check that entity identifiers in the answer occur in the evidence
    pub trace_entities: bool,

    /// Untraced entities fail the audit instead of warning
    pub entities_blocking: bool,
}

impl AuditProfile {
    pub fn strict() -> Self {
        Self {
            name: "strict@1.0".to_string(),
            matching: MatchRule::Normalized,
            tolerance: 1e-9,
            min_answer_chars: 10,
            trace_entities: true,
            entities_blocking: true,
        }
    }

    /// Rounded figures and unrecognized entities are tolerated
    pub fn lenient() -> Self {
        Self {
            name: "lenient@1.0".to_string(),
            matching: MatchRule::Normalized,
            tolerance: 0.005,
            min_answer_chars: 1,
            trace_entities: true,
            entities_blocking: false,
        }
    }

    pub fn exact() -> Self {
        Self {
            name: "exact@1.0".to_string(),
            matching: MatchRule::Exact,
            ..Self::strict()
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_yaml::from_str(yaml).map_err(|e| ProfileError(e.to_string()))?;
        if !(0.0..1.0).contains(&profile.tolerance) {
            return Err(ProfileError(format!(
                "tolerance must be in [0, 1), got {}",
                profile.tolerance
            )));
        }
        Ok(profile)
    }

    pub fn for_mode(mode: &str) -> Self {
        match mode {
            "lenient" => Self::lenient(),
            "exact" => Self::exact(),
            _ => Self::strict(),
        }
    }
}

impl Default for AuditProfile {
    fn default() -> Self {
        Self::strict()
    }
}
