//! Keyword planner: decomposes an analyst query into numbered steps
//!
//! Deterministic stand-in for a model-backed planner. It recognizes two
//! topics, ownership and reported figures, and always ends with a synthesis
//! step.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use silo_core::{Planner, RequestContext, SiloError};
use silo_evidence::extract_entities;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// Whole words only, so "known" or "shutdown" never read as ownership
static OWNERSHIP_TERMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:own(?:s|ed|er|ers|ership)?|control(?:s|led|ling)?|beneficial|parents?|holdings?)\b",
    )
    .unwrap()
});
static FIGURE_TERMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:revenues?|income|sales|earnings)\b").unwrap());

#[derive(Debug, Clone)]
pub struct StaticPlanner {
    /// Fiscal year used when the query names none
    default_year: String,
}

impl StaticPlanner {
    pub fn new(default_year: impl Into<String>) -> Self {
        Self {
            default_year: default_year.into(),
        }
    }

    /// Plan steps for `query`, without numbering
    pub fn steps(&self, query: &str, ctx: &RequestContext) -> Vec<String> {
        let subject = ctx
            .subject
            .clone()
            .or_else(|| extract_entities(query).into_iter().next());
        let year = YEAR
            .find(query)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| self.default_year.clone());

        let ownership = OWNERSHIP_TERMS.is_match(query);
        let figures = FIGURE_TERMS.is_match(query);

        let mut steps = Vec::new();
        if ownership {
            match &subject {
                Some(s) => steps.push(format!("Identify ownership structure of {s}")),
                None => steps.push("Identify the entity whose ownership is requested".to_string()),
            }
        }
        if figures {
            steps.push(format!("Retrieve {year} revenue data"));
        }
        if ownership && figures {
            steps.push(format!("Cross-reference ownership with {year} revenue"));
        }
        if !ownership && !figures {
            match &subject {
                Some(s) => steps.push(format!("Gather relationships and filings for {s}")),
                None => {
                    steps.push("Gather relationships and filings for the queried entity".to_string())
                }
            }
        }
        steps.push("Synthesize final report".to_string());
        steps
    }
}

impl Default for StaticPlanner {
    fn default() -> Self {
        Self::new("2024")
    }
}

#[async_trait]
impl Planner for StaticPlanner {
    async fn plan(&self, query: &str, ctx: &RequestContext) -> Result<Vec<String>, SiloError> {
        if query.trim().is_empty() {
            return Err(SiloError::PlanningFailed("query is empty".to_string()));
        }

        let plan: Vec<String> = self
            .steps(query, ctx)
            .into_iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect();

        tracing::debug!(steps = plan.len(), "plan drafted");
        Ok(plan)
    }
}
