//! Template synthesizer
//!
//! Drafts an answer from evidence alone: relationship lines are parsed back
//! into facts, control chains are resolved from them, and every other line
//! is carried into the answer verbatim. Nothing outside the evidence enters
//! the answer, so a correct audit always passes it.

use async_trait::async_trait;
use silo_core::{current_tenant, SiloError, Synthesizer};
use silo_evidence::extract_entities;
use silo_graph::{GraphFact, GraphStore, CONTROL_PREDICATES, DEFAULT_MAX_DEPTH};

#[derive(Debug, Clone, Default)]
pub struct TemplateSynthesizer;

impl TemplateSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Render the answer for `query` from `evidence`
    pub fn draft(&self, query: &str, evidence: &[String]) -> String {
        let mut facts = Vec::new();
        let mut findings = Vec::new();
        for line in evidence {
            match line.parse::<GraphFact>() {
                Ok(fact) => facts.push(fact),
                Err(_) => findings.push(line.as_str()),
            }
        }

        let relationships: Vec<String> = facts.iter().map(ToString::to_string).collect();
        let first_subject = facts.first().map(|f| f.subject.clone());
        let graph = GraphStore::from_facts(facts);

        let subject = extract_entities(query)
            .into_iter()
            .find(|e| graph.contains(e))
            .or(first_subject);

        let headline = match &subject {
            Some(subject) => {
                let chains = graph.beneficial_owners(subject, &CONTROL_PREDICATES, DEFAULT_MAX_DEPTH);
                if chains.is_empty() {
                    format!("no controlling party identified for {subject}")
                } else {
                    chains
                        .iter()
                        .map(|chain| {
                            let via = chain.intermediaries();
                            if via.is_empty() {
                                format!("{} controls {}", chain.owner, subject)
                            } else {
                                format!("{} controls {} (via {})", chain.owner, subject, via.join(", "))
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("; ")
                }
            }
            None => "no ownership relationships were found".to_string(),
        };

        let mut answer = format!("Based on the analysis: {headline}.");
        if !relationships.is_empty() {
            answer.push_str(&format!(" Relationships: {}.", relationships.join("; ")));
        }
        if !findings.is_empty() {
            answer.push_str(&format!(" Findings: {}.", findings.join("; ")));
        }
        answer
    }
}

#[async_trait]
impl Synthesizer for TemplateSynthesizer {
    async fn synthesize(&self, query: &str, evidence: &[String]) -> Result<String, SiloError> {
        let tenant = current_tenant().ok_or(SiloError::NoActiveTenant)?;
        let model = tenant.default_model().ok_or_else(|| {
            SiloError::SynthesisUnavailable(format!(
                "tenant {} has no allowed model",
                tenant.tenant_id
            ))
        })?;

        tracing::debug!(tenant = %tenant.tenant_id, model, evidence = evidence.len(), "drafting answer");
        Ok(self.draft(query, evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silo_core::{SecretHandle, TenantConfig, TenantRegistry};

    fn evidence() -> Vec<String> {
        vec![
            "ShellCompany_X --[owned_by]--> HoldingCompany_Y".to_string(),
            "HoldingCompany_Y --[controlled_by]--> Mr_Smith".to_string(),
            "Mr_Smith --[is_board_member_of]--> MegaCorp".to_string(),
            "2024 Revenue was $5.5B".to_string(),
        ]
    }

    #[test]
    fn test_draft_reference_answer() {
        let answer = TemplateSynthesizer::new().draft(
            "Who owns ShellCompany_X and what is the revenue?",
            &evidence(),
        );
        assert_eq!(
            answer,
            "Based on the analysis: Mr_Smith controls ShellCompany_X (via HoldingCompany_Y). \
             Relationships: ShellCompany_X --[owned_by]--> HoldingCompany_Y; \
             HoldingCompany_Y --[controlled_by]--> Mr_Smith; \
             Mr_Smith --[is_board_member_of]--> MegaCorp. \
             Findings: 2024 Revenue was $5.5B."
        );
    }

    #[test]
    fn test_draft_without_graph_lines() {
        let evidence = vec!["No knowledge found for Ghost_Co".to_string()];
        let answer = TemplateSynthesizer::new().draft("Who owns Ghost_Co?", &evidence);
        assert_eq!(
            answer,
            "Based on the analysis: no ownership relationships were found. \
             Findings: No knowledge found for Ghost_Co."
        );
    }

    #[test]
    fn test_draft_subject_without_controller() {
        let evidence = vec!["Acme_Co --[supplies]--> Beta_Co".to_string()];
        let answer = TemplateSynthesizer::new().draft("Who owns Acme_Co?", &evidence);
        assert!(answer.starts_with("Based on the analysis: no controlling party identified for Acme_Co."));
    }

    #[tokio::test]
    async fn test_requires_tenant_scope() {
        let err = TemplateSynthesizer::new()
            .synthesize("q", &evidence())
            .await
            .unwrap_err();
        assert_eq!(err, SiloError::NoActiveTenant);
    }

    #[tokio::test]
    async fn test_tenant_without_models_is_unavailable() {
        let registry = TenantRegistry::from_configs([TenantConfig::new(
            "sandbox",
            SecretHandle::new("key_S"),
            Vec::<String>::new(),
        )])
        .unwrap();

        let err = registry
            .activate("sandbox")
            .unwrap()
            .run(TemplateSynthesizer::new().synthesize("q", &evidence()))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, SiloError::SynthesisUnavailable(_)));
    }
}
