//! End-to-end tests: reference stages wired into the engine

use async_trait::async_trait;
use silo_audit::CitationAuditor;
use silo_core::{
    current_tenant, AuditVerdict, Auditor, CancelSignal, PipelineEngine, PipelineRequest,
    RequestContext, SiloError, StageKind, Synthesizer, Terminal,
};
use silo_evidence::{FactExpectation, InMemoryDocuments};
use silo_graph::GraphStore;
use silo_stages::*;
use std::sync::Arc;

fn reference() -> PipelineEngine {
    reference_engine(
        Arc::new(reference_graph().unwrap()),
        Arc::new(reference_documents().unwrap()),
        Arc::new(CitationAuditor::strict()),
    )
}

// ============================================================================
// Reference scenario
// ============================================================================

#[tokio::test]
async fn test_scenario_with_flat_document_facts() {
    let graph = GraphStore::from_facts([
        silo_graph::GraphFact::new("ShellCompany_X", "owned_by", "HoldingCompany_Y"),
        silo_graph::GraphFact::new("HoldingCompany_Y", "controlled_by", "Mr_Smith"),
    ]);
    let documents = InMemoryDocuments::new()
        .with_json("filing", r#"{"2024": "$5.5B"}"#)
        .unwrap();
    let engine = engine_with_expectations(
        Arc::new(graph),
        Arc::new(documents),
        Arc::new(CitationAuditor::strict()),
        vec![FactExpectation::new("2024", "2024 Revenue was {value}")],
    );

    let registry = reference_registry().unwrap();
    let ctx = RequestContext::new().with_document("filing");
    let run = registry
        .activate("hedge_fund_a")
        .unwrap()
        .run(engine.run(
            PipelineRequest::new(REFERENCE_QUERY, 2),
            &ctx,
            &CancelSignal::new(),
        ))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        run.state.evidence,
        vec![
            "ShellCompany_X --[owned_by]--> HoldingCompany_Y",
            "HoldingCompany_Y --[controlled_by]--> Mr_Smith",
            "2024 Revenue was $5.5B",
        ]
    );
    assert!(run.state.answer.contains("Mr_Smith controls ShellCompany_X"));
    assert!(run.state.answer.contains("$5.5B"));
    assert_eq!(run.terminal, Terminal::Verified);
    assert_eq!(run.state.revision_count, 0);
}

#[tokio::test]
async fn test_bundled_reference_run() {
    let registry = reference_registry().unwrap();
    let ctx = RequestContext::new().with_document(REFERENCE_DOCUMENT);
    let engine = reference();

    let response = registry
        .activate("hedge_fund_a")
        .unwrap()
        .run(engine.invoke(PipelineRequest::new(REFERENCE_QUERY, 2), &ctx))
        .await
        .unwrap()
        .unwrap();

    assert!(response.verified);
    assert_eq!(response.trace_id, ctx.trace_id);
    assert_eq!(
        response.audit_log,
        vec![
            "Plan created: 1. Identify ownership structure of ShellCompany_X | \
             2. Retrieve 2024 revenue data | 3. Cross-reference ownership with 2024 revenue | \
             4. Synthesize final report",
            "Evidence gathered: 4 items",
            "Answer drafted: pass 1",
            "Audit passed: Verification successful",
        ]
    );
}

#[tokio::test]
async fn test_unknown_subject_is_still_verified() {
    let registry = reference_registry().unwrap();
    let ctx = RequestContext::new().with_document(REFERENCE_DOCUMENT);

    let run = registry
        .activate("bank_b")
        .unwrap()
        .run(reference().run(
            PipelineRequest::new("Who owns Ghost_Co and what is the revenue?", 1),
            &ctx,
            &CancelSignal::new(),
        ))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(run.state.evidence[0], "No knowledge found for Ghost_Co");
    assert!(run.state.answer.contains("no ownership relationships were found"));
    assert!(run.verified());
}

#[tokio::test]
async fn test_missing_document_ref_renders_unknown() {
    let registry = reference_registry().unwrap();

    let run = registry
        .activate("hedge_fund_a")
        .unwrap()
        .run(reference().run(
            PipelineRequest::new(REFERENCE_QUERY, 0),
            &RequestContext::new(),
            &CancelSignal::new(),
        ))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(run.state.evidence.last().unwrap(), "2024 Revenue was Unknown");
    assert!(run.verified());
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn test_unknown_document_fails_retrieval() {
    let registry = reference_registry().unwrap();
    let ctx = RequestContext::new().with_document("missing.pdf");

    let failure = registry
        .activate("hedge_fund_a")
        .unwrap()
        .run(reference().invoke(PipelineRequest::new(REFERENCE_QUERY, 2), &ctx))
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(failure.stage, StageKind::Retrieving);
    assert_eq!(failure.error, SiloError::DocumentNotFound("missing.pdf".to_string()));
    assert_eq!(
        failure.audit_log.last().unwrap(),
        "Stage retrieval failed: DOC/document not found: missing.pdf"
    );
}

#[tokio::test]
async fn test_unauthorized_tenant_never_runs() {
    let registry = reference_registry().unwrap();
    let err = registry.activate("hedge_fund_z").unwrap_err();
    assert_eq!(err, SiloError::UnauthorizedTenant("hedge_fund_z".to_string()));
    assert!(current_tenant().is_none());
}

#[tokio::test]
async fn test_cancelled_before_planning() {
    let registry = reference_registry().unwrap();
    let cancel = CancelSignal::new();
    cancel.cancel();

    let run = registry
        .activate("hedge_fund_a")
        .unwrap()
        .run(reference().run(
            PipelineRequest::new(REFERENCE_QUERY, 2),
            &RequestContext::new(),
            &cancel,
        ))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(run.terminal, Terminal::Cancelled(StageKind::Planning));
    assert!(run.state.plan.is_empty());
    assert_eq!(run.state.audit_log, vec!["Run cancelled during planning"]);
}

// ============================================================================
// Isolation under concurrency
// ============================================================================

/// Reports which tenant served the request, after yielding to the scheduler
struct TenantEcho;

#[async_trait]
impl Synthesizer for TenantEcho {
    async fn synthesize(&self, _query: &str, _evidence: &[String]) -> Result<String, SiloError> {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let tenant = current_tenant().ok_or(SiloError::NoActiveTenant)?;
        Ok(format!(
            "served for {} using {}",
            tenant.tenant_id,
            tenant.default_model().unwrap_or("none")
        ))
    }
}

struct AlwaysPass;

impl Auditor for AlwaysPass {
    fn verify(&self, _answer: &str, _evidence: &[String]) -> AuditVerdict {
        AuditVerdict::pass()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tenants_stay_isolated() {
    let registry = reference_registry().unwrap();
    let graph = Arc::new(reference_graph().unwrap());
    let gatherer = silo_evidence::EvidenceGatherer::new(
        graph,
        Arc::new(reference_documents().unwrap()),
    );
    let engine = Arc::new(PipelineEngine::new(
        Arc::new(StaticPlanner::default()),
        Arc::new(gatherer),
        Arc::new(TenantEcho),
        Arc::new(AlwaysPass),
    ));

    let mut handles = Vec::new();
    for i in 0..20 {
        let tenant = if i % 2 == 0 { "hedge_fund_a" } else { "bank_b" };
        let scope = registry.activate(tenant).unwrap();
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let answer = scope
                .run(async {
                    engine
                        .invoke(PipelineRequest::new(REFERENCE_QUERY, 0), &RequestContext::new())
                        .await
                })
                .await
                .unwrap()
                .unwrap()
                .answer;
            (tenant, answer)
        }));
    }

    for handle in handles {
        let (tenant, answer) = handle.await.unwrap();
        let expected = match tenant {
            "hedge_fund_a" => "served for hedge_fund_a using gpt-4o",
            _ => "served for bank_b using claude-3-5",
        };
        assert_eq!(answer, expected);
    }
}
