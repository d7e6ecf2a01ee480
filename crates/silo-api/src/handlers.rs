//! API Handlers
use crate::error::ApiError;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use silo_core::{
    current_tenant, CancelSignal, PipelineRequest, PipelineResponse, RequestContext, SiloError,
    Terminal, SILO_VERSION,
};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
    pub max_revisions: Option<u32>,
    /// Overrides subject detection from the query
    pub subject: Option<String>,
    pub document_ref: Option<String>,
}

fn outcome_label(terminal: &Terminal) -> &'static str {
    match terminal {
        Terminal::Verified => "verified",
        Terminal::Unverified => "unverified",
        Terminal::Cancelled(_) => "cancelled",
    }
}

/// Run the pipeline for the tenant bound by `middleware::tenant_scope`.
///
/// Verified and unverified runs answer 200; a run cut short by the request
/// timeout answers 504 with whatever the run recorded.
pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<(StatusCode, Json<PipelineResponse>), ApiError> {
    let tenant = current_tenant().ok_or(SiloError::NoActiveTenant)?;

    let mut ctx = RequestContext::new();
    if let Some(subject) = body.subject {
        ctx = ctx.with_subject(subject);
    }
    if let Some(document_ref) = body.document_ref {
        ctx = ctx.with_document(document_ref);
    }

    let request = PipelineRequest::new(
        body.query,
        body.max_revisions.unwrap_or(state.settings.max_revisions),
    );
    let cancel = CancelSignal::new();
    let _deadline = cancel.cancel_after(state.settings.run_timeout);

    match state.engine.run(request, &ctx, &cancel).await {
        Ok(run) => {
            let outcome = outcome_label(&run.terminal);
            state
                .metrics
                .record_run(&tenant.tenant_id, outcome, Some(run.state.revision_count));
            tracing::info!(
                tenant = %tenant.tenant_id,
                trace_id = %run.trace_id,
                outcome,
                revisions = run.state.revision_count,
                "analysis complete"
            );

            let status = match run.terminal {
                Terminal::Cancelled(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::OK,
            };
            Ok((status, Json(run.into_response())))
        }
        Err(failure) => {
            state.metrics.record_run(&tenant.tenant_id, "failed", None);
            Err(failure.into())
        }
    }
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": SILO_VERSION,
            "pipeline": state.engine.pipeline_id(),
            "tenants": state.registry.len(),
        })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics.encode() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => {
            tracing::error!(error = %e, "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}
