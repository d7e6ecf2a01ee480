//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use silo_core::{PipelineFailure, SiloError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("AUTH/missing x-tenant-id header")]
    MissingTenant,

    #[error(transparent)]
    Silo(#[from] SiloError),

    #[error(transparent)]
    Pipeline(#[from] PipelineFailure),
}

fn status_for(error: &SiloError) -> StatusCode {
    match error {
        SiloError::UnauthorizedTenant(_) => StatusCode::UNAUTHORIZED,
        SiloError::TenantConflict { .. } => StatusCode::CONFLICT,
        SiloError::SynthesisUnavailable(_) => StatusCode::BAD_GATEWAY,
        SiloError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
        SiloError::PlanningFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SiloError::NoActiveTenant | SiloError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingTenant => StatusCode::UNAUTHORIZED,
            Self::Silo(e) => status_for(e),
            Self::Pipeline(f) => status_for(&f.error),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Pipeline(failure) => json!({
                "error": failure.error.to_string(),
                "stage": failure.stage,
                "audit_log": failure.audit_log,
                "trace_id": failure.trace_id,
            }),
            other => json!({ "error": other.to_string() }),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}
