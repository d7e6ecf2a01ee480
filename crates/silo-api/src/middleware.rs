//! Request middleware: tenant scope activation and CORS
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_http::cors::CorsLayer;

pub const TENANT_HEADER: &str = "x-tenant-id";

pub fn cors() -> CorsLayer {
    CorsLayer::permissive()
}

/// Activate the tenant named by `x-tenant-id` for the rest of the request.
/// The handler and everything it awaits see the tenant via `current_tenant()`;
/// the binding is released when the response is produced.
pub async fn tenant_scope(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant_id = request
        .headers()
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingTenant)?
        .to_string();

    let scope = state.registry.activate(&tenant_id)?;
    Ok(scope.run(next.run(request)).await?)
}
