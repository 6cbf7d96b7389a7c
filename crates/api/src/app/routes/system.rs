use axum::{extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use plantops_core::OperatorContext;

pub fn router() -> Router {
    Router::new().route("/whoami", get(whoami))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<OperatorContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "tenant_id": ctx.tenant_id().to_string(),
        "operator_id": ctx.operator_id().to_string(),
        "operator_name": ctx.operator_name(),
    }))
}
