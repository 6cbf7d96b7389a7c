use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use plantops_core::OperatorContext;
use plantops_production::DateRange;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/variance", get(variance_report))
}

/// Planned vs actual material usage for runs completed in `[from, to)`.
pub async fn variance_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Query(q): Query<dto::VarianceQuery>,
) -> axum::response::Response {
    let range = match DateRange::new(q.from, q.to) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.reporter.variance_report(&ctx, range) {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
