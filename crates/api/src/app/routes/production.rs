use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use plantops_core::OperatorContext;
use plantops_infra::services::{CompleteRun, ImmediateRun, ScheduleRun};
use plantops_inventory::StorageLocationId;
use plantops_production::{ProductionRunId, RecipeId, RunDetails, RunStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/runs/immediate", post(run_immediate))
        .route("/runs", get(list_runs).post(schedule_run))
        .route("/runs/:id", get(get_run))
        .route("/runs/:id/reschedule", post(reschedule_run))
        .route("/runs/:id/delay", post(delay_run))
        .route("/runs/:id/start", post(start_run))
        .route("/runs/:id/complete", post(complete_run))
}

/// Produce now: plan, check every material, deduct, record. All or nothing.
pub async fn run_immediate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Json(body): Json<dto::ImmediateRunRequest>,
) -> axum::response::Response {
    let recipe_id: RecipeId = match errors::parse_id(&body.recipe_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let silo_id = match body
        .silo_id
        .as_deref()
        .map(errors::parse_id::<StorageLocationId>)
        .transpose()
    {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let input = ImmediateRun {
        recipe_id,
        quantity: body.quantity,
        silo_id,
        details: RunDetails {
            notes: body.notes,
            client_reference: body.client_reference,
        },
    };

    match services.scheduler.run_immediate(&ctx, input) {
        Ok(outcome) => (StatusCode::CREATED, Json(dto::ConsumptionResponse::from(&outcome))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn schedule_run(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Json(body): Json<dto::ScheduleRunRequest>,
) -> axum::response::Response {
    let recipe_id: RecipeId = match errors::parse_id(&body.recipe_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let silo_id: StorageLocationId = match errors::parse_id(&body.silo_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let input = ScheduleRun {
        recipe_id,
        planned_quantity: body.planned_quantity,
        silo_id,
        scheduled_date: body.scheduled_date,
        details: RunDetails {
            notes: body.notes,
            client_reference: body.client_reference,
        },
    };

    match services.scheduler.schedule_run(&ctx, input) {
        Ok(run) => (StatusCode::CREATED, Json(dto::RunResponse::from(&run))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_runs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Query(q): Query<dto::RunsQuery>,
) -> axum::response::Response {
    let status = match q.status.as_deref().map(str::parse::<RunStatus>).transpose() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.scheduler.list_runs(&ctx, status) {
        Ok(runs) => Json(runs.iter().map(dto::RunResponse::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_run(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductionRunId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.scheduler.get_run(&ctx, id) {
        Ok(run) => Json(dto::RunResponse::from(&run)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn reschedule_run(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RescheduleRunRequest>,
) -> axum::response::Response {
    let id: ProductionRunId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .scheduler
        .reschedule_run(&ctx, id, body.new_date, body.reason)
    {
        Ok(run) => Json(dto::RunResponse::from(&run)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delay_run(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::DelayRunRequest>,
) -> axum::response::Response {
    let id: ProductionRunId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.scheduler.delay_run(&ctx, id, &body.reason) {
        Ok(run) => Json(dto::RunResponse::from(&run)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn start_run(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductionRunId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.scheduler.start_run(&ctx, id) {
        Ok(run) => Json(dto::RunResponse::from(&run)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Record actuals and deduct them. A shortage leaves the run in progress.
pub async fn complete_run(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CompleteRunRequest>,
) -> axum::response::Response {
    let id: ProductionRunId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let input = CompleteRun {
        actual_quantity: body.actual_quantity,
        actual_usage: body.actual_usage,
    };

    match services.scheduler.complete_run(&ctx, id, input) {
        Ok(outcome) => Json(dto::ConsumptionResponse::from(&outcome)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
