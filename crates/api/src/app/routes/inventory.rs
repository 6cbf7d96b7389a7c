use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use plantops_core::OperatorContext;
use plantops_inventory::{InventoryItemId, NewInventoryItem};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item))
        .route("/items/:id/receive", post(receive_stock))
        .route("/silos", get(list_silos))
        .route("/transactions", get(list_transactions))
}

pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Json(body): Json<dto::CreateLocationRequest>,
) -> axum::response::Response {
    match services.inventory.create_location(&ctx, &body.name, body.kind) {
        Ok(loc) => (StatusCode::CREATED, Json(dto::LocationResponse::from(&loc))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
) -> axum::response::Response {
    match services.inventory.list_locations(&ctx) {
        Ok(locs) => Json(locs.iter().map(dto::LocationResponse::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Json(body): Json<NewInventoryItem>,
) -> axum::response::Response {
    match services.inventory.create_item(&ctx, body) {
        Ok(item) => (StatusCode::CREATED, Json(dto::ItemResponse::from(&item))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
) -> axum::response::Response {
    match services.inventory.list_items(&ctx) {
        Ok(items) => Json(items.iter().map(dto::ItemResponse::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InventoryItemId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.inventory.get_item(&ctx, id) {
        Ok(item) => Json(dto::ItemResponse::from(&item)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn receive_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveStockRequest>,
) -> axum::response::Response {
    let id: InventoryItemId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.inventory.receive_stock(&ctx, id, body.amount, &body.reason) {
        Ok((item, transaction)) => Json(dto::ReceiveStockResponse {
            item: dto::ItemResponse::from(&item),
            transaction,
        })
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_silos(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
) -> axum::response::Response {
    match services.inventory.list_silos(&ctx) {
        Ok(silos) => Json(silos.iter().map(dto::SiloResponse::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Audit trail, optionally narrowed with `?item_id=`.
pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Query(q): Query<dto::TransactionsQuery>,
) -> axum::response::Response {
    let item_id = match q
        .item_id
        .as_deref()
        .map(errors::parse_id::<InventoryItemId>)
        .transpose()
    {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.inventory.list_transactions(&ctx, item_id) {
        Ok(txs) => Json(txs).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
