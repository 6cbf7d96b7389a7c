use axum::Router;

pub mod inventory;
pub mod production;
pub mod recipes;
pub mod reports;
pub mod system;

/// All protected routes (handlers expect an `OperatorContext` extension).
pub fn router() -> Router {
    Router::new()
        .nest("/recipes", recipes::router())
        .nest("/inventory", inventory::router())
        .nest("/production", production::router())
        .nest("/reports", reports::router())
        .merge(system::router())
}
