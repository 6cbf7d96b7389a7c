use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use plantops_core::OperatorContext;
use plantops_infra::services::NewRecipe;
use plantops_production::RecipeId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/:id", get(get_recipe).put(revise_recipe).delete(delete_recipe))
}

pub async fn create_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Json(body): Json<dto::CreateRecipeRequest>,
) -> axum::response::Response {
    let input = NewRecipe {
        product_code: body.product_code,
        name: body.name,
        ingredients: body.ingredients,
    };

    match services.catalog.create_recipe(&ctx, input) {
        Ok(recipe) => (StatusCode::CREATED, Json(dto::RecipeResponse::from(&recipe))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_recipes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
) -> axum::response::Response {
    match services.catalog.list_recipes(&ctx) {
        Ok(recipes) => Json(
            recipes
                .iter()
                .map(dto::RecipeResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RecipeId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.get_recipe(&ctx, id) {
        Ok(recipe) => Json(dto::RecipeResponse::from(&recipe)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn revise_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReviseRecipeRequest>,
) -> axum::response::Response {
    let id: RecipeId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .catalog
        .revise_recipe(&ctx, id, body.name.as_deref(), body.ingredients)
    {
        Ok(recipe) => Json(dto::RecipeResponse::from(&recipe)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Refused with 409 while any production run references the recipe.
pub async fn delete_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<OperatorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RecipeId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.catalog.delete_recipe(&ctx, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
