use core::str::FromStr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use plantops_core::DomainError;
use plantops_infra::store::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Poisoned(what) => {
            error!(table = what, "store lock poisoned");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                format!("storage unavailable ({what})"),
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let code = err.code();
    match err {
        DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
            json_error(StatusCode::BAD_REQUEST, code, msg)
        }
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, code, msg),
        DomainError::Duplicate(msg) | DomainError::Conflict(msg) => {
            json_error(StatusCode::CONFLICT, code, msg)
        }
        DomainError::Linkage(msg) | DomainError::InvalidState(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, code, msg)
        }
        DomainError::InsufficientStock(shortage) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": code,
                "message": format!(
                    "insufficient {}: need {} {}, have {}",
                    shortage.item_name, shortage.required, shortage.unit, shortage.available
                ),
                "item": shortage.item_name,
                "required": shortage.required,
                "available": shortage.available,
                "deficit": shortage.deficit(),
                "unit": shortage.unit,
            })),
        )
            .into_response(),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path/body identifier, mapping failures to a 400.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.trim().parse().map_err(domain_error_to_response)
}
