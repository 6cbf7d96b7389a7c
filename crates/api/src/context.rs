//! Operator context extraction.
//!
//! Authentication happens at the gateway, which forwards the resolved
//! identity as headers. A request without a complete, well-formed identity
//! never reaches a handler.

use axum::http::HeaderMap;

use plantops_core::{OperatorContext, TenantId, UserId};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const OPERATOR_ID_HEADER: &str = "x-operator-id";
pub const OPERATOR_NAME_HEADER: &str = "x-operator-name";

/// Build the operator context from gateway headers, if all are present and valid.
pub fn operator_from_headers(headers: &HeaderMap) -> Option<OperatorContext> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let tenant_id: TenantId = header(TENANT_HEADER)?.parse().ok()?;
    let operator_id: UserId = header(OPERATOR_ID_HEADER)?.parse().ok()?;
    let operator_name = header(OPERATOR_NAME_HEADER)?;

    Some(OperatorContext::new(tenant_id, operator_id, operator_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn complete_headers_yield_a_context() {
        let tenant = TenantId::new();
        let tenant_str = tenant.to_string();
        let operator_str = UserId::new().to_string();
        let ctx = operator_from_headers(&headers(&[
            (TENANT_HEADER, tenant_str.as_str()),
            (OPERATOR_ID_HEADER, operator_str.as_str()),
            (OPERATOR_NAME_HEADER, " Ahmed "),
        ]))
        .unwrap();

        assert_eq!(ctx.tenant_id(), tenant);
        assert_eq!(ctx.operator_name(), "Ahmed");
    }

    #[test]
    fn missing_or_malformed_headers_are_rejected() {
        let tenant_str = TenantId::new().to_string();
        let operator_str = UserId::new().to_string();

        assert!(operator_from_headers(&HeaderMap::new()).is_none());
        assert!(operator_from_headers(&headers(&[
            (TENANT_HEADER, "not-a-uuid"),
            (OPERATOR_ID_HEADER, operator_str.as_str()),
            (OPERATOR_NAME_HEADER, "Ahmed"),
        ]))
        .is_none());
        assert!(operator_from_headers(&headers(&[
            (TENANT_HEADER, tenant_str.as_str()),
            (OPERATOR_ID_HEADER, operator_str.as_str()),
            (OPERATOR_NAME_HEADER, "  "),
        ]))
        .is_none());
    }
}
