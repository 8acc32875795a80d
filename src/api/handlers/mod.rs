//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod disputes;
pub mod matches;
pub mod system;
pub mod wallet;

use axum::Router;
use axum::http::HeaderMap;

use crate::app_state::AppState;
use crate::domain::ids::UserId;
use crate::error::CoreError;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(matches::routes())
        .merge(wallet::routes())
        .merge(disputes::routes())
        .merge(admin::routes())
}

/// Extracts the acting admin from the `X-Admin-Id` header.
///
/// Every admin-facing call must be attributable for audit; a missing or
/// malformed header is a 400, not an anonymous pass-through.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRequest`] when the header is absent or
/// not a UUID.
pub fn admin_attribution(headers: &HeaderMap) -> Result<UserId, CoreError> {
    let raw = headers
        .get("x-admin-id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| CoreError::InvalidRequest("missing X-Admin-Id header".to_string()))?;
    let uuid = raw
        .parse::<uuid::Uuid>()
        .map_err(|_| CoreError::InvalidRequest(format!("malformed X-Admin-Id: {raw}")))?;
    Ok(UserId::from_uuid(uuid))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_invalid_request() {
        let headers = HeaderMap::new();
        assert!(admin_attribution(&headers).is_err());
    }

    #[test]
    fn malformed_header_is_invalid_request() {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-id", HeaderValue::from_static("not-a-uuid"));
        assert!(admin_attribution(&headers).is_err());
    }

    #[test]
    fn valid_header_parses() {
        let uuid = uuid::Uuid::new_v4();
        let mut headers = HeaderMap::new();
        let Ok(value) = HeaderValue::from_str(&uuid.to_string()) else {
            panic!("uuid is a valid header value");
        };
        headers.insert("x-admin-id", value);
        let Ok(admin) = admin_attribution(&headers) else {
            panic!("valid header must parse");
        };
        assert_eq!(*admin.as_uuid(), uuid);
    }
}
