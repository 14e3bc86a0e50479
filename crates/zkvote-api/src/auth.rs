//! # Admin Authentication
//!
//! Ballot creation and voter revocation require `Authorization: Bearer
//! <ZKVOTE_ADMIN_TOKEN>`. With no admin token configured those routes are
//! disabled and answer 403. Voter-facing routes are unauthenticated: voters
//! prove eligibility with their credential, not with a session.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the request carried the admin bearer token. Take it as a
/// handler argument to guard the route.
#[derive(Debug, Clone, Copy)]
pub struct AdminCaller;

/// Constant-time comparison of bearer tokens.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Check an `Authorization` header value against the configured token.
pub fn authorize_admin(header_value: Option<&str>, expected: Option<&str>) -> Result<AdminCaller, AppError> {
    let Some(expected) = expected else {
        return Err(AppError::Forbidden(
            "admin routes are disabled: no admin token configured".to_string(),
        ));
    };
    let Some(value) = header_value else {
        return Err(AppError::Unauthorized("missing authorization header".to_string()));
    };
    let Some(provided) = value.strip_prefix("Bearer ") else {
        return Err(AppError::Unauthorized(
            "authorization header must use Bearer scheme".to_string(),
        ));
    };
    if constant_time_token_eq(provided.trim(), expected) {
        Ok(AdminCaller)
    } else {
        Err(AppError::Unauthorized("invalid bearer token".to_string()))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        authorize_admin(header_value, state.config.admin_token.as_deref()).map_err(|e| {
            tracing::warn!(error = %e, "admin authentication failed");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_equality() {
        assert!(constant_time_token_eq("abc", "abc"));
        assert!(!constant_time_token_eq("abd", "abc"));
        assert!(!constant_time_token_eq("abcd", "abc"));
        assert!(!constant_time_token_eq("", "abc"));
    }

    #[test]
    fn disabled_without_configured_token() {
        assert!(matches!(
            authorize_admin(Some("Bearer anything"), None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn header_checks() {
        assert!(authorize_admin(Some("Bearer s3cret"), Some("s3cret")).is_ok());
        assert!(matches!(
            authorize_admin(None, Some("s3cret")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize_admin(Some("Basic s3cret"), Some("s3cret")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize_admin(Some("Bearer wrong"), Some("s3cret")),
            Err(AppError::Unauthorized(_))
        ));
    }
}
