//! Caller identity extraction.
//!
//! The token is read from `Authorization: Bearer <jwt>`, falling back to the
//! `auth_token` cookie set by `/auth/login`. No token means anonymous; a token
//! that fails verification is rejected before the handler runs.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use service::storage::domain::Caller;

use crate::errors::JsonApiError;
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

fn bearer_token(parts: &Parts) -> Result<Option<String>, JsonApiError> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        let raw = value.to_str().map_err(|_| JsonApiError::unauthorized("malformed Authorization header"))?;
        return match raw.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            _ => {
                warn!(path = %parts.uri.path(), "invalid Authorization format (expect Bearer)");
                Err(JsonApiError::unauthorized("expected Bearer token"))
            }
        };
    }
    let jar = CookieJar::from_headers(&parts.headers);
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// Identity of the request issuer; anonymous when no token is presented.
#[derive(Debug, Clone)]
pub struct RequestCaller(pub Caller);

#[axum::async_trait]
impl FromRequestParts<ServerState> for RequestCaller {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Ok(RequestCaller(Caller::anonymous()));
        };
        match state.auth.verify_token(&token) {
            Ok(claims) => Ok(RequestCaller(Caller::user(claims.uid))),
            Err(e) => {
                warn!(path = %parts.uri.path(), error = %e, "token validation failed");
                Err(JsonApiError::unauthorized("invalid or expired token"))
            }
        }
    }
}

/// Authenticated account id; anonymous requests are rejected.
#[derive(Debug, Clone, Copy)]
pub struct AccountId(pub Uuid);

#[axum::async_trait]
impl FromRequestParts<ServerState> for AccountId {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let RequestCaller(caller) = RequestCaller::from_request_parts(parts, state).await?;
        let uid = caller.user_id.ok_or_else(|| JsonApiError::unauthorized("authentication required"))?;
        Uuid::parse_str(&uid)
            .map(AccountId)
            .map_err(|_| JsonApiError::unauthorized("token does not carry a user id"))
    }
}
