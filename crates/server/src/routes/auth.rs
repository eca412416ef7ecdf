use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use uuid::Uuid;

use service::auth::domain::{ChangePasswordInput, LoginInput, RegisterInput};

use crate::auth::{AccountId, AUTH_COOKIE};
use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Serialize)]
pub struct RegisterOutput { pub user_id: Uuid }

#[derive(Serialize)]
pub struct LoginOutput { pub user_id: Uuid, pub email: String, pub name: String, pub token: String }

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, WithRejection(Json(input), _): WithRejection<Json<RegisterInput>, JsonApiError>) -> Result<Json<RegisterOutput>, JsonApiError> {
    let user = state.auth.register(input).await?;
    Ok(Json(RegisterOutput { user_id: user.id }))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, WithRejection(Json(input), _): WithRejection<Json<LoginInput>, JsonApiError>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    let user = session.user;
    Ok((jar, Json(LoginOutput { user_id: user.id, email: user.email, name: user.name, token: session.token })))
}

#[utoipa::path(post, path = "/auth/password", tag = "auth", request_body = crate::openapi::ChangePasswordRequest, responses((status = 204, description = "Password changed"), (status = 401, description = "Unauthorized")))]
pub async fn change_password(
    State(state): State<ServerState>,
    AccountId(user_id): AccountId,
    WithRejection(Json(input), _): WithRejection<Json<ChangePasswordInput>, JsonApiError>,
) -> Result<StatusCode, JsonApiError> {
    state.auth.change_password(user_id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes the account and every storage object it owns, then clears the session cookie.
#[utoipa::path(delete, path = "/auth/account", tag = "auth", responses((status = 204, description = "Account deleted"), (status = 401, description = "Unauthorized")))]
pub async fn delete_account(
    State(state): State<ServerState>,
    AccountId(user_id): AccountId,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), JsonApiError> {
    state.auth.delete_account(user_id).await?;
    Ok((jar.remove(Cookie::from(AUTH_COOKIE)), StatusCode::NO_CONTENT))
}
