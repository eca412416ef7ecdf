use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::state::ServerState;

pub mod auth;
pub mod leaderboard;
pub mod storage;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: storage, account, leaderboard and docs.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let storage_routes = Router::new()
        .route("/storage/query", get(storage::query))
        .route("/storage/objects/:id", get(storage::get).delete(storage::delete))
        .route("/storage/get-set", post(storage::get_set))
        .route("/storage/create", post(storage::create))
        .route("/storage/update", post(storage::update))
        .route("/storage/sync", post(storage::sync))
        .route("/storage/update-set", post(storage::update_set))
        .route("/storage/update-property", post(storage::update_property))
        .route("/storage/update-delta", post(storage::update_delta));

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/password", post(auth::change_password))
        .route("/auth/account", delete(auth::delete_account));

    let leaderboard_routes = Router::new()
        .route("/leaderboard/:type", get(leaderboard::top))
        .route("/leaderboard/rank/:id", get(leaderboard::rank));

    Router::new()
        .route("/health", get(health))
        .merge(storage_routes)
        .merge(auth_routes)
        .merge(leaderboard_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
