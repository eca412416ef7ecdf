use axum::extract::{Path, Query, State};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use utoipa::IntoParams;

use service::storage::domain::{RankEntry, RankedObject};

use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopParams {
    /// default 10, clamped to 25
    pub top: Option<i64>,
}

#[utoipa::path(get, path = "/leaderboard/{type}", tag = "leaderboard",
    params(("type" = String, Path,), TopParams),
    responses((status = 200, body = [crate::openapi::RankedObjectDoc]), (status = 400, description = "Invalid type or top")))]
pub async fn top(
    State(state): State<ServerState>,
    Path(object_type): Path<String>,
    WithRejection(Query(params), _): WithRejection<Query<TopParams>, JsonApiError>,
) -> Result<Json<Vec<RankedObject>>, JsonApiError> {
    Ok(Json(state.leaderboard.top(&object_type, params.top).await?))
}

#[utoipa::path(get, path = "/leaderboard/rank/{id}", tag = "leaderboard",
    params(("id" = String, Path,)),
    responses((status = 200, description = "Rank entry, or null when absent", body = crate::openapi::RankEntryDoc)))]
pub async fn rank(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Option<RankEntry>>, JsonApiError> {
    Ok(Json(state.leaderboard.rank(&id).await?))
}
