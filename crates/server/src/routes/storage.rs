use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use utoipa::IntoParams;

use service::storage::domain::{QueryRequest, StorageObject, StorageObjectInput};

use crate::auth::RequestCaller;
use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Query-string form of a storage query.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueryParams {
    /// ObjectType to scan
    #[serde(rename = "type")]
    pub object_type: String,
    /// e.g. `level gt 3 and name sw 'A'`
    pub filter: Option<String>,
    /// `<property>[ desc]`
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    /// negative means 0
    pub skip: Option<i64>,
    /// clamped to 0..=25
    pub top: Option<i64>,
}

impl From<QueryParams> for QueryRequest {
    fn from(p: QueryParams) -> Self {
        QueryRequest { object_type: p.object_type, filter: p.filter, order_by: p.order_by, skip: p.skip, top: p.top }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    pub id: String,
    pub property_name: String,
    pub property_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeltaRequest {
    pub id: String,
    pub property_name: String,
    pub delta: f64,
    #[serde(default)]
    pub is_float: bool,
}

#[utoipa::path(get, path = "/storage/query", tag = "storage",
    params(QueryParams),
    responses((status = 200, body = [crate::openapi::StorageObjectDoc]), (status = 400, description = "Malformed query")))]
pub async fn query(
    State(state): State<ServerState>,
    WithRejection(Query(params), _): WithRejection<Query<QueryParams>, JsonApiError>,
) -> Result<Json<Vec<StorageObject>>, JsonApiError> {
    Ok(Json(state.storage.query(&QueryRequest::from(params)).await?))
}

#[utoipa::path(get, path = "/storage/objects/{id}", tag = "storage",
    params(("id" = String, Path,)),
    responses((status = 200, description = "The object, or null when absent", body = crate::openapi::StorageObjectDoc)))]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Option<StorageObject>>, JsonApiError> {
    Ok(Json(state.storage.get(&id).await?))
}

#[utoipa::path(post, path = "/storage/get-set", tag = "storage", request_body = Vec<String>,
    responses((status = 200, body = [crate::openapi::StorageObjectDoc])))]
pub async fn get_set(
    State(state): State<ServerState>,
    WithRejection(Json(ids), _): WithRejection<Json<Vec<String>>, JsonApiError>,
) -> Result<Json<Vec<StorageObject>>, JsonApiError> {
    Ok(Json(state.storage.get_set(&ids).await?))
}

#[utoipa::path(post, path = "/storage/create", tag = "storage", request_body = crate::openapi::StorageObjectInputDoc,
    responses((status = 200, body = crate::openapi::StorageObjectDoc), (status = 400, description = "Invalid payload"), (status = 409, description = "ObjectId already exists")))]
pub async fn create(
    State(state): State<ServerState>,
    WithRejection(Json(input), _): WithRejection<Json<StorageObjectInput>, JsonApiError>,
) -> Result<Json<StorageObject>, JsonApiError> {
    Ok(Json(state.storage.create(input).await?))
}

#[utoipa::path(post, path = "/storage/update", tag = "storage", request_body = crate::openapi::StorageObjectInputDoc,
    responses((status = 200, body = crate::openapi::StorageObjectDoc), (status = 400, description = "Invalid payload or ObjectType change"), (status = 401, description = "ACL denied")))]
pub async fn update(
    State(state): State<ServerState>,
    RequestCaller(caller): RequestCaller,
    WithRejection(Json(input), _): WithRejection<Json<StorageObjectInput>, JsonApiError>,
) -> Result<Json<StorageObject>, JsonApiError> {
    Ok(Json(state.storage.update(input, &caller).await?))
}

#[utoipa::path(post, path = "/storage/sync", tag = "storage", request_body = crate::openapi::StorageObjectInputDoc,
    responses((status = 200, description = "Stored object after the sync", body = crate::openapi::StorageObjectDoc)))]
pub async fn sync(
    State(state): State<ServerState>,
    RequestCaller(caller): RequestCaller,
    WithRejection(Json(input), _): WithRejection<Json<StorageObjectInput>, JsonApiError>,
) -> Result<Json<StorageObject>, JsonApiError> {
    Ok(Json(state.storage.sync(input, &caller).await?))
}

#[utoipa::path(post, path = "/storage/update-set", tag = "storage", request_body = [crate::openapi::StorageObjectInputDoc],
    responses((status = 200, description = "All objects saved"), (status = 400, description = "Batch rejected, nothing saved")))]
pub async fn update_set(
    State(state): State<ServerState>,
    RequestCaller(caller): RequestCaller,
    WithRejection(Json(inputs), _): WithRejection<Json<Vec<StorageObjectInput>>, JsonApiError>,
) -> Result<StatusCode, JsonApiError> {
    state.storage.update_set(inputs, &caller).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(post, path = "/storage/update-property", tag = "storage", request_body = crate::openapi::UpdatePropertyDoc,
    responses((status = 200, description = "Updated, or object absent")))]
pub async fn update_property(
    State(state): State<ServerState>,
    RequestCaller(caller): RequestCaller,
    WithRejection(Json(req), _): WithRejection<Json<UpdatePropertyRequest>, JsonApiError>,
) -> Result<StatusCode, JsonApiError> {
    state.storage.update_property(&req.id, &req.property_name, &req.property_value, &caller).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(post, path = "/storage/update-delta", tag = "storage", request_body = crate::openapi::UpdateDeltaDoc,
    responses((status = 200, description = "Updated, or object absent")))]
pub async fn update_delta(
    State(state): State<ServerState>,
    RequestCaller(caller): RequestCaller,
    WithRejection(Json(req), _): WithRejection<Json<UpdateDeltaRequest>, JsonApiError>,
) -> Result<StatusCode, JsonApiError> {
    state.storage.update_delta(&req.id, &req.property_name, req.delta, req.is_float, &caller).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(delete, path = "/storage/objects/{id}", tag = "storage",
    params(("id" = String, Path,)),
    responses((status = 200, description = "Deleted, or object absent"), (status = 401, description = "ACL denied")))]
pub async fn delete(
    State(state): State<ServerState>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.storage.delete(&id, &caller).await?;
    Ok(StatusCode::OK)
}
