use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::ApiResult,
    http::{ApiJson, ApiPath, MessageResponse},
    maps::{
        dto::{AddUserLayerRequest, CreatedResponse, GeoLayerView, UpdateUserLayerRequest, UserLayerView},
        services::MapsService,
    },
    state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/maps/layers", get(list_layers))
        .route("/maps/layers/:id", get(get_layer))
}

pub fn user_layer_routes() -> Router<AppState> {
    Router::new()
        .route("/maps/user/layers", get(list_user_layers).post(add_user_layer))
        .route(
            "/maps/user/layers/:id",
            put(update_user_layer).delete(delete_user_layer),
        )
}

#[instrument(skip(maps))]
pub async fn list_layers(State(maps): State<MapsService>) -> ApiResult<Json<Vec<GeoLayerView>>> {
    Ok(Json(maps.list_public_layers().await?))
}

#[instrument(skip(maps))]
pub async fn get_layer(
    State(maps): State<MapsService>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<GeoLayerView>> {
    Ok(Json(maps.get_layer(id).await?))
}

#[instrument(skip(maps))]
pub async fn list_user_layers(
    State(maps): State<MapsService>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<UserLayerView>>> {
    Ok(Json(maps.list_user_layers(user_id).await?))
}

#[instrument(skip(maps, body))]
pub async fn add_user_layer(
    State(maps): State<MapsService>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<AddUserLayerRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let id = maps.add_user_layer(user_id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Layer added successfully",
            id,
        }),
    ))
}

#[instrument(skip(maps, body))]
pub async fn update_user_layer(
    State(maps): State<MapsService>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateUserLayerRequest>,
) -> ApiResult<Json<MessageResponse>> {
    maps.update_user_layer(user_id, id, body).await?;
    Ok(Json(MessageResponse::new("Layer updated successfully")))
}

#[instrument(skip(maps))]
pub async fn delete_user_layer(
    State(maps): State<MapsService>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    maps.delete_user_layer(user_id, id).await?;
    Ok(Json(MessageResponse::new("Layer deleted successfully")))
}
