use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
        extractors::AuthUser,
        services::AuthService,
    },
    error::ApiResult,
    http::{ApiJson, MessageResponse},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    auth.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let access_token = auth.login(payload).await?;
    Ok(Json(TokenResponse { access_token }))
}

#[instrument(skip(auth))]
pub async fn profile(
    State(auth): State<AuthService>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<PublicUser>> {
    Ok(Json(auth.profile(user_id).await?))
}
