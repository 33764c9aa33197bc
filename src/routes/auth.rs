use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    routes::{extract::AppJson, AppState},
    services::identity::{LoginRequest, LoginResponse, SignupRequest, SignupResponse},
};

pub async fn signup(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let user = state.identity.signup(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = state.identity.login(request).await?;
    Ok(Json(response))
}
