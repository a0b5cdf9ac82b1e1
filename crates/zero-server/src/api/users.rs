use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;

use zero_core::error::ZeroError;
use zero_core::{NewUser, User};

use crate::api::respond::ErrorResponse;
use crate::app_state::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ErrorResponse> {
    let users = state.store().list().await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ErrorResponse> {
    let uid: u64 = id
        .parse()
        .map_err(|_| ZeroError::BadRequest(format!("invalid user id: {id}")))?;

    state
        .store()
        .get(uid)
        .await?
        .map(Json)
        .ok_or_else(|| ZeroError::NotFound(format!("can't find user with id: {id}")).into())
}

pub async fn add_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ErrorResponse> {
    let Json(new_user) = payload
        .map_err(|_| ZeroError::BadRequest("can't deserialize json with user".into()))?;

    let user = state.store().insert(new_user).await?;
    tracing::debug!(id = user.id, "user inserted");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Error simulator: answers 500 with the request body as the message.
pub async fn simulate_error(body: Bytes) -> ErrorResponse {
    let msg = String::from_utf8_lossy(&body).into_owned();
    ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
}

pub async fn not_found(uri: axum::http::Uri) -> ErrorResponse {
    ErrorResponse::new(StatusCode::NOT_FOUND, format!("not found: {}", uri.path()))
}
