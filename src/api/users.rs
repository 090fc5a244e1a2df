//! User account endpoints

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Path};
use crate::domain::{User, UserId};

/// Body of `POST /users`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterUserRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Body of `PUT /users/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Body of `PUT /users/{id}/password`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub password: String,
}

/// POST /users
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    debug!(username = %request.username, "Registering user");

    let user = User::new(
        request.username,
        request.first_name,
        request.last_name,
        request.email,
        request.password,
    );

    let created = state.user_service.register_user(user).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.user_service.get_all_users().await?;

    Ok(Json(users))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    debug!(user_id = id, "Getting user");

    let user = state.user_service.get_user_by_id(UserId::new(id)).await?;

    Ok(Json(user))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    debug!(user_id = id, "Updating user");

    let user = User::new(
        request.username,
        request.first_name,
        request.last_name,
        request.email,
        "",
    )
    .with_id(UserId::new(id));

    let updated = state.user_service.update_user_data(user).await?;

    Ok(Json(updated))
}

/// PUT /users/{id}/password
pub async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    debug!(user_id = id, "Changing password");

    let user = User {
        id: UserId::new(id),
        password: request.password,
        ..User::default()
    };

    state.user_service.change_password(&user).await?;

    Ok(StatusCode::NO_CONTENT)
}
