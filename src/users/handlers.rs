use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::db::StoreError;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::{
    dto::{CreateUserRequest, UpdateUserRequest, User, UserChanges},
    password::hash_password,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        // Create is reachable with and without the trailing slash.
        .route("/users/", put(create_user))
        .route("/users", put(create_user))
        .route("/users/:id", patch(update_user).delete(delete_user))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    match state.users.list().await {
        Ok(users) => Ok(Json(users)),
        Err(e) => {
            error!(error = %e, "list users failed");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, ApiError> {
    // Any string is accepted as an id; one that is not a UUID cannot name a
    // record, so it reads as not-found rather than a malformed request.
    let Ok(id) = Uuid::parse_str(&id) else {
        return Err(ApiError::NotFound("User not found".into()));
    };

    match state.users.get(id).await {
        Ok(user) => Ok(Json(vec![user])),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("User not found".into())),
        Err(e) => {
            // Point reads fold driver errors into not-found.
            error!(error = %e, %id, "get user failed");
            Err(ApiError::NotFound("User not found".into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.login.trim().is_empty() {
        warn!("empty login");
        return Err(ApiError::BadRequest("Login must not be empty".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal(e.to_string())
    })?;

    match state
        .users
        .create(&payload.email, &payload.login, &hash)
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "user created");
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(StoreError::Duplicate) => {
            warn!(email = %payload.email, login = %payload.login, "user already exists");
            Err(ApiError::BadRequest(
                "A user with this email and login already exists".into(),
            ))
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            Err(ApiError::BadRequest("Could not create user".into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let email = match payload.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                warn!(%email, "invalid email");
                return Err(ApiError::BadRequest("Invalid email".into()));
            }
            Some(email)
        }
        None => None,
    };

    if let Some(login) = &payload.login {
        if login.trim().is_empty() {
            warn!("empty login");
            return Err(ApiError::BadRequest("Login must not be empty".into()));
        }
    }

    let password_hash = match payload.password {
        Some(plain) => {
            if plain.len() < 8 {
                warn!("password too short");
                return Err(ApiError::BadRequest("Password too short".into()));
            }
            Some(hash_password(&plain).map_err(|e| {
                error!(error = %e, "hash_password failed");
                ApiError::Internal(e.to_string())
            })?)
        }
        None => None,
    };

    let changes = UserChanges {
        email,
        login: payload.login,
        password_hash,
    };

    match state.users.update(id, changes).await {
        Ok(user) => {
            info!(user_id = %user.id, "user updated");
            Ok(Json(user))
        }
        Err(StoreError::NotFound) => Err(ApiError::NotFound("User not found".into())),
        Err(e) => {
            error!(error = %e, %id, "update user failed");
            Err(ApiError::BadRequest("Could not update user".into()))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    match state.users.delete(id).await {
        Ok(()) => {
            info!(user_id = %id, "user and their posts deleted");
            Ok(Json(json!({ "status": "deleted" })))
        }
        Err(StoreError::NotFound) => Err(ApiError::NotFound("User not found".into())),
        Err(e) => {
            error!(error = %e, %id, "delete user failed");
            Err(ApiError::BadRequest("Could not delete user".into()))
        }
    }
}
