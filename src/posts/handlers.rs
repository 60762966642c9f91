use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::db::StoreError;
use crate::error::ApiError;
use crate::posts::dto::{CreatePostRequest, Post, PostChanges, UpdatePostRequest};
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/:id", get(get_post))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", put(create_post))
        .route("/posts/:id", patch(update_post).delete(delete_post))
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    match state.posts.list().await {
        Ok(posts) => Ok(Json(posts)),
        Err(e) => {
            error!(error = %e, "list posts failed");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Post>>, ApiError> {
    // Any string is accepted as an id; a non-UUID cannot name a record.
    let Ok(id) = Uuid::parse_str(&id) else {
        return Err(ApiError::NotFound("Post not found".into()));
    };

    match state.posts.get(id).await {
        Ok(post) => Ok(Json(vec![post])),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("Post not found".into())),
        Err(e) => {
            // Point reads fold driver errors into not-found.
            error!(error = %e, %id, "get post failed");
            Err(ApiError::NotFound("Post not found".into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    if payload.title.trim().is_empty() {
        warn!("empty title");
        return Err(ApiError::BadRequest("Title must not be empty".into()));
    }

    match state
        .posts
        .create(payload.author_id, &payload.title, &payload.content)
        .await
    {
        Ok(post) => {
            info!(post_id = %post.id, author_id = %post.author_id, "post created");
            Ok((StatusCode::CREATED, Json(post)))
        }
        Err(StoreError::AuthorMissing) => {
            warn!(author_id = %payload.author_id, "author does not exist");
            Err(ApiError::BadRequest("Author does not exist".into()))
        }
        Err(e) => {
            error!(error = %e, "create post failed");
            Err(ApiError::BadRequest("Could not create post".into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            warn!("empty title");
            return Err(ApiError::BadRequest("Title must not be empty".into()));
        }
    }

    let changes = PostChanges {
        title: payload.title,
        content: payload.content,
    };

    match state.posts.update(id, changes).await {
        Ok(post) => {
            info!(post_id = %post.id, "post updated");
            Ok(Json(post))
        }
        Err(StoreError::NotFound) => Err(ApiError::NotFound("Post not found".into())),
        Err(e) => {
            error!(error = %e, %id, "update post failed");
            Err(ApiError::BadRequest("Could not update post".into()))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    match state.posts.delete(id).await {
        // Zero affected rows still counts as a successful delete.
        Ok(_) => {
            info!(post_id = %id, "post deleted");
            Ok(Json(json!({ "status": "deleted" })))
        }
        Err(e) => {
            error!(error = %e, %id, "delete post failed");
            Err(ApiError::BadRequest("Could not delete post".into()))
        }
    }
}
