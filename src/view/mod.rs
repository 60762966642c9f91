use askama::Template;
use axum::{extract::State, response::Html, routing::get, Router};
use tracing::{error, instrument};

use crate::error::ApiError;
use crate::posts::dto::Post;
use crate::state::AppState;
use crate::users::dto::User;

/// Index page listing both entities. The view fetches through the
/// repositories in-process rather than re-requesting the API over loopback
/// HTTP, so a storage failure surfaces as a typed error instead of a client
/// timeout.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    users: Vec<User>,
    posts: Vec<Post>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

#[instrument(skip(state))]
async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let users = state.users.list().await.map_err(|e| {
        error!(error = %e, "list users for index failed");
        ApiError::Internal(e.to_string())
    })?;
    let posts = state.posts.list().await.map_err(|e| {
        error!(error = %e, "list posts for index failed");
        ApiError::Internal(e.to_string())
    })?;

    let page = IndexTemplate { users, posts };
    page.render().map(Html).map_err(|e| {
        error!(error = %e, "index template render failed");
        ApiError::Internal("template render failed".into())
    })
}
