use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record as persisted and as served. The `password` field is the
/// Argon2 hash, never the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub login: String,
    pub password: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Request body for user creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub login: String,
    pub password: String,
}

/// Request body for partial update; absent fields keep their prior values.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
}

/// Field changes handed to the repository. Password arrives here already
/// hashed or not at all.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub login: Option<String>,
    pub password_hash: Option<String>,
}
