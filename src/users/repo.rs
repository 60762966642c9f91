use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::db::StoreError;
use crate::users::dto::{User, UserChanges};

#[derive(Clone, Debug)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All users in insertion order.
    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, login, password, created_at, updated_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, login, password, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or(StoreError::NotFound)
    }

    /// Insert a new user after checking the (email, login) pair is free.
    /// The pair is repository-checked; the table carries no UNIQUE
    /// constraint for it.
    #[instrument(skip(self, password_hash))]
    pub async fn create(
        &self,
        email: &str,
        login: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let taken = sqlx::query("SELECT id FROM users WHERE email = $1 AND login = $2")
            .bind(email)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(StoreError::Duplicate);
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            login: login.to_owned(),
            password: password_hash.to_owned(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, login, password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.password)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Partial update: read the current row under a lock, merge the supplied
    /// fields over it, write the merged record back. One transaction, so
    /// concurrent updates to the same user serialize instead of clobbering
    /// each other.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, login, password, created_at, updated_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let user = apply_changes(current, changes);

        sqlx::query(
            r#"
            UPDATE users
            SET email = $1, login = $2, password = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.password)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Delete the user and every post they authored, atomically. A missing
    /// user rolls the whole cascade back.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM posts WHERE author_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}

fn apply_changes(mut user: User, changes: UserChanges) -> User {
    if let Some(email) = changes.email {
        user.email = email;
    }
    if let Some(login) = changes.login {
        user.login = login;
    }
    if let Some(hash) = changes.password_hash {
        user.password = hash;
    }
    user.updated_at = OffsetDateTime::now_utc();
    user
}
