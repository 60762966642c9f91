use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::db::StoreError;
use crate::posts::dto::{Post, PostChanges};

#[derive(Clone, Debug)]
pub struct PostRepo {
    pool: PgPool,
}

impl PostRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All posts in insertion order.
    pub async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, created_at, updated_at
            FROM posts
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn get(&self, id: Uuid) -> Result<Post, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        post.ok_or(StoreError::NotFound)
    }

    /// Insert a new post. The author must exist; the reference is
    /// repository-checked, the table carries no foreign key.
    #[instrument(skip(self, content))]
    pub async fn create(
        &self,
        author_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Post, StoreError> {
        let author = sqlx::query("SELECT id FROM users WHERE id = $1")
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await?;
        if author.is_none() {
            return Err(StoreError::AuthorMissing);
        }

        let now = OffsetDateTime::now_utc();
        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            title: title.to_owned(),
            content: content.to_owned(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(post)
    }

    /// Partial update under a row lock; see `UserRepo::update`.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Post, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, title, content, created_at, updated_at
            FROM posts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let post = apply_changes(current, changes);

        sqlx::query(
            r#"
            UPDATE posts
            SET title = $1, content = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.updated_at)
        .bind(post.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(post)
    }

    /// Delete by id. Zero affected rows is still success; returns the count.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn apply_changes(mut post: Post, changes: PostChanges) -> Post {
    if let Some(title) = changes.title {
        post.title = title;
    }
    if let Some(content) = changes.content {
        post.content = content;
    }
    post.updated_at = OffsetDateTime::now_utc();
    post
}
