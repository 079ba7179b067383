use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Comment {
    id: Uuid,
    discussion_id: Uuid,
    author_id: Uuid,
    author: String,
    content: String,
    likes: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentCreate {
    pub discussion_id: Uuid,
    pub author_id: Uuid,
    pub author: String,
    pub content: String,
}

impl ResourceTyped for Comment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Comment
    }
}

impl Comment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn discussion_id(&self) -> Uuid {
        self.discussion_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[async_trait]
impl CrudRepository<Comment, CommentCreate, uuid::Uuid> for Comment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CommentCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO discussion_comments (id, discussion_id, author_id, author, content)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.discussion_id)
        .bind(data.author_id)
        .bind(&data.author)
        .bind(&data.content)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CommentCreate,
    ) -> DatabaseResult<Self> {
        let row =
            sqlx::query_as("UPDATE discussion_comments SET content = $1 WHERE id = $2 RETURNING *")
                .bind(&data.content)
                .bind(self.id)
                .fetch_one(mm.executor())
                .await?;

        Ok(row)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM discussion_comments WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM discussion_comments WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM discussion_comments ORDER BY created_at LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discussion_comments")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Comment {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.author_id)
    }
}

impl Comment {
    /// Comments of several threads in one round trip, oldest first.
    pub async fn find_all_by_discussions(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        discussion_ids: &[Uuid],
    ) -> DatabaseResult<Vec<Self>> {
        if discussion_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as(
            r#"
            SELECT *
            FROM discussion_comments
            WHERE discussion_id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(discussion_ids)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
