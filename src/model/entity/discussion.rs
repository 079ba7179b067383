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
pub struct Discussion {
    id: Uuid,
    course_id: Uuid,
    author_id: Uuid,
    author: String,
    title: String,
    content: String,
    likes: i32,
    created_at: DateTime<Utc>,
}

/// Author fields come from the session, never from the request body.
#[derive(Debug, Clone)]
pub struct DiscussionCreate {
    pub course_id: Uuid,
    pub author_id: Uuid,
    pub author: String,
    pub title: String,
    pub content: String,
}

impl ResourceTyped for Discussion {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Discussion
    }
}

impl Discussion {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn author_id(&self) -> Uuid {
        self.author_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn likes(&self) -> i32 {
        self.likes
    }
}

#[async_trait]
impl CrudRepository<Discussion, DiscussionCreate, uuid::Uuid> for Discussion {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: DiscussionCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO discussions (id, course_id, author_id, author, title, content)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(data.author_id)
        .bind(&data.author)
        .bind(&data.title)
        .bind(&data.content)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: DiscussionCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            "UPDATE discussions SET title = $1, content = $2 WHERE id = $3 RETURNING *",
        )
        .bind(&data.title)
        .bind(&data.content)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM discussions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM discussions WHERE id = $1")
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
        let result =
            sqlx::query_as("SELECT * FROM discussions ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discussions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Discussion {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.author_id)
    }
}

impl Discussion {
    pub async fn find_all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM discussions WHERE course_id = $1 ORDER BY created_at DESC",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    pub async fn like(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Self> {
        let row = sqlx::query_as("UPDATE discussions SET likes = likes + 1 WHERE id = $1 RETURNING *")
            .bind(self.id)
            .fetch_one(mm.executor())
            .await?;
        Ok(row)
    }
}
