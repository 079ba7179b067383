use crate::model::entity::Enrollment;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Pdf,
    Video,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Material {
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// A unit of course content; finishing every module of a course completes it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseModule {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: String,
    #[schema(value_type = Vec<Material>)]
    materials: Json<Vec<Material>>,
    order_index: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseModuleCreate {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    /// Appended after the last module when omitted
    pub order_index: Option<i32>,
}

impl ResourceTyped for CourseModule {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::CourseModule
    }
}

impl CourseModule {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

/// Creating or deleting a module changes the denominator of every enrollment's
/// progress, so both recompute the course's enrollments in the same transaction.
#[async_trait]
impl CrudRepository<CourseModule, CourseModuleCreate, uuid::Uuid> for CourseModule {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseModuleCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.begin().await?;

        let row: Self = sqlx::query_as(
            r#"
            INSERT INTO course_modules (id, course_id, title, description, materials, order_index)
            VALUES ($1, $2, $3, $4, $5,
                COALESCE($6, (SELECT MAX(order_index) + 1 FROM course_modules WHERE course_id = $2), 0))
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(Json(&data.materials))
        .bind(data.order_index)
        .fetch_one(&mut *tx)
        .await?;

        Enrollment::recompute_for_course(&mut tx, data.course_id).await?;
        tx.commit().await?;

        Ok(row)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseModuleCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            UPDATE course_modules
            SET title = $1, description = $2, materials = $3, order_index = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(Json(&data.materials))
        .bind(data.order_index.unwrap_or(self.order_index))
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        let mut tx = mm.begin().await?;

        sqlx::query("DELETE FROM course_modules WHERE id = $1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;

        Enrollment::recompute_for_course(&mut tx, self.course_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM course_modules WHERE id = $1")
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
            "SELECT * FROM course_modules ORDER BY course_id, order_index LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course_modules")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

// Utils

impl CourseModule {
    pub async fn find_all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<Self> = sqlx::query_as(
            r#"
            SELECT *
            FROM course_modules cm
            WHERE cm.course_id = $1
            ORDER BY cm.order_index, cm.title
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }

    /// Module ids of a course, usable inside a transaction.
    pub async fn ids_by_course<'e, E>(executor: E, course_id: Uuid) -> DatabaseResult<Vec<Uuid>>
    where
        E: PgExecutor<'e>,
    {
        let ids = sqlx::query_scalar("SELECT id FROM course_modules WHERE course_id = $1")
            .bind(course_id)
            .fetch_all(executor)
            .await?;
        Ok(ids)
    }
}
