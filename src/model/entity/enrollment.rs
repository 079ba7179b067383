use crate::grading::{ProgressUpdate, recompute_progress};
use crate::model::access::HasOwner;
use crate::model::entity::CourseModule;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// One learner enrolled into one course.
///
/// `progress` and `completed` are derived from `completed_modules` and the
/// course's modules, they are only ever written together with the set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
    progress: i16,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    completed_modules: Vec<Uuid>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn progress(&self) -> i16 {
        self.progress
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn completed_modules(&self) -> &[Uuid] {
        &self.completed_modules
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct EnrollmentWithCourseRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub enrolled_at: DateTime<Utc>,
    pub progress: i16,
    pub completed: bool,
    pub completed_modules: Vec<Uuid>,
}

impl Enrollment {
    /// Enrolls `actor` and bumps the course's `enrolled_count`.
    ///
    /// Returns `None` if the learner is already enrolled.
    pub async fn enroll(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let mut tx = mm.begin().await?;

        let created: Option<Self> = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, user_id, course_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;

        if created.is_none() {
            return Ok(None);
        }

        sqlx::query("UPDATE courses SET enrolled_count = enrolled_count + 1 WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn find_for_course(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2")
                .bind(actor.user_id())
                .bind(course_id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result)
    }

    pub async fn find_all_by_user(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<EnrollmentWithCourseRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
            e.id,
            e.course_id,
            c.title AS course_title,
            e.enrolled_at,
            e.progress,
            e.completed,
            e.completed_modules
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }

    /// Marks `module_id` as completed for `actor`'s enrollment in `course_id`.
    ///
    /// The enrollment row is locked for the duration of the update so that
    /// concurrent completions of the same learner serialize. Returns `None`
    /// when the learner is not enrolled.
    #[tracing::instrument(skip(mm, actor), fields(user_id = %actor.user_id()))]
    pub async fn complete_module(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
        module_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let mut tx = mm.begin().await?;

        let enrollment: Option<Self> = sqlx::query_as(
            "SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2 FOR UPDATE",
        )
        .bind(actor.user_id())
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(enrollment) = enrollment else {
            return Ok(None);
        };

        let modules = CourseModule::ids_by_course(&mut *tx, course_id).await?;
        let update = recompute_progress(&enrollment.completed_modules, &modules, Some(module_id))?;
        let updated = Self::store_progress(&mut tx, enrollment.id, &update).await?;

        tx.commit().await?;
        tracing::debug!(progress = updated.progress, completed = updated.completed, "progress updated");
        Ok(Some(updated))
    }

    /// Brings every enrollment of a course in line with its current modules.
    pub async fn recompute_for_course(
        conn: &mut PgConnection,
        course_id: Uuid,
    ) -> DatabaseResult<u64> {
        let modules = CourseModule::ids_by_course(&mut *conn, course_id).await?;
        let enrollments: Vec<Self> =
            sqlx::query_as("SELECT * FROM enrollments WHERE course_id = $1 FOR UPDATE")
                .bind(course_id)
                .fetch_all(&mut *conn)
                .await?;

        let mut touched = 0;
        for enrollment in enrollments {
            let update = recompute_progress(&enrollment.completed_modules, &modules, None)?;
            if update.progress != enrollment.progress
                || update.completed != enrollment.completed
                || update.completed_modules != enrollment.completed_modules
            {
                Self::store_progress(conn, enrollment.id, &update).await?;
                touched += 1;
            }
        }

        Ok(touched)
    }

    async fn store_progress(
        conn: &mut PgConnection,
        id: Uuid,
        update: &ProgressUpdate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            UPDATE enrollments
            SET completed_modules = $1,
                progress = $2,
                completed = $3,
                completed_at = CASE WHEN $3 THEN COALESCE(completed_at, now()) ELSE NULL END
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&update.completed_modules)
        .bind(update.progress)
        .bind(update.completed)
        .bind(id)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl HasOwner for Enrollment {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}
