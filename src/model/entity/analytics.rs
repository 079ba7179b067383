use crate::model::entity::Course;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct MonthlyEngagement {
    /// Abbreviated month name, e.g. `Jan`
    pub month: String,
    pub enrollments: i64,
    pub completions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TopCourse {
    pub id: Uuid,
    pub title: String,
    pub enrollments: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DashboardAnalytics {
    pub total_users: i64,
    pub total_courses: i64,
    pub active_quizzes: i64,
    pub total_enrollments: i64,
    /// Oldest month first, the current month last
    pub monthly_engagement: Vec<MonthlyEngagement>,
    pub top_courses: Vec<TopCourse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseAnalytics {
    pub course_title: String,
    pub enrollment_count: i64,
    pub average_progress: i64,
    pub completed_count: i64,
}

const ENGAGEMENT_MONTHS: i32 = 6;
const TOP_COURSES: i64 = 3;

impl DashboardAnalytics {
    pub async fn collect(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<Self> {
        let (total_users, total_courses, active_quizzes, total_enrollments) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM courses),
                (SELECT COUNT(*) FROM quizzes),
                (SELECT COUNT(*) FROM enrollments)
                "#,
            )
            .fetch_one(mm.executor())
            .await?;

        let (monthly_engagement, top) = tokio::try_join!(
            Self::engagement(mm),
            Course::top_by_enrollment(mm, actor, TOP_COURSES),
        )?;

        let top_courses = top
            .into_iter()
            .map(|course| TopCourse {
                id: course.id(),
                title: course.title().to_string(),
                enrollments: course.enrolled_count(),
            })
            .collect();

        Ok(Self {
            total_users,
            total_courses,
            active_quizzes,
            total_enrollments,
            monthly_engagement,
            top_courses,
        })
    }

    /// Enrollments and completions per calendar month, months without activity included.
    async fn engagement(mm: &ModelManager) -> DatabaseResult<Vec<MonthlyEngagement>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
            to_char(m.month, 'Mon') AS month,
            (SELECT COUNT(*) FROM enrollments e
                WHERE date_trunc('month', e.enrolled_at) = m.month) AS enrollments,
            (SELECT COUNT(*) FROM enrollments e
                WHERE e.completed_at IS NOT NULL
                AND date_trunc('month', e.completed_at) = m.month) AS completions
            FROM generate_series(
                date_trunc('month', now()) - make_interval(months => $1 - 1),
                date_trunc('month', now()),
                interval '1 month'
            ) AS m(month)
            ORDER BY m.month
            "#,
        )
        .bind(ENGAGEMENT_MONTHS)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

impl CourseAnalytics {
    pub async fn collect(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course: &Course,
    ) -> DatabaseResult<Self> {
        let (enrollment_count, average_progress, completed_count) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT
                COUNT(*),
                COALESCE(ROUND(AVG(progress)), 0)::BIGINT,
                COUNT(*) FILTER (WHERE completed)
                FROM enrollments
                WHERE course_id = $1
                "#,
            )
            .bind(course.id())
            .fetch_one(mm.executor())
            .await?;

        Ok(Self {
            course_title: course.title().to_string(),
            enrollment_count,
            average_progress,
            completed_count,
        })
    }
}
