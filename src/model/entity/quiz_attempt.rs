use crate::grading::ScoreResult;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Stored outcome of one graded submission. Per-question outcomes are not kept.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAttempt {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    score: i32,
    passed: bool,
    correct_count: i32,
    incorrect_count: i32,
    total_negative_marks: f64,
    total_questions: i32,
    submitted_at: DateTime<Utc>,
}

impl ResourceTyped for QuizAttempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizAttempt
    }
}

impl QuizAttempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn passed(&self) -> bool {
        self.passed
    }
}

impl QuizAttempt {
    pub async fn record(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        quiz_id: Uuid,
        result: &ScoreResult,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_attempts
                (id, user_id, quiz_id, score, passed, correct_count, incorrect_count,
                 total_negative_marks, total_questions)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(quiz_id)
        .bind(result.score as i32)
        .bind(result.passed)
        .bind(result.correct_count as i32)
        .bind(result.incorrect_count as i32)
        .bind(result.total_negative_marks)
        .bind(result.total_questions as i32)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn find_all_by_user_and_quiz(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT *
            FROM quiz_attempts
            WHERE user_id = $1 AND quiz_id = $2
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(actor.user_id())
        .bind(quiz_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl HasOwner for QuizAttempt {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}
