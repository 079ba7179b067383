use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    grading::{AnswerValue, Question, ScoreResult, Submission},
    model::entity::{Quiz, QuizAttempt},
};

/// Quiz as shown over HTTP. Answer keys are stripped unless `reveal` is set.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuizResponse {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: String,
    duration_minutes: i32,
    passing_score: i16,
    questions: Vec<Question>,
    created_at: DateTime<Utc>,
}

impl QuizResponse {
    pub fn from_entity(quiz: &Quiz, reveal: bool) -> Self {
        let questions = if reveal {
            quiz.questions().to_vec()
        } else {
            quiz.questions().iter().map(Question::redacted).collect()
        };

        Self {
            id: quiz.id(),
            course_id: quiz.course_id(),
            title: quiz.title().to_string(),
            description: quiz.description().to_string(),
            duration_minutes: quiz.duration_minutes(),
            passing_score: quiz.passing_score(),
            questions,
            created_at: *quiz.created_at(),
        }
    }
}

/// Answers by question position, either `{"0": 2, "3": true}` or `[2, null, null, true]`.
///
/// `null` marks a skipped question in both shapes.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum SubmissionPayload {
    #[schema(value_type = BTreeMap<String, AnswerValue>)]
    Keyed(BTreeMap<String, Option<AnswerValue>>),
    Positional(Vec<Option<AnswerValue>>),
}

impl SubmissionPayload {
    pub fn into_submission(self) -> Result<Submission, String> {
        match self {
            Self::Positional(answers) => Ok(answers
                .into_iter()
                .enumerate()
                .filter_map(|(position, answer)| answer.map(|answer| (position, answer)))
                .collect()),
            Self::Keyed(answers) => {
                let mut submission = Submission::new();
                for (key, answer) in answers {
                    let position = key
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| format!("answer key `{key}` is not a question position"))?;
                    if let Some(answer) = answer {
                        submission.insert(position, answer);
                    }
                }
                Ok(submission)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    pub answers: SubmissionPayload,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    pub attempt: QuizAttempt,
    #[serde(flatten)]
    pub result: ScoreResult,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grading::QuestionKind;
    use serde_json::json;

    #[test]
    fn keyed_payload_skips_nulls() {
        let request: SubmitRequest =
            serde_json::from_value(json!({"answers": {"0": 2, "1": true, "2": null, "4": "text"}}))
                .unwrap();
        let submission = request.answers.into_submission().unwrap();

        assert_eq!(submission.len(), 3);
        assert_eq!(submission[&0], AnswerValue::Index(2));
        assert_eq!(submission[&1], AnswerValue::Boolean(true));
        assert!(!submission.contains_key(&2));
        assert_eq!(submission[&4], AnswerValue::Text(String::from("text")));
    }

    #[test]
    fn positional_payload() {
        let request: SubmitRequest =
            serde_json::from_value(json!({"answers": [1, null, false, -3]})).unwrap();
        let submission = request.answers.into_submission().unwrap();

        assert_eq!(submission.len(), 3);
        assert_eq!(submission[&0], AnswerValue::Index(1));
        assert_eq!(submission[&2], AnswerValue::Boolean(false));
        assert!(matches!(submission[&3], AnswerValue::Unrecognized(_)));
    }

    #[test]
    fn non_numeric_keys_are_rejected() {
        let request: SubmitRequest =
            serde_json::from_value(json!({"answers": {"first": 1}})).unwrap();
        assert!(request.answers.into_submission().is_err());
    }

    #[test]
    fn learners_do_not_see_answer_keys() {
        let quiz: Quiz = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "course_id": Uuid::nil(),
            "title": "Basics",
            "description": "",
            "duration_minutes": 10,
            "passing_score": 50,
            "questions": [
                {"type": "mcq", "prompt": "2 + 2", "options": ["3", "4"], "correct_answer": 1},
                {"type": "true-false", "prompt": "rust is fast", "correct_answer": true}
            ],
            "created_at": "2025-06-01T00:00:00Z"
        }))
        .unwrap();

        let hidden = QuizResponse::from_entity(&quiz, false);
        assert!(hidden.questions.iter().all(|q| match &q.kind {
            QuestionKind::MultipleChoice { correct_answer, .. } => correct_answer.is_none(),
            QuestionKind::TrueFalse { correct_answer } => correct_answer.is_none(),
            QuestionKind::ShortAnswer => true,
        }));

        let shown = QuizResponse::from_entity(&quiz, true);
        assert_eq!(shown.questions, quiz.questions());
    }
}
