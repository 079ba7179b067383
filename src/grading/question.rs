use serde::{Deserialize, Serialize};

/// Borrowed view of a stored quiz, as much as grading needs.
#[derive(Debug, Clone, Copy)]
pub struct QuizDefinition<'a> {
    pub questions: &'a [Question],
    pub passing_score: i16,
}

impl<'a> QuizDefinition<'a> {
    pub fn new(questions: &'a [Question], passing_score: i16) -> Self {
        Self {
            questions,
            passing_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Question {
    /// Text shown to the learner
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// Penalty for a wrong objective answer, skipped questions are never penalized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_marks: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    #[serde(alias = "mcq")]
    MultipleChoice {
        #[serde(default)]
        options: Vec<String>,
        /// Index into `options`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correct_answer: Option<usize>,
    },
    TrueFalse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correct_answer: Option<bool>,
    },
    /// Graded manually, accepted provisionally.
    ShortAnswer,
}

impl Question {
    pub fn is_objective(&self) -> bool {
        !matches!(self.kind, QuestionKind::ShortAnswer)
    }

    /// Copy of the question without the correct answer, safe to hand to learners.
    pub fn redacted(&self) -> Self {
        let kind = match &self.kind {
            QuestionKind::MultipleChoice { options, .. } => QuestionKind::MultipleChoice {
                options: options.clone(),
                correct_answer: None,
            },
            QuestionKind::TrueFalse { .. } => QuestionKind::TrueFalse {
                correct_answer: None,
            },
            QuestionKind::ShortAnswer => QuestionKind::ShortAnswer,
        };

        Self {
            prompt: self.prompt.clone(),
            kind,
            negative_marks: self.negative_marks,
        }
    }
}
