use thiserror::Error;
use uuid::Uuid;

pub type GradingResult<T> = std::result::Result<T, GradingError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuizDefinitionError {
    #[error("no questions to grade")]
    NoQuestions,
    #[error("passing score {0} is outside of 0..=100")]
    PassingScoreOutOfRange(i16),
    #[error("question {index}: multiple-choice question has no options")]
    MissingOptions { index: usize },
    #[error("question {index}: correct answer is missing")]
    MissingCorrectAnswer { index: usize },
    #[error("question {index}: correct answer {answer} is out of {options} options")]
    CorrectAnswerOutOfRange {
        index: usize,
        answer: usize,
        options: usize,
    },
    #[error("question {index}: negative marks must be a non-negative number")]
    InvalidNegativeMarks { index: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GradingError {
    #[error("invalid quiz definition: {0}")]
    InvalidQuizDefinition(#[from] QuizDefinitionError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("module {0} does not belong to the course")]
    UnknownModule(Uuid),
}
