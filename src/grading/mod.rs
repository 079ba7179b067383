//! Quiz evaluation and course progress computation.
//!
//! Both computations are pure: they only read the definitions handed to them
//! and return values. Loading quizzes and storing results is up to the caller.

mod assessment;
pub use assessment::{
    AnswerValue, QuestionOutcome, ScoreResult, ScoringPolicy, Submission, evaluate, validate_quiz,
};

mod error;
pub use error::{GradingError, GradingResult, ProgressError, QuizDefinitionError};

mod progress;
pub use progress::{ProgressUpdate, recompute_progress};

mod question;
pub use question::{Question, QuestionKind, QuizDefinition};
