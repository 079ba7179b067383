use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{GradingResult, QuizDefinitionError};
use super::question::{Question, QuestionKind, QuizDefinition};

/// Learner answers keyed by question position. A missing position is a skipped question.
pub type Submission = BTreeMap<usize, AnswerValue>;

/// A single supplied answer.
///
/// Values which fit none of the question contracts are kept as `Unrecognized`
/// and graded as a wrong answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Boolean(bool),
    Index(u64),
    Text(String),
    Unrecognized(serde_json::Value),
}

impl AnswerValue {
    /// Option index of a multiple-choice answer. Integral floats such as `1.0`
    /// are accepted, negative or fractional numbers are not.
    pub fn as_index(&self) -> Option<u64> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Unrecognized(serde_json::Value::Number(number)) => {
                let value = number.as_f64()?;
                let integral = value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64;
                integral.then_some(value as u64)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPolicy {
    /// Subtract `negative_marks` of wrongly answered objective questions.
    pub negative_marking: bool,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            negative_marking: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionOutcome {
    Correct,
    Incorrect,
    Skipped,
    /// Short answers count as correct until reviewed by hand.
    PendingReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScoreResult {
    /// Rounded percentage, 0..=100
    pub score: u32,
    pub passed: bool,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub total_negative_marks: f64,
    pub total_questions: u32,
    /// Outcome per question, in quiz order
    pub outcomes: Vec<QuestionOutcome>,
}

pub fn validate_quiz(quiz: &QuizDefinition<'_>) -> Result<(), QuizDefinitionError> {
    if quiz.questions.is_empty() {
        return Err(QuizDefinitionError::NoQuestions);
    }

    if !(0..=100).contains(&quiz.passing_score) {
        return Err(QuizDefinitionError::PassingScoreOutOfRange(quiz.passing_score));
    }

    for (index, question) in quiz.questions.iter().enumerate() {
        if let Some(marks) = question.negative_marks {
            if !marks.is_finite() || marks < 0.0 {
                return Err(QuizDefinitionError::InvalidNegativeMarks { index });
            }
        }

        match &question.kind {
            QuestionKind::MultipleChoice {
                options,
                correct_answer,
            } => {
                if options.is_empty() {
                    return Err(QuizDefinitionError::MissingOptions { index });
                }
                let answer =
                    correct_answer.ok_or(QuizDefinitionError::MissingCorrectAnswer { index })?;
                if answer >= options.len() {
                    return Err(QuizDefinitionError::CorrectAnswerOutOfRange {
                        index,
                        answer,
                        options: options.len(),
                    });
                }
            }
            QuestionKind::TrueFalse { correct_answer } => {
                if correct_answer.is_none() {
                    return Err(QuizDefinitionError::MissingCorrectAnswer { index });
                }
            }
            QuestionKind::ShortAnswer => {}
        }
    }

    Ok(())
}

/// Grades `submission` against `quiz`.
///
/// Every question is worth `100 / total_questions` marks. Penalties of wrong
/// objective answers are subtracted when `policy.negative_marking` is set and
/// the result is clamped at zero before rounding half up to an integer.
/// Submission entries past the last question are ignored.
pub fn evaluate(
    quiz: &QuizDefinition<'_>,
    submission: &Submission,
    policy: ScoringPolicy,
) -> GradingResult<ScoreResult> {
    validate_quiz(quiz)?;

    let mut correct_count = 0u32;
    let mut incorrect_count = 0u32;
    let mut total_negative_marks = 0.0f64;
    let mut outcomes = Vec::with_capacity(quiz.questions.len());

    for (position, question) in quiz.questions.iter().enumerate() {
        let outcome = grade_question(question, submission.get(&position));
        match outcome {
            QuestionOutcome::Correct | QuestionOutcome::PendingReview => correct_count += 1,
            QuestionOutcome::Incorrect => {
                incorrect_count += 1;
                if policy.negative_marking {
                    total_negative_marks += question.negative_marks.unwrap_or(0.0);
                }
            }
            QuestionOutcome::Skipped => {}
        }
        outcomes.push(outcome);
    }

    let total_questions = quiz.questions.len() as u32;
    let marks_per_question = 100.0 / f64::from(total_questions);
    let positive_score = f64::from(correct_count) * marks_per_question;
    let final_score = (positive_score - total_negative_marks).max(0.0);
    // non-negative here, so `round` (half away from zero) is half up
    let score = final_score.round() as u32;

    Ok(ScoreResult {
        score,
        passed: score as i64 >= i64::from(quiz.passing_score),
        correct_count,
        incorrect_count,
        total_negative_marks,
        total_questions,
        outcomes,
    })
}

fn grade_question(question: &Question, answer: Option<&AnswerValue>) -> QuestionOutcome {
    if !question.is_objective() {
        return QuestionOutcome::PendingReview;
    }

    let Some(answer) = answer else {
        return QuestionOutcome::Skipped;
    };

    let matches = match &question.kind {
        QuestionKind::MultipleChoice {
            correct_answer: Some(expected),
            ..
        } => answer.as_index() == Some(*expected as u64),
        QuestionKind::TrueFalse {
            correct_answer: Some(expected),
        } => *answer == AnswerValue::Boolean(*expected),
        _ => false,
    };

    if matches {
        QuestionOutcome::Correct
    } else {
        QuestionOutcome::Incorrect
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grading::GradingError;
    use serde_json::json;

    fn mcq(correct: usize, negative_marks: Option<f64>) -> Question {
        Question {
            prompt: String::from("pick one"),
            kind: QuestionKind::MultipleChoice {
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: Some(correct),
            },
            negative_marks,
        }
    }

    fn true_false(correct: bool) -> Question {
        Question {
            prompt: String::from("true or false"),
            kind: QuestionKind::TrueFalse {
                correct_answer: Some(correct),
            },
            negative_marks: None,
        }
    }

    fn short_answer() -> Question {
        Question {
            prompt: String::from("explain"),
            kind: QuestionKind::ShortAnswer,
            negative_marks: None,
        }
    }

    fn all_correct(questions: &[Question]) -> Submission {
        questions
            .iter()
            .enumerate()
            .filter_map(|(i, q)| match q.kind {
                QuestionKind::MultipleChoice {
                    correct_answer: Some(c),
                    ..
                } => Some((i, AnswerValue::Index(c as u64))),
                QuestionKind::TrueFalse {
                    correct_answer: Some(c),
                } => Some((i, AnswerValue::Boolean(c))),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ten_questions_with_penalty_and_skip() {
        let mut questions: Vec<Question> = (0..10).map(|_| mcq(2, Some(5.0))).collect();
        questions[9] = mcq(2, None);

        let mut submission = Submission::new();
        for i in 0..8 {
            submission.insert(i, AnswerValue::Index(2));
        }
        submission.insert(8, AnswerValue::Index(0)); // wrong
        // question 9 skipped

        let quiz = QuizDefinition::new(&questions, 70);
        let result = evaluate(&quiz, &submission, ScoringPolicy::default()).unwrap();

        assert_eq!(result.correct_count, 8);
        assert_eq!(result.incorrect_count, 1);
        assert_eq!(result.total_negative_marks, 5.0);
        assert_eq!(result.total_questions, 10);
        assert_eq!(result.score, 75);
        assert!(result.passed);
        assert_eq!(result.outcomes[8], QuestionOutcome::Incorrect);
        assert_eq!(result.outcomes[9], QuestionOutcome::Skipped);
    }

    #[test]
    fn penalty_ignored_without_negative_marking() {
        let questions: Vec<Question> = (0..10).map(|_| mcq(2, Some(5.0))).collect();
        let mut submission = Submission::new();
        for i in 0..8 {
            submission.insert(i, AnswerValue::Index(2));
        }
        submission.insert(8, AnswerValue::Index(0));

        let quiz = QuizDefinition::new(&questions, 70);
        let policy = ScoringPolicy {
            negative_marking: false,
        };
        let result = evaluate(&quiz, &submission, policy).unwrap();

        assert_eq!(result.incorrect_count, 1);
        assert_eq!(result.total_negative_marks, 0.0);
        assert_eq!(result.score, 80);
    }

    #[test]
    fn all_correct_scores_hundred() {
        for n in 1..=60usize {
            let questions: Vec<Question> = (0..n)
                .map(|i| match i % 3 {
                    0 => mcq(i % 4, None),
                    1 => true_false(i % 2 == 0),
                    _ => short_answer(),
                })
                .collect();
            let submission = all_correct(&questions);
            let quiz = QuizDefinition::new(&questions, 100);

            let result = evaluate(&quiz, &submission, ScoringPolicy::default()).unwrap();
            assert_eq!(result.score, 100, "{n} questions");
            assert!(result.passed);
            assert_eq!(result.correct_count as usize, n);
        }
    }

    #[test]
    fn all_skipped_scores_zero() {
        let questions = vec![mcq(0, Some(10.0)), true_false(true), mcq(3, None)];
        let quiz = QuizDefinition::new(&questions, 0);

        let result = evaluate(&quiz, &Submission::new(), ScoringPolicy::default()).unwrap();
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.incorrect_count, 0);
        assert_eq!(result.total_negative_marks, 0.0);
        assert_eq!(result.score, 0);
        // passing score of zero is reached by anybody
        assert!(result.passed);
        assert!(result.outcomes.iter().all(|o| *o == QuestionOutcome::Skipped));
    }

    #[test]
    fn short_answers_are_provisionally_accepted() {
        let questions = vec![short_answer(), mcq(1, None)];
        let quiz = QuizDefinition::new(&questions, 50);

        let result = evaluate(&quiz, &Submission::new(), ScoringPolicy::default()).unwrap();
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.score, 50);
        assert!(result.passed);
        assert_eq!(result.outcomes[0], QuestionOutcome::PendingReview);
    }

    #[test]
    fn negative_marking_never_below_zero() {
        for penalty in [0.5, 1.0, 12.5, 33.0, 100.0, 1000.0] {
            for wrong in 1..=4usize {
                let questions: Vec<Question> = (0..4).map(|_| mcq(1, Some(penalty))).collect();
                let mut submission = Submission::new();
                for i in 0..4 {
                    let answer = if i < wrong { 0 } else { 1 };
                    submission.insert(i, AnswerValue::Index(answer));
                }

                let quiz = QuizDefinition::new(&questions, 50);
                let result = evaluate(&quiz, &submission, ScoringPolicy::default()).unwrap();

                let expected = (25.0 * (4 - wrong) as f64 - penalty * wrong as f64).max(0.0);
                assert_eq!(result.score, expected.round() as u32);
                assert!(result.score <= 100);
            }
        }
    }

    #[test]
    fn rounds_half_up() {
        // 100 / 8 = 12.5 per question
        let questions: Vec<Question> = (0..8).map(|_| true_false(true)).collect();
        let quiz = QuizDefinition::new(&questions, 13);

        let mut submission = Submission::new();
        submission.insert(0, AnswerValue::Boolean(true));
        let result = evaluate(&quiz, &submission, ScoringPolicy::default()).unwrap();
        assert_eq!(result.score, 13);
        assert!(result.passed);

        submission.insert(1, AnswerValue::Boolean(true));
        submission.insert(2, AnswerValue::Boolean(true));
        let result = evaluate(&quiz, &submission, ScoringPolicy::default()).unwrap();
        assert_eq!(result.score, 38);
    }

    #[test]
    fn two_of_three_rounds_to_sixty_seven() {
        let questions = vec![true_false(true), true_false(false), true_false(true)];
        let submission = Submission::from([
            (0, AnswerValue::Boolean(true)),
            (1, AnswerValue::Boolean(false)),
        ]);
        let quiz = QuizDefinition::new(&questions, 70);

        let result = evaluate(&quiz, &submission, ScoringPolicy::default()).unwrap();
        assert_eq!(result.score, 67);
        assert!(!result.passed);
    }

    #[test]
    fn malformed_answers_count_as_wrong() {
        let questions = vec![
            mcq(1, Some(1.0)),
            true_false(true),
            mcq(0, None),
            true_false(false),
        ];
        let submission: Submission = serde_json::from_value(json!({
            "0": "1",
            "1": 1,
            "2": -1,
            "3": { "answer": false },
        }))
        .unwrap();
        assert_eq!(submission[&2], AnswerValue::Unrecognized(json!(-1)));

        let quiz = QuizDefinition::new(&questions, 50);
        let result = evaluate(&quiz, &submission, ScoringPolicy::default()).unwrap();
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.incorrect_count, 4);
        assert_eq!(result.total_negative_marks, 1.0);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn integral_float_index_is_accepted() {
        let questions = vec![mcq(1, Some(2.0)), mcq(2, Some(2.0)), mcq(0, None)];
        let submission: Submission =
            serde_json::from_value(json!({ "0": 1.0, "1": 2.5, "2": 0.0 })).unwrap();

        let quiz = QuizDefinition::new(&questions, 50);
        let result = evaluate(&quiz, &submission, ScoringPolicy::default()).unwrap();
        assert_eq!(
            result.outcomes,
            [
                QuestionOutcome::Correct,
                QuestionOutcome::Incorrect,
                QuestionOutcome::Correct,
            ]
        );
        assert_eq!(result.total_negative_marks, 2.0);
        // two of three, minus the penalty
        assert_eq!(result.score, 65);
    }

    #[test]
    fn entries_past_the_end_are_ignored() {
        let questions = vec![true_false(true)];
        let submission = Submission::from([
            (0, AnswerValue::Boolean(true)),
            (5, AnswerValue::Boolean(false)),
        ]);
        let quiz = QuizDefinition::new(&questions, 100);

        let result = evaluate(&quiz, &submission, ScoringPolicy::default()).unwrap();
        assert_eq!(result.incorrect_count, 0);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let quiz = QuizDefinition::new(&[], 50);
        let result = evaluate(&quiz, &Submission::new(), ScoringPolicy::default());
        assert_eq!(
            result,
            Err(GradingError::InvalidQuizDefinition(
                QuizDefinitionError::NoQuestions
            ))
        );
    }

    #[test]
    fn broken_definitions_are_rejected() {
        let no_options = Question {
            prompt: String::new(),
            kind: QuestionKind::MultipleChoice {
                options: vec![],
                correct_answer: Some(0),
            },
            negative_marks: None,
        };
        assert_eq!(
            validate_quiz(&QuizDefinition::new(&[no_options], 50)),
            Err(QuizDefinitionError::MissingOptions { index: 0 })
        );

        let out_of_range = vec![true_false(true), mcq(4, None)];
        assert_eq!(
            validate_quiz(&QuizDefinition::new(&out_of_range, 50)),
            Err(QuizDefinitionError::CorrectAnswerOutOfRange {
                index: 1,
                answer: 4,
                options: 4
            })
        );

        let no_answer = Question {
            prompt: String::new(),
            kind: QuestionKind::TrueFalse {
                correct_answer: None,
            },
            negative_marks: None,
        };
        assert_eq!(
            validate_quiz(&QuizDefinition::new(&[no_answer], 50)),
            Err(QuizDefinitionError::MissingCorrectAnswer { index: 0 })
        );

        assert_eq!(
            validate_quiz(&QuizDefinition::new(&[mcq(0, Some(-1.0))], 50)),
            Err(QuizDefinitionError::InvalidNegativeMarks { index: 0 })
        );
        assert_eq!(
            validate_quiz(&QuizDefinition::new(&[mcq(0, Some(f64::NAN))], 50)),
            Err(QuizDefinitionError::InvalidNegativeMarks { index: 0 })
        );
        assert_eq!(
            validate_quiz(&QuizDefinition::new(&[mcq(0, None)], 101)),
            Err(QuizDefinitionError::PassingScoreOutOfRange(101))
        );
    }
}
