use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use skillnest::Config;
use skillnest::error::AppResult;
use skillnest::grading::{self, Question, QuizDefinition, ScoringPolicy};
use skillnest::model::entity::{
    Course, CourseCreate, CourseLevel, CourseModule, CourseModuleCreate, Quiz, QuizCreate,
    UserEntity, UserEntityCreateUpdate,
};
use skillnest::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use skillnest::web::dto::quizzes::SubmissionPayload;
use skillnest::web::{AuthenticatedUser, UserRole};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the SkillNest DB and grading quizzes offline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage course modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage and grade quizzes
    Quiz {
        #[command(subcommand)]
        action: QuizCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        instructor: String,
        #[arg(long, default_value = "4 weeks")]
        duration: String,
        #[arg(long, value_enum, default_value_t = LevelArg::Beginner)]
        level: LevelArg,
    },
}

/// Module management
#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        /// Course title to attach the module to
        #[arg(long)]
        course_title: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Appended after the last module when omitted
        #[arg(long)]
        order_index: Option<i32>,
    },
}

/// Quiz management
#[derive(Subcommand, Debug)]
pub enum QuizCommands {
    /// Create a quiz from a JSON file
    Import {
        /// Course title to attach the quiz to
        #[arg(long)]
        course_title: String,
        file: PathBuf,
    },
    /// Grade an answers file against a quiz file without touching the database
    Grade {
        quiz: PathBuf,
        answers: PathBuf,
        /// Ignore negative marks of wrong answers
        #[arg(long, default_value_t = false)]
        no_negative_marking: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for UserRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => UserRole::Admin,
            RoleArg::User => UserRole::User,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelArg {
    Beginner,
    Intermediate,
    Advanced,
}

impl From<LevelArg> for CourseLevel {
    fn from(value: LevelArg) -> Self {
        match value {
            LevelArg::Beginner => CourseLevel::Beginner,
            LevelArg::Intermediate => CourseLevel::Intermediate,
            LevelArg::Advanced => CourseLevel::Advanced,
        }
    }
}

/// Quiz file layout, the same fields the HTTP API accepts minus the course id.
#[derive(Debug, Deserialize)]
struct QuizFile {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_duration")]
    duration_minutes: i32,
    passing_score: i16,
    questions: Vec<Question>,
}

fn default_duration() -> i32 {
    30
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn course_id_by_title(mm: &ModelManager, title: &str) -> AppResult<uuid::Uuid> {
    let id = sqlx::query_scalar("SELECT id FROM courses WHERE title = $1")
        .bind(title)
        .fetch_one(mm.executor())
        .await
        .map_err(DatabaseError::SqlxError)?;
    Ok(id)
}

async fn connect() -> AppResult<ModelManager> {
    let uri = match std::env::var("DATABASE_URL") {
        Ok(uri) => uri,
        Err(_) => Config::get_or_init(false).await.app().database_uri().to_string(),
    };

    let db_con = DbConnection::connect(&uri)?;
    Ok(ModelManager::new(db_con))
}

fn grade(quiz: &Path, answers: &Path, policy: ScoringPolicy) -> AppResult<()> {
    let quiz: QuizFile = read_json(quiz)?;
    let answers: SubmissionPayload = read_json(answers)?;

    let submission = match answers.into_submission() {
        Ok(submission) => submission,
        Err(details) => {
            eprintln!("invalid answers file: {details}");
            std::process::exit(2);
        }
    };

    let definition = QuizDefinition::new(&quiz.questions, quiz.passing_score);
    let result = grading::evaluate(&definition, &submission, policy)?;

    let rendered = serde_json::to_string_pretty(&result)?;
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                username,
                password,
                role,
            } => {
                let mm = connect().await?;
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        password_hash: skillnest::auth::hash_password(&password)?,
                        role: role.into(),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add {
                title,
                description,
                instructor,
                duration,
                level,
            } => {
                let mm = connect().await?;
                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        title,
                        description,
                        instructor,
                        duration,
                        level: level.into(),
                        rating: None,
                        thumbnail: None,
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Module { action } => match action {
            ModuleCommands::Add {
                course_title,
                title,
                description,
                order_index,
            } => {
                let mm = connect().await?;
                let course_id = course_id_by_title(&mm, &course_title).await?;

                let module = CourseModule::create(
                    &mm,
                    &actor,
                    CourseModuleCreate {
                        course_id,
                        title,
                        description,
                        materials: Vec::new(),
                        order_index,
                    },
                )
                .await?;
                println!("Module created: {:?}", module);
            }
        },

        Commands::Quiz { action } => match action {
            QuizCommands::Import { course_title, file } => {
                let quiz: QuizFile = read_json(&file)?;
                let create = QuizCreate {
                    course_id: uuid::Uuid::nil(),
                    title: quiz.title,
                    description: quiz.description,
                    duration_minutes: quiz.duration_minutes,
                    passing_score: quiz.passing_score,
                    questions: quiz.questions,
                };
                grading::validate_quiz(&create.definition()).map_err(grading::GradingError::from)?;

                let mm = connect().await?;
                let course_id = course_id_by_title(&mm, &course_title).await?;
                let quiz = Quiz::create(&mm, &actor, QuizCreate { course_id, ..create }).await?;
                println!("Quiz created: {} ({} questions)", quiz.id(), quiz.questions().len());
            }

            QuizCommands::Grade {
                quiz,
                answers,
                no_negative_marking,
            } => {
                let policy = ScoringPolicy {
                    negative_marking: !no_negative_marking,
                };
                grade(&quiz, &answers, policy)?;
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_level_is_rejected() {
        let args = Cli::try_parse_from([
            "skillnest-cli", "course", "add", "--title", "Rust", "--description", "d",
            "--instructor", "i", "--level", "expert",
        ]);
        assert!(args.is_err());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let args = Cli::try_parse_from([
            "skillnest-cli", "user", "add", "--username", "u", "--password", "p", "--role",
            "owner",
        ]);
        assert!(args.is_err());
    }

    #[test]
    fn known_values_are_parsed() {
        let args = Cli::try_parse_from([
            "skillnest-cli", "user", "add", "--username", "u", "--password", "p", "--role",
            "admin",
        ])
        .unwrap();

        match args.command {
            Commands::User {
                action: UserCommands::Add { role, .. },
            } => assert_eq!(UserRole::from(role), UserRole::Admin),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn malformed_json_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = read_json::<QuizFile>(&path);
        assert!(matches!(result, Err(skillnest::error::AppError::JsonError(_))));
    }
}
