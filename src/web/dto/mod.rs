pub mod courses;
pub mod discussions;
pub mod quizzes;
