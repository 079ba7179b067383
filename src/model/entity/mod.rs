mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod course;
pub use course::{Course, CourseCreate, CourseLevel};

mod course_module;
pub use course_module::{CourseModule, CourseModuleCreate, Material, MaterialKind};

mod enrollment;
pub use enrollment::{Enrollment, EnrollmentWithCourseRow};

mod quiz;
pub use quiz::{Quiz, QuizCreate};

mod quiz_attempt;
pub use quiz_attempt::QuizAttempt;

mod discussion;
pub use discussion::{Discussion, DiscussionCreate};

mod comment;
pub use comment::{Comment, CommentCreate};

mod analytics;
pub use analytics::{CourseAnalytics, DashboardAnalytics, MonthlyEngagement, TopCourse};
