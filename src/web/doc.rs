use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT session token of the current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "SkillNest API"),
    paths(
        crate::web::routes::health_handler,
        crate::web::routes::user::user_signup_handler,
        crate::web::routes::user::user_signin_handler,
        crate::web::routes::user::user_signout_handler,
        crate::web::routes::user::user_verify_handler,
        crate::web::routes::user::user_me_handler,
        crate::web::routes::user::user_enrollments_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::user::user_update_handler,
        crate::web::routes::user::user_delete_handler,
        crate::web::routes::courses::courses_list_handler,
        crate::web::routes::courses::courses_get_handler,
        crate::web::routes::courses::courses_create_handler,
        crate::web::routes::courses::courses_update_handler,
        crate::web::routes::courses::courses_delete_handler,
        crate::web::routes::courses::courses_module_add_handler,
        crate::web::routes::courses::courses_module_delete_handler,
        crate::web::routes::courses::courses_enroll_handler,
        crate::web::routes::courses::courses_progress_handler,
        crate::web::routes::quizzes::quizzes_list_handler,
        crate::web::routes::quizzes::quizzes_by_course_handler,
        crate::web::routes::quizzes::quizzes_get_handler,
        crate::web::routes::quizzes::quizzes_create_handler,
        crate::web::routes::quizzes::quizzes_update_handler,
        crate::web::routes::quizzes::quizzes_delete_handler,
        crate::web::routes::quizzes::quizzes_submit_handler,
        crate::web::routes::quizzes::quizzes_attempts_handler,
        crate::web::routes::discussions::discussions_by_course_handler,
        crate::web::routes::discussions::discussions_create_handler,
        crate::web::routes::discussions::discussions_like_handler,
        crate::web::routes::discussions::discussions_delete_handler,
        crate::web::routes::discussions::discussions_comment_add_handler,
        crate::web::routes::discussions::discussions_comment_delete_handler,
        crate::web::routes::analytics::analytics_dashboard_handler,
        crate::web::routes::analytics::analytics_course_handler,
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;
