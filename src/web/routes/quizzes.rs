use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    grading::{self, GradingError},
    model::{
        CrudRepository, ResourceTyped,
        entity::{Course, Quiz, QuizAttempt, QuizCreate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::quizzes::{QuizResponse, SubmitRequest, SubmitResponse},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(quizzes_list_handler).post(quizzes_create_handler))
        .route("/course/{course_id}", get(quizzes_by_course_handler))
        .route(
            "/{id}",
            get(quizzes_get_handler)
                .put(quizzes_update_handler)
                .delete(quizzes_delete_handler),
        )
        .route("/{id}/submit", post(quizzes_submit_handler))
        .route("/{id}/attempts", get(quizzes_attempts_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_quiz(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Quiz> {
    Quiz::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Quiz::get_resource_type()))
}

/// Quizzes are checked by the evaluator's rules before they are stored.
async fn validate_quiz(state: &AppState, actor: &AuthenticatedUser, body: &QuizCreate) -> WebResult<()> {
    grading::validate_quiz(&body.definition()).map_err(GradingError::from)?;

    if body.duration_minutes <= 0 {
        return Err(WebError::resource_bad_request(
            Quiz::get_resource_type(),
            "duration_minutes must be positive",
        ));
    }

    Course::find_by_id(state.pool(), actor, body.course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/",
    description = "All quizzes, answer keys are visible to admins only",
    responses(
        (status = 200, description = "Quizzes collected", body = Vec<QuizResponse>),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "quizzes"
)]
async fn quizzes_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let quizzes = Quiz::all(state.pool(), &AuthenticatedUser::admin())
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    let reveal = ctx.sees_answers();
    let res: Vec<QuizResponse> = quizzes
        .iter()
        .map(|quiz| QuizResponse::from_entity(quiz, reveal))
        .collect();

    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/course/{course_id}",
    description = "Quizzes of one course, answer keys are visible to admins only",
    responses(
        (status = 200, description = "Quizzes collected", body = Vec<QuizResponse>),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "quizzes"
)]
async fn quizzes_by_course_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let quizzes = Quiz::find_all_by_course(state.pool(), &AuthenticatedUser::admin(), course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    let reveal = ctx.sees_answers();
    let res: Vec<QuizResponse> = quizzes
        .iter()
        .map(|quiz| QuizResponse::from_entity(quiz, reveal))
        .collect();

    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{id}",
    responses(
        (status = 200, description = "Quiz found", body = QuizResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "quizzes"
)]
async fn quizzes_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let quiz = find_quiz(&state, &AuthenticatedUser::admin(), id).await?;

    Ok((StatusCode::OK, Json(QuizResponse::from_entity(&quiz, ctx.sees_answers()))))
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/",
    request_body = QuizCreate,
    responses(
        (status = 200, description = "Quiz created", body = QuizResponse),
        (status = 400, description = "Invalid quiz fields", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 422, description = "Questions cannot be graded", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
async fn quizzes_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(body): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(Quiz::get_resource_type())?;
    validate_quiz(&state, user, &body).await?;

    let quiz = Quiz::create(state.pool(), user, body)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(QuizResponse::from_entity(&quiz, true))))
}

#[utoipa::path(
    put,
    path = "/api/v1/quizzes/{id}",
    request_body = QuizCreate,
    responses(
        (status = 200, description = "Quiz updated", body = QuizResponse),
        (status = 400, description = "Invalid quiz fields", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Quiz or course not found", body = ErrorResponse),
        (status = 422, description = "Questions cannot be graded", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
async fn quizzes_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(Quiz::get_resource_type())?;
    let quiz = find_quiz(&state, user, id).await?;
    validate_quiz(&state, user, &body).await?;

    let updated = quiz
        .update(state.pool(), user, body)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(QuizResponse::from_entity(&updated, true))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quizzes/{id}",
    responses(
        (status = 200, description = "Quiz deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
async fn quizzes_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(Quiz::get_resource_type())?;
    let quiz = find_quiz(&state, user, id).await?;

    quiz.delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{id}/submit",
    description = "Grades the submitted answers and records the attempt. Answers are keyed by question position, `null` or a missing position means skipped",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Submission graded", body = SubmitResponse),
        (status = 400, description = "Answers are not keyed by position", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 422, description = "Stored quiz cannot be graded", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
async fn quizzes_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SubmitRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = find_quiz(&state, user, id).await?;

    let submission = body
        .answers
        .into_submission()
        .map_err(|details| WebError::resource_bad_request(QuizAttempt::get_resource_type(), details))?;

    let result = grading::evaluate(&quiz.definition(), &submission, state.scoring_policy())?;

    let attempt = QuizAttempt::record(state.pool(), user, quiz.id(), &result)
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizAttempt::get_resource_type(), e))?;

    tracing::info!(
        user_id = %user.user_id(),
        quiz_id = %quiz.id(),
        score = result.score,
        passed = result.passed,
        "quiz submitted"
    );

    Ok((StatusCode::OK, Json(SubmitResponse { attempt, result })))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{id}/attempts",
    description = "Previous attempts of the signed in user, newest first",
    responses(
        (status = 200, description = "Attempts collected", body = Vec<QuizAttempt>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
async fn quizzes_attempts_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = find_quiz(&state, user, id).await?;

    let attempts = QuizAttempt::find_all_by_user_and_quiz(state.pool(), user, quiz.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizAttempt::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(attempts)))
}
