use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{Course, CourseCreate, CourseModule, Enrollment},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::courses::{CourseCreateBody, CourseWithModules, ModuleBody, ProgressBody, validate_course},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler).post(courses_create_handler))
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route("/{id}/modules", post(courses_module_add_handler))
        .route("/{id}/modules/{module_id}", delete(courses_module_delete_handler))
        .route("/{id}/enroll", post(courses_enroll_handler))
        .route("/{id}/progress", post(courses_progress_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_course(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    Course::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/",
    description = "Course catalog, newest first",
    responses(
        (status = 200, description = "Courses collected", body = Vec<Course>),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "courses"
)]
async fn courses_list_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let courses = Course::all(state.pool(), &AuthenticatedUser::admin())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    description = "Course with its modules in order",
    responses(
        (status = 200, description = "Course found", body = CourseWithModules),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "courses"
)]
async fn courses_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let actor = AuthenticatedUser::admin();
    let course = find_course(&state, &actor, id).await?;

    let modules = CourseModule::find_all_by_course(state.pool(), &actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseModule::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(CourseWithModules { course, modules })))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/",
    description = "Creates a course, optionally together with its modules",
    request_body = CourseCreateBody,
    responses(
        (status = 200, description = "Course created", body = CourseWithModules),
        (status = 400, description = "Invalid course fields", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(body): Json<CourseCreateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(Course::get_resource_type())?;
    body.validate()
        .map_err(|details| WebError::resource_bad_request(Course::get_resource_type(), details))?;

    let course = Course::create(state.pool(), user, body.course)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let mut modules = Vec::with_capacity(body.modules.len());
    for (position, module) in body.modules.into_iter().enumerate() {
        let mut create = module.into_create(course.id());
        create.order_index.get_or_insert(position as i32);

        let created = CourseModule::create(state.pool(), user, create)
            .await
            .map_err(|e| WebError::resource_fetch_error(CourseModule::get_resource_type(), e))?;
        modules.push(created);
    }

    tracing::info!(course_id = %course.id(), modules = modules.len(), "course created");
    Ok((StatusCode::OK, Json(CourseWithModules { course, modules })))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CourseCreate,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid course fields", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(Course::get_resource_type())?;
    validate_course(&body)
        .map_err(|details| WebError::resource_bad_request(Course::get_resource_type(), details))?;

    let course = find_course(&state, user, id).await?;
    let updated = course
        .update(state.pool(), user, body)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    description = "Deletes a course with its modules, enrollments, quizzes and discussions",
    responses(
        (status = 200, description = "Course deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(Course::get_resource_type())?;

    let course = find_course(&state, user, id).await?;
    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/modules",
    description = "Adds a module, progress of every enrollment is recomputed",
    request_body = ModuleBody,
    responses(
        (status = 200, description = "Module created", body = CourseModule),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_module_add_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ModuleBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(CourseModule::get_resource_type())?;
    let course = find_course(&state, user, id).await?;

    let module = CourseModule::create(state.pool(), user, body.into_create(course.id()))
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseModule::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(module)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/modules/{module_id}",
    description = "Removes a module, progress of every enrollment is recomputed",
    responses(
        (status = 200, description = "Module deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Module not found in this course", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_module_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, module_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(CourseModule::get_resource_type())?;

    let module = CourseModule::find_by_id(state.pool(), user, module_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseModule::get_resource_type(), e))?
        .filter(|module| module.course_id() == id)
        .ok_or(WebError::resource_not_found(CourseModule::get_resource_type()))?;

    module
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseModule::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/enroll",
    description = "Enrolls the signed in user into the course",
    responses(
        (status = 200, description = "Enrolled", body = Enrollment),
        (status = 400, description = "Already enrolled", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(&state, user, id).await?;

    let enrollment = Enrollment::enroll(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::from_database(Enrollment::get_resource_type(), e))?
        .ok_or(WebError::resource_bad_request(
            Enrollment::get_resource_type(),
            "already enrolled in this course",
        ))?;

    tracing::info!(user_id = %user.user_id(), course_id = %course.id(), "enrolled");
    Ok((StatusCode::OK, Json(enrollment)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/progress",
    description = "Marks a module as completed, repeating a completion changes nothing",
    request_body = ProgressBody,
    responses(
        (status = 200, description = "Progress updated", body = Enrollment),
        (status = 400, description = "Module does not belong to the course", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found or not enrolled", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProgressBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(&state, user, id).await?;

    let enrollment = Enrollment::complete_module(state.pool(), user, course.id(), body.module_id)
        .await
        .map_err(|e| WebError::from_database(Enrollment::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Enrollment::get_resource_type()))?;

    Ok((StatusCode::OK, Json(enrollment)))
}
