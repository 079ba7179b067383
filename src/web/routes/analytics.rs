use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, ResourceType,
        entity::{Course, CourseAnalytics, DashboardAnalytics},
    },
    web::{AppState, RequestContext, WebError, WebResult, error::ErrorResponse, middlewares},
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/dashboard", get(analytics_dashboard_handler))
        .route("/courses/{course_id}", get(analytics_course_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/dashboard",
    description = "Platform totals, enrollments and completions of the last six months, top courses",
    responses(
        (status = 200, description = "Dashboard collected", body = DashboardAnalytics),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "analytics",
    security(
        ("cookie" = [])
    )
)]
async fn analytics_dashboard_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(ResourceType::Analytics)?;

    let dashboard = DashboardAnalytics::collect(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Analytics, e))?;

    Ok((StatusCode::OK, Json(dashboard)))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/courses/{course_id}",
    description = "Enrollment count, rounded average progress and completions of a course",
    responses(
        (status = 200, description = "Course statistics", body = CourseAnalytics),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "analytics",
    security(
        ("cookie" = [])
    )
)]
async fn analytics_course_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(ResourceType::Analytics)?;

    let course = Course::find_by_id(state.pool(), user, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    let stats = CourseAnalytics::collect(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Analytics, e))?;

    Ok((StatusCode::OK, Json(stats)))
}
