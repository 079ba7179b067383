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
        CrudRepository, ResourceTyped, check_access,
        entity::{Comment, CommentCreate, Course, Discussion, DiscussionCreate, UserEntity},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::discussions::{CommentBody, DiscussionCreateBody, DiscussionWithComments, validate_text},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(discussions_create_handler))
        .route("/course/{course_id}", get(discussions_by_course_handler))
        .route("/{id}", delete(discussions_delete_handler))
        .route("/{id}/like", post(discussions_like_handler))
        .route("/{id}/comments", post(discussions_comment_add_handler))
        .route(
            "/{id}/comments/{comment_id}",
            delete(discussions_comment_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_discussion(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Discussion> {
    Discussion::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Discussion::get_resource_type()))
}

/// Display name stored with a post, taken from the session user.
async fn author_name(state: &AppState, actor: &AuthenticatedUser) -> WebResult<String> {
    let user = UserEntity::find_by_id(state.pool(), actor, actor.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or(WebError::auth_required())?;
    Ok(user.username().to_string())
}

#[utoipa::path(
    get,
    path = "/api/v1/discussions/course/{course_id}",
    description = "Threads of a course, newest first, each with its comments",
    responses(
        (status = 200, description = "Threads collected", body = Vec<DiscussionWithComments>),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "discussions"
)]
async fn discussions_by_course_handler(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let actor = AuthenticatedUser::admin();
    let discussions = Discussion::find_all_by_course(state.pool(), &actor, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?;

    let ids: Vec<Uuid> = discussions.iter().map(Discussion::id).collect();
    let comments = Comment::find_all_by_discussions(state.pool(), &actor, &ids)
        .await
        .map_err(|e| WebError::resource_fetch_error(Comment::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(DiscussionWithComments::group(discussions, comments)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/discussions/",
    request_body = DiscussionCreateBody,
    responses(
        (status = 200, description = "Thread created", body = Discussion),
        (status = 400, description = "Empty title or content", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "discussions",
    security(
        ("cookie" = [])
    )
)]
async fn discussions_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(body): Json<DiscussionCreateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate_text("title", &body.title)
        .and_then(|_| validate_text("content", &body.content))
        .map_err(|details| WebError::resource_bad_request(Discussion::get_resource_type(), details))?;

    Course::find_by_id(state.pool(), user, body.course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    let create = DiscussionCreate {
        course_id: body.course_id,
        author_id: user.user_id(),
        author: author_name(&state, user).await?,
        title: body.title,
        content: body.content,
    };

    let discussion = Discussion::create(state.pool(), user, create)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(discussion)))
}

#[utoipa::path(
    post,
    path = "/api/v1/discussions/{id}/like",
    responses(
        (status = 200, description = "Thread liked", body = Discussion),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Thread not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "discussions",
    security(
        ("cookie" = [])
    )
)]
async fn discussions_like_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let discussion = find_discussion(&state, user, id).await?;

    let liked = discussion
        .like(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(liked)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/discussions/{id}",
    description = "Deletes a thread with its comments. Allowed for its author and admins",
    responses(
        (status = 200, description = "Thread deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Thread not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "discussions",
    security(
        ("cookie" = [])
    )
)]
async fn discussions_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let discussion = find_discussion(&state, user, id).await?;

    check_access(state.pool(), user, &discussion, user.user_id())
        .await
        .map_err(|e| WebError::from_database(Discussion::get_resource_type(), e))?;

    discussion
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/discussions/{id}/comments",
    request_body = CommentBody,
    responses(
        (status = 200, description = "Comment added", body = Comment),
        (status = 400, description = "Empty content", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Thread not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "discussions",
    security(
        ("cookie" = [])
    )
)]
async fn discussions_comment_add_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate_text("content", &body.content)
        .map_err(|details| WebError::resource_bad_request(Comment::get_resource_type(), details))?;

    let discussion = find_discussion(&state, user, id).await?;

    let create = CommentCreate {
        discussion_id: discussion.id(),
        author_id: user.user_id(),
        author: author_name(&state, user).await?,
        content: body.content,
    };

    let comment = Comment::create(state.pool(), user, create)
        .await
        .map_err(|e| WebError::resource_fetch_error(Comment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(comment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/discussions/{id}/comments/{comment_id}",
    description = "Deletes a comment. Allowed for its author and admins",
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found in this thread", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "discussions",
    security(
        ("cookie" = [])
    )
)]
async fn discussions_comment_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let comment = Comment::find_by_id(state.pool(), user, comment_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Comment::get_resource_type(), e))?
        .filter(|comment| comment.discussion_id() == id)
        .ok_or(WebError::resource_not_found(Comment::get_resource_type()))?;

    check_access(state.pool(), user, &comment, user.user_id())
        .await
        .map_err(|e| WebError::from_database(Comment::get_resource_type(), e))?;

    comment
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Comment::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
