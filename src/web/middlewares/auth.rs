use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::{Cookie, Cookies};

use crate::{
    auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";

/// Resolves the `SID` cookie into a [`RequestContext`].
///
/// A missing cookie, a token of a deleted user or a token that no longer
/// verifies yields an anonymous context, handlers decide whether that is
/// acceptable. A token that fails verification is removed from the client.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let ctx = match cookies.get(AUTH_TOKEN) {
        Some(token) => resolve_token(&state, &cookies, token.value()).await?,
        None => RequestContext::anonymous(),
    };

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

async fn resolve_token(
    state: &AppState,
    cookies: &Cookies,
    token: &str,
) -> Result<RequestContext, WebError> {
    let claims = match auth::process_token(token, state.config().app().jwt()) {
        Ok(claims) => claims.claims,
        Err(e) => {
            tracing::debug!(error = %e, "dropping session cookie");
            remove_session_cookie(cookies);
            return Ok(RequestContext::anonymous());
        }
    };

    let Some(id) = claims.user_id() else {
        remove_session_cookie(cookies);
        return Ok(RequestContext::anonymous());
    };

    let found = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok(match found {
        Some(user) => RequestContext::new(Some(AuthenticatedUser::new(id, user.role()))),
        None => RequestContext::anonymous(),
    })
}

pub fn remove_session_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::from(AUTH_TOKEN);
    cookie.set_path("/");
    cookies.remove(cookie);
}
