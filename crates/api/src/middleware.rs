use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, warn};

use todolist_auth::{Principal, TokenService, BEARER_PREFIX};
use todolist_infra::{Store, UserRepository};

use crate::app::errors::{graphql_error, ApiError};
use crate::context::RequestContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub store: Arc<dyn Store>,
}

/// Resolve the bearer token (if any) into a [`RequestContext`].
///
/// No `Authorization` header means an anonymous request. A header that is
/// present but does not yield a live user is rejected with 401 before any
/// resolver runs.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let context = match extract_bearer(req.headers()) {
        Ok(None) => RequestContext::anonymous(),
        Ok(Some(token)) => match resolve_principal(&state, &token).await {
            Ok(principal) => RequestContext::authenticated(principal),
            Err(err) => return reject(err),
        },
        Err(err) => return reject(err),
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}

/// Verify the token, then check its subject against the store.
pub async fn resolve_principal(state: &AuthState, token: &str) -> Result<Principal, ApiError> {
    let claims = state.tokens.verify(token, Utc::now())?;

    let user = state
        .store
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| ApiError::InvalidToken("token subject no longer exists".into()))?;

    if user.token_version != claims.ver {
        return Err(ApiError::InvalidToken("token has been revoked".into()));
    }

    debug!(user_id = %user.id, role = %user.role, "authenticated request");
    Ok(Principal::from(&user))
}

fn reject(err: ApiError) -> Response {
    let status = match err {
        ApiError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(code = err.code(), reason = %err, "rejected bearer token");
    graphql_error(status, &err)
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header
        .to_str()
        .map_err(|_| ApiError::InvalidToken("authorization header is not valid text".into()))?;

    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| ApiError::InvalidToken("expected a Bearer token".into()))?
        .trim();

    if token.is_empty() {
        return Err(ApiError::InvalidToken("empty bearer token".into()));
    }

    Ok(Some(token.to_string()))
}
