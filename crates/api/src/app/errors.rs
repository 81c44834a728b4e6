use async_graphql::ErrorExtensions;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use todolist_auth::{AuthzError, PasswordError, TokenError};
use todolist_core::DomainError;
use todolist_infra::StoreError;

/// Every failure a resolver can report, one variant per client-visible code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    Validation(String),

    /// Details are logged, never sent to the client.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn not_found(what: impl core::fmt::Display) -> Self {
        ApiError::NotFound(format!("{what} not found"))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    fn internal(source: impl core::fmt::Display) -> Self {
        error!(error = %source, "internal error");
        ApiError::Internal
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::Validation(msg),
            DomainError::NotFound(_) => ApiError::NotFound(err.to_string()),
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotPermitted(msg) => ApiError::Forbidden(msg),
            other => ApiError::Forbidden(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(_) => ApiError::internal(err),
            other => ApiError::InvalidToken(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Validation(msg),
            StoreError::Backend(_) => ApiError::internal(err),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err)
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

/// Resolver-side conversion that keeps the error code in `extensions.code`.
pub trait GqlResultExt<T> {
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T> GqlResultExt<T> for Result<T, ApiError> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}

/// A GraphQL-shaped error body for failures that happen before any resolver
/// runs (bad bearer token).
pub fn graphql_error(status: StatusCode, err: &ApiError) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "data": null,
            "errors": [{
                "message": err.to_string(),
                "extensions": { "code": err.code() },
            }],
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use todolist_auth::{Role, TokenValidationError};

    #[test]
    fn codes_follow_the_taxonomy() {
        assert_eq!(ApiError::from(DomainError::not_found("task")).code(), "NOT_FOUND");
        assert_eq!(ApiError::from(DomainError::invalid_id("bad")).code(), "VALIDATION_ERROR");
        assert_eq!(ApiError::from(AuthzError::Unauthenticated).code(), "FORBIDDEN");
        assert_eq!(
            ApiError::from(AuthzError::MissingRole {
                required: "ADMIN".into(),
                actual: Role::Basic
            })
            .code(),
            "FORBIDDEN"
        );
        assert_eq!(
            ApiError::from(TokenError::Claims(TokenValidationError::Expired)).code(),
            "INVALID_TOKEN"
        );
        assert_eq!(ApiError::from(StoreError::Conflict("taken".into())).code(), "VALIDATION_ERROR");
        assert_eq!(ApiError::from(StoreError::Backend("down".into())).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ApiError::from(StoreError::Backend("password=hunter2".into()));
        assert_eq!(err.to_string(), "internal error");
    }

    #[test]
    fn graphql_extension_carries_code() {
        let err = ApiError::forbidden("you are not the owner of this task").extend();
        assert_eq!(err.message, "you are not the owner of this task");
        let ext = err.extensions.expect("extensions set");
        assert_eq!(ext.get("code"), Some(&async_graphql::Value::from("FORBIDDEN")));
    }
}
