use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::application::comments::CommentError;
use crate::application::feeds::FeedError;
use crate::application::friends::FriendError;
use crate::application::metas::MetaError;
use crate::application::site_config::SiteConfigError;
use crate::application::users::UserError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;
use crate::infra::http::repo_error_to_http;

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn public_message(&self) -> &'static str {
        self.public_message
    }

    pub fn forbidden(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(source, StatusCode::FORBIDDEN, "Permission denied", detail)
    }

    pub fn not_found(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, "Not found", detail)
    }

    pub fn bad_request(source: &'static str, message: &'static str) -> Self {
        Self::new(source, StatusCode::BAD_REQUEST, message, message)
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        const SOURCE: &str = "application::feeds";
        match error {
            FeedError::PermissionDenied => {
                HttpError::forbidden(SOURCE, "viewer may not access feed")
            }
            FeedError::NotFound => HttpError::not_found(SOURCE, "feed not found"),
            FeedError::Validation(message) => HttpError::bad_request(SOURCE, message),
            FeedError::InsertFailed(err) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to insert",
                &err,
            ),
            FeedError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<MetaError> for HttpError {
    fn from(error: MetaError) -> Self {
        const SOURCE: &str = "application::metas";
        match error {
            MetaError::NotFound => HttpError::not_found(SOURCE, "meta not found"),
            MetaError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<CommentError> for HttpError {
    fn from(error: CommentError) -> Self {
        const SOURCE: &str = "application::comments";
        match error {
            CommentError::PermissionDenied => {
                HttpError::forbidden(SOURCE, "viewer may not manage comment")
            }
            CommentError::NotFound => HttpError::not_found(SOURCE, "comment or feed not found"),
            CommentError::ContentRequired => HttpError::bad_request(SOURCE, "Content is required"),
            CommentError::NotAllowed => HttpError::new(
                SOURCE,
                StatusCode::FORBIDDEN,
                "Comment is not allowed",
                "comments are disabled for this feed",
            ),
            CommentError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<FriendError> for HttpError {
    fn from(error: FriendError) -> Self {
        const SOURCE: &str = "application::friends";
        match error {
            FriendError::PermissionDenied => {
                HttpError::forbidden(SOURCE, "viewer may not manage friend")
            }
            FriendError::NotFound => HttpError::not_found(SOURCE, "friend not found"),
            FriendError::Validation(message) => HttpError::bad_request(SOURCE, message),
            FriendError::ApplyDisabled => HttpError::new(
                SOURCE,
                StatusCode::FORBIDDEN,
                "Friend application is disabled",
                "server.friend.apply.enabled is false",
            ),
            FriendError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<SiteConfigError> for HttpError {
    fn from(error: SiteConfigError) -> Self {
        const SOURCE: &str = "application::site_config";
        match error {
            SiteConfigError::PermissionDenied => {
                HttpError::forbidden(SOURCE, "server config requires admin")
            }
            SiteConfigError::UnknownScope(scope) => {
                HttpError::not_found(SOURCE, format!("unknown config scope `{scope}`"))
            }
            SiteConfigError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<UserError> for HttpError {
    fn from(error: UserError) -> Self {
        const SOURCE: &str = "application::users";
        match error {
            UserError::PermissionDenied => HttpError::forbidden(SOURCE, "sign-in required"),
            UserError::NotFound => HttpError::not_found(SOURCE, "user not found"),
            UserError::Domain(err) => HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Request could not be processed",
                &err,
            ),
            UserError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

/// Process-level failures, reported once before exit.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<UserError> for AppError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::Domain(err) => AppError::Domain(err),
            other => AppError::unexpected(other.to_string()),
        }
    }
}
