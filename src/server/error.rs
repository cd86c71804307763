use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

pub type AppResult<T> = Result<T, Error>;

/// application-wide error surface, mapped onto http status codes at the boundary
#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication is required to access this resource")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    FetchFailed(String),
    #[error("unexpected error has occurred")]
    InternalServerError,
    #[error("{0}")]
    InternalServerErrorWithContext(String),
    #[error(transparent)]
    ValidationError(#[from] ValidationErrors),
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

/// why a download token was rejected; callers branch on the kind, the http
/// layer collapses all three to 401
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("download token is not decodable")]
    MalformedToken,
    #[error("download token has expired")]
    Expired,
    #[error("download token signature does not match")]
    BadSignature,
}

impl TokenError {
    pub fn kind_label(&self) -> &'static str {
        match self {
            TokenError::MalformedToken => "malformed",
            TokenError::Expired => "expired",
            TokenError::BadSignature => "bad_signature",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::FetchFailed(_)
            | Error::InternalServerError
            | Error::InternalServerErrorWithContext(_)
            | Error::AnyhowError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error served to client: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
