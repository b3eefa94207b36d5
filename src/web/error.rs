use crate::core::{ErrorKind, ServiceError};
use crate::service::NO_PROFILE;
use axum::Json;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub const ERROR_HEADER: &str = "x-profile-error";
pub const BASIC_CHALLENGE: &str = "Basic realm=\"Private Area\"";

pub const ERR_DB: &str = "Oops! database problem, try again latter";
pub const ERR_BODY: &str = "something wrong with your request body";
pub const ERR_FORBIDDEN: &str = "Forbidden";
pub const ERR_UNAUTHORIZED: &str = "Unauthorized";
pub const ERR_MEDIA_TYPE: &str = "content type must be application/json";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

#[derive(Debug)]
pub enum WebError {
    Service(ServiceError),
    UnsupportedMediaType,
}

impl From<ServiceError> for WebError {
    fn from(err: ServiceError) -> Self {
        WebError::Service(err)
    }
}

impl WebError {
    /// For profile routes: a caller that may not touch a profile learns
    /// nothing more than a caller asking for one that does not exist.
    pub fn conceal(err: ServiceError) -> Self {
        match err {
            ServiceError::Forbidden(reason) => {
                debug!(reason = %reason, "reporting denial as missing profile");
                WebError::Service(ServiceError::not_found(NO_PROFILE))
            }
            other => WebError::Service(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        let kind = match self {
            WebError::UnsupportedMediaType => return StatusCode::UNSUPPORTED_MEDIA_TYPE,
            WebError::Service(err) => err.kind(),
        };

        match kind {
            ErrorKind::BadInput | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unavailable | ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Server-side detail never leaves the process.
    pub fn public_message(&self) -> String {
        match self {
            WebError::UnsupportedMediaType => ERR_MEDIA_TYPE.to_string(),
            WebError::Service(err) if err.is_server_side() => ERR_DB.to_string(),
            WebError::Service(ServiceError::Unauthorized(_)) => ERR_UNAUTHORIZED.to_string(),
            WebError::Service(ServiceError::Forbidden(_)) => ERR_FORBIDDEN.to_string(),
            WebError::Service(
                ServiceError::BadInput(msg) | ServiceError::NotFound(msg) | ServiceError::Conflict(msg),
            ) => msg.clone(),
            WebError::Service(err) => err.to_string(),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.public_message();

        match &self {
            WebError::Service(err) if err.is_server_side() => {
                error!(error = %err, kind = %err.kind(), "request failed");
            }
            WebError::Service(err) => debug!(error = %err, status = status.as_u16(), "request rejected"),
            WebError::UnsupportedMediaType => debug!("request body is not JSON"),
        }

        let header = HeaderValue::from_str(&message).ok();
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message,
        });

        let mut response = (status, body).into_response();
        if let Some(value) = header {
            response.headers_mut().insert(ERROR_HEADER, value);
        }
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE));
        }
        response
    }
}

pub type WebResult<T> = std::result::Result<T, WebError>;
