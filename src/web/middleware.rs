use super::error::WebError;
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Rejects bodies that do not declare themselves as JSON.
pub async fn require_json(request: Request, next: Next) -> Result<Response, WebError> {
    let carries_body = matches!(
        *request.method(),
        Method::POST | Method::PUT | Method::PATCH
    );

    if carries_body && !is_json(request.headers()) {
        return Err(WebError::UnsupportedMediaType);
    }

    Ok(next.run(request).await)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}
