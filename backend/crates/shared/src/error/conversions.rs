//! Error rendering
//!
//! Turns [`AppError`] into the API's JSON error body:
//! `{"code": <status>, "error_response": <public message>}`.

#[cfg(feature = "axum")]
use super::app_error::AppError;

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::json!({
            "code": status.as_u16(),
            "error_response": self.public_message(),
        });

        (status, Json(body)).into_response()
    }
}
