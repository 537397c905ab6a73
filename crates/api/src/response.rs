//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope: `{ "success": true, "data": ... }`.
///
/// Errors use the matching `{ "success": false, "message", "error" }` shape
/// produced by `AppError`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    status: StatusCode,
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK.
    pub const fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            data,
        }
    }

    /// 201 Created.
    pub const fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Payload of endpoints that only acknowledge.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

/// Acknowledge with a message.
pub fn message(text: impl Into<String>) -> ApiResponse<Message> {
    ApiResponse::ok(Message {
        message: text.into(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::created(vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "data": [1, 2] }));
    }

    #[test]
    fn test_status_is_kept() {
        assert_eq!(
            ApiResponse::created(()).into_response().status(),
            StatusCode::CREATED
        );
        assert_eq!(message("done").into_response().status(), StatusCode::OK);
    }
}
