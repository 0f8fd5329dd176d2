//! Success response types for the REST surface
//!
//! ```rust
//! use axum::{http::StatusCode, response::IntoResponse};
//! use movies_service::responses::{Created, NoContent};
//!
//! let response = Created::new(serde_json::json!({ "id": "a1" }))
//!     .with_location("/api/actors/a1")
//!     .into_response();
//! assert_eq!(response.status(), StatusCode::CREATED);
//! assert_eq!(response.headers()["location"], "/api/actors/a1");
//!
//! assert_eq!(NoContent.into_response().status(), StatusCode::NO_CONTENT);
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// 201 Created
// ============================================================================

/// 201 with the created entity as body and an optional `Location` header
#[derive(Debug)]
pub struct Created<T> {
    data: T,
    location: Option<String>,
}

impl<T> Created<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            location: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::CREATED, Json(&self.data)).into_response();

        if let Some(location) = self.location {
            if let Ok(header_value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(header::LOCATION, header_value);
            }
        }

        response
    }
}

// ============================================================================
// 204 No Content
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

// ============================================================================
// Count metadata
// ============================================================================

/// Body of the `meta` endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDto {
    pub count: u64,
}

impl MetadataDto {
    pub fn new(count: usize) -> Self {
        Self {
            count: count as u64,
        }
    }
}

impl IntoResponse for MetadataDto {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_created_without_location() {
        let response = Created::new(serde_json::json!({ "id": "m1" })).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[tokio::test]
    async fn test_metadata_body() {
        let response = MetadataDto::new(3).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"count":3}"#);
    }
}
