//! HTTP edge over the repository
//!
//! # Features
//!
//! - **Routes**: [`api_router`] mounts CRUD, count, relationship and owner
//!   endpoints for every entity
//! - **Queries**: [`ListQuery`] turns query-string pairs into filter, sort
//!   and paging arguments
//! - **Error Handling**: [`ApiError`] with automatic HTTP status code mapping
//!
//! # Example
//!
//! ```rust
//! use axum::{body::Body, http::{Request, StatusCode}};
//! use movies_service::handlers::api_router;
//! use movies_service::state::AppState;
//! use tower::ServiceExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = api_router(AppState::default());
//! let response = app
//!     .oneshot(Request::get("/api/actors").body(Body::empty()).unwrap())
//!     .await
//!     .unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//! # }
//! ```

mod error;
mod query;
mod routes;

pub use error::{ApiError, ApiErrorKind, ApiOperation};
pub use query::{ListQuery, SortOrder};
pub use routes::{api_router, entity_routes, owner_routes, relation_routes};
