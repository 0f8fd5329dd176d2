//! # movies-service
//!
//! REST service for movies, actors, directors and reviews, built on a
//! generic query and relationship engine.
//!
//! ## Features
//!
//! - **Query engine**: equality filters, single-field stable sort, skip/take
//!   paging, identical for every entity
//! - **Relationships**: connect, disconnect and replace on one-to-many
//!   relations, with owner lookups in the other direction
//! - **Optimistic concurrency**: atomic change sets checked against row
//!   versions; races surface as `NotFound` or a retriable conflict
//! - **Middleware stack**: request IDs, tracing, compression, CORS, body
//!   limits, timeouts, panic recovery
//! - **Health checks**: liveness and readiness probes
//! - **Graceful shutdown**: SIGTERM and SIGINT
//!
//! ## Example
//!
//! ```rust,no_run
//! use movies_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let app = api_router(AppState::new(config.clone()));
//!     Server::new(config).serve(app).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repository;
pub mod responses;
pub mod server;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ApiConfig, Config, MiddlewareConfig, ServiceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{api_router, ApiError, ApiErrorKind, ApiOperation, ListQuery};
    pub use crate::health::{health, readiness};
    pub use crate::ids::{MakeTypedRequestId, RequestId, RequestIdError};
    pub use crate::middleware::{
        request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
    };
    pub use crate::models::{Actor, Director, Movie, Review};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        Entity, Filter, FilterCondition, FindManyArgs, MemoryStore, Pagination, Repository,
        RepositoryError, RepositoryErrorKind, RelationshipManager, SortSpec, Store,
    };
    pub use crate::responses::{Created, MetadataDto, NoContent};
    pub use crate::server::Server;
    pub use crate::state::AppState;

    pub use axum::{
        extract::{Path, Query, State},
        routing::{delete, get, patch, post},
        Json, Router,
    };
}
