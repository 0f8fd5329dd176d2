//! movies-service binary
//!
//! Loads configuration, installs the JSON subscriber, and serves the REST
//! surface until SIGINT or SIGTERM.
//!
//! ```text
//! curl http://localhost:8080/health
//! curl -X POST http://localhost:8080/api/actors \
//!      -H 'content-type: application/json' \
//!      -d '{"firstName":"Robert","lastName":"De Niro"}'
//! curl 'http://localhost:8080/api/movies?sort=releaseDate&order=desc&take=10'
//! ```

use anyhow::Context;
use movies_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    init_tracing(&config).context("initializing tracing")?;

    let app = api_router(AppState::new(config.clone()));

    Server::new(config)
        .serve(app)
        .await
        .context("serving HTTP")?;

    Ok(())
}
