//! # convgate: Conversion Gateway
//!
//! `convgate` is a small HTTP service that turns uploads and query parameters into downloadable
//! files. Every endpoint is independent and stateless: it parses its input, hands it to one codec
//! library, and returns the encoded result as an attachment.
//!
//! ## Endpoints
//!
//! | Method | Path | Input | Output |
//! |---|---|---|---|
//! | GET | `/` | | index document |
//! | GET | `/src/*` | | static files |
//! | POST | `/rotate/download` | form file `image`, query `deg` | JPEG |
//! | POST | `/resize/download` | form file `image`, query `width`, `height` | JPEG |
//! | GET | `/qrcode/download` | query `content` | JPEG |
//! | GET | `/barcode/download` | query `content` | JPEG |
//! | POST | `/csv/excel/download` | form file `csv`, fields `password`, `colorcode` | `.xlsx` |
//! | POST | `/zip/download` | form files `files[]`, field `password` | `.zip` |
//! | GET | `/docs` | | OpenAPI reference |
//!
//! Failures are returned as `{"error": "..."}` with status 400 for bad input and 500 for codec
//! failures (see [`errors`]).
//!
//! ## Architecture
//!
//! The HTTP layer ([`api`]) is built on [Axum](https://github.com/tokio-rs/axum). Handlers buffer
//! their input, run the conversion from [`convert`] on the blocking thread pool, and only then
//! start the response, so the status code always reflects the outcome. Password-to-open
//! workbooks are produced by [`crypto`], which wraps the `.xlsx` package in the encrypted
//! container office applications expect.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use convgate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = convgate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     convgate::telemetry::init_telemetry(&config)?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`config`] for the YAML layout and `CONVGATE_` environment overrides.

pub mod api;
pub mod config;
pub mod convert;
pub mod crypto;
pub mod errors;
mod openapi;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use tokio::net::TcpListener;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api::handlers::{archives, barcodes, images, qr_codes, spreadsheets, static_assets};
use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// Only the immutable configuration is shared; no handler keeps state between requests.
///
/// ```ignore
/// let state = AppState::builder().config(Arc::new(config)).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Arc<Config>,
}

/// Build the application router with every route and layer attached.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.limits.max_upload_bytes);
    let assets = ServeDir::new(&state.config.assets.dir);

    Router::new()
        .route("/", get(static_assets::index))
        .route("/rotate/download", post(images::rotate_image).layer(upload_limit))
        .route("/resize/download", post(images::resize_image).layer(upload_limit))
        .route("/qrcode/download", get(qr_codes::download_qr_code))
        .route("/barcode/download", get(barcodes::download_barcode))
        .route(
            "/csv/excel/download",
            post(spreadsheets::csv_to_excel).layer(upload_limit),
        )
        .route("/zip/download", post(archives::download_zip).layer(upload_limit))
        .with_state(state)
        .nest_service("/src", assets)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// The gateway server.
///
/// 1. **Create**: [`Application::new`] builds the shared state and router
/// 2. **Serve**: [`Application::serve`] binds the listener and handles requests until the
///    shutdown future resolves, then flushes telemetry
pub struct Application {
    router: Router,
    config: Arc<Config>,
}

impl Application {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting conversion gateway with configuration: {:#?}", config);
        config.validate()?;

        let config = Arc::new(config);
        let state = AppState::builder().config(config.clone()).build();
        let router = build_router(state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Conversion gateway listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
