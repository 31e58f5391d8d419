//! HTTP handler for the index document. Everything under `/src` is served by `ServeDir`.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::{
    AppState,
    errors::{Error, ErrorBody, Result},
};

/// Serve the configured index document
#[utoipa::path(
    get,
    path = "/",
    tag = "assets",
    summary = "Index document",
    description = "Returns the browser UI entry point from the configured asset directory.",
    responses(
        (status = 200, description = "Index document", content_type = "text/html", body = String),
        (status = 500, description = "Index document could not be read", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Response> {
    let path = &state.config.assets.index;
    let contents = tokio::fs::read(path).await.map_err(|e| Error::Internal {
        operation: format!("read {}: {e}", path.display()),
    })?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    debug!(path = %path.display(), bytes = contents.len(), "serving index document");

    Ok(([(header::CONTENT_TYPE, mime.to_string())], contents).into_response())
}
