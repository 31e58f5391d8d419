use axum::extract::{Query, State, rejection::QueryRejection};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::{
        downloads::{BinaryFile, Download},
        queries::ContentQuery,
    },
    convert::{barcode, imaging, run_blocking},
    errors::{ErrorBody, Result},
};

/// Render `content` as a Code 128 barcode JPEG
#[utoipa::path(
    get,
    path = "/barcode/download",
    tag = "codes",
    summary = "Generate barcode",
    description = "Encodes printable ASCII content as a Code 128 barcode. The image is one module wide per bar unit at the configured height.",
    params(ContentQuery),
    responses(
        (status = 200, description = "Barcode image", content_type = "image/jpeg", body = BinaryFile),
        (status = 400, description = "Malformed query string", body = ErrorBody),
        (status = 500, description = "Content is empty or not printable ASCII", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn download_barcode(
    State(state): State<AppState>,
    query: std::result::Result<Query<ContentQuery>, QueryRejection>,
) -> Result<Download> {
    let Query(ContentQuery { content }) = query?;
    let settings = state.config.barcode.clone();
    let quality = state.config.images.jpeg_quality;
    debug!(content_len = content.len(), "generating barcode");

    let jpeg = run_blocking("render barcode", move || {
        let image = barcode::render(&content, settings.height, settings.module_width)?;
        imaging::encode_jpeg(&image, quality)
    })
    .await?;

    Ok(Download::jpeg(jpeg))
}
