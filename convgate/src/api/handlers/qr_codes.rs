use axum::extract::{Query, State, rejection::QueryRejection};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::{
        downloads::{BinaryFile, Download},
        queries::ContentQuery,
    },
    convert::{imaging, qr, run_blocking},
    errors::{ErrorBody, Result},
};

/// Render `content` as a QR code JPEG
#[utoipa::path(
    get,
    path = "/qrcode/download",
    tag = "codes",
    summary = "Generate QR code",
    description = "Encodes the content as a square QR code at the configured size and error-correction level.",
    params(ContentQuery),
    responses(
        (status = 200, description = "QR code image", content_type = "image/jpeg", body = BinaryFile),
        (status = 400, description = "Malformed query string", body = ErrorBody),
        (status = 500, description = "Content is empty or does not fit in a QR code", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn download_qr_code(
    State(state): State<AppState>,
    query: std::result::Result<Query<ContentQuery>, QueryRejection>,
) -> Result<Download> {
    let Query(ContentQuery { content }) = query?;
    let settings = state.config.qr_code.clone();
    let quality = state.config.images.jpeg_quality;
    debug!(content_len = content.len(), size = settings.size, "generating QR code");

    let jpeg = run_blocking("render QR code", move || {
        let image = qr::render(&content, settings.error_correction, settings.size)?;
        imaging::encode_jpeg(&image, quality)
    })
    .await?;

    Ok(Download::jpeg(jpeg))
}

#[cfg(test)]
mod tests {
    use crate::errors::ErrorBody;
    use crate::test_utils::TestAssets;
    use axum::http::StatusCode;
    use image::{GenericImageView, ImageFormat};

    #[tokio::test]
    async fn test_qr_code_download() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .get("/qrcode/download")
            .add_query_param("content", "https://example.com/some/path")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "image/jpeg");
        assert_eq!(response.header("content-disposition"), "attachment;filename=output.jpg");

        let bytes = response.as_bytes();
        assert_eq!(image::guess_format(bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(bytes).unwrap().dimensions(), (256, 256));
    }

    #[tokio::test]
    async fn test_qr_code_over_capacity_is_500() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .get("/qrcode/download")
            .add_query_param("content", "x".repeat(5000))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = response.json();
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_qr_code_without_content_is_500() {
        let assets = TestAssets::new();
        let response = assets.server().get("/qrcode/download").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = response.json();
        assert_eq!(body.error, "cannot encode empty content as a QR code");
    }

    #[tokio::test]
    async fn test_qr_code_uses_configured_size() {
        let assets = TestAssets::new();
        let mut config = assets.config();
        config.qr_code.size = 512;
        let response = crate::test_utils::server_with_config(config)
            .get("/qrcode/download")
            .add_query_param("content", "hello")
            .await;

        response.assert_status_ok();
        let image = image::load_from_memory(response.as_bytes()).unwrap();
        assert_eq!(image.dimensions(), (512, 512));
    }
}
