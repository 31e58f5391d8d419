//! HTTP handlers for image resizing and rotation.
//!
//! Both endpoints take the image from the multipart field `image`, re-encode the result as JPEG
//! at the configured quality, and report a missing upload or malformed parameter as 400 before any
//! decoding work starts.

use axum::extract::{
    Multipart, Query, State,
    multipart::MultipartRejection,
    rejection::QueryRejection,
};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::{
        downloads::{BinaryFile, Download},
        forms::{FormData, ImageUpload},
        queries::{ResizeQuery, RotateQuery},
    },
    convert::{imaging, run_blocking},
    errors::{Error, ErrorBody, Result},
};

/// Resize an uploaded image to `width` x `height`
#[utoipa::path(
    post,
    path = "/resize/download",
    tag = "images",
    summary = "Resize image",
    description = "Resamples the image with a Lanczos filter. A dimension of 0 is derived from the other one so the aspect ratio is kept.",
    params(ResizeQuery),
    request_body(content = ImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resized image", content_type = "image/jpeg", body = BinaryFile),
        (status = 400, description = "Missing image or invalid width/height", body = ErrorBody),
        (status = 500, description = "Image could not be decoded or encoded", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn resize_image(
    State(state): State<AppState>,
    query: std::result::Result<Query<ResizeQuery>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Download> {
    let image = FormData::read(multipart?).await?.take_file("image")?;
    let Query(query) = query?;
    let max_dimension = state.config.images.max_dimension;
    let (width, height) = query.dimensions(max_dimension)?;
    let quality = state.config.images.jpeg_quality;
    debug!(bytes = image.bytes.len(), width, height, "resizing image");

    let jpeg = run_blocking("resize image", move || {
        let decoded = imaging::decode(&image.bytes)?;
        let (width, height) = imaging::target_dimensions((decoded.width(), decoded.height()), width, height)?;
        if width > max_dimension || height > max_dimension {
            return Err(Error::bad_request(format!(
                "resized image would be {width}x{height}, larger than {max_dimension} pixels"
            )));
        }
        let resized = imaging::resize(&decoded, width, height)?;
        imaging::encode_jpeg(&resized, quality)
    })
    .await?;

    Ok(Download::jpeg(jpeg))
}

/// Rotate an uploaded image counter-clockwise by `deg` degrees
#[utoipa::path(
    post,
    path = "/rotate/download",
    tag = "images",
    summary = "Rotate image",
    description = "Rotates counter-clockwise about the centre. Multiples of 90 are lossless; other angles grow the canvas to fit the whole image and fill the exposed corners.",
    params(RotateQuery),
    request_body(content = ImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Rotated image", content_type = "image/jpeg", body = BinaryFile),
        (status = 400, description = "Missing image or invalid deg", body = ErrorBody),
        (status = 500, description = "Image could not be decoded or encoded", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn rotate_image(
    State(state): State<AppState>,
    query: std::result::Result<Query<RotateQuery>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Download> {
    let image = FormData::read(multipart?).await?.take_file("image")?;
    let Query(query) = query?;
    let degrees = query.degrees()?;
    let quality = state.config.images.jpeg_quality;
    debug!(bytes = image.bytes.len(), degrees, "rotating image");

    let jpeg = run_blocking("rotate image", move || {
        let decoded = imaging::decode(&image.bytes)?;
        imaging::encode_jpeg(&imaging::rotate(decoded, degrees), quality)
    })
    .await?;

    Ok(Download::jpeg(jpeg))
}

#[cfg(test)]
mod tests {
    use crate::errors::ErrorBody;
    use crate::test_utils::{TestAssets, png};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use image::{GenericImageView, ImageFormat};

    fn image_form(bytes: Vec<u8>) -> MultipartForm {
        MultipartForm::new().add_part("image", Part::bytes(bytes).file_name("photo.png"))
    }

    #[tokio::test]
    async fn test_resize_to_requested_dimensions() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/resize/download")
            .add_query_param("width", 13)
            .add_query_param("height", 57)
            .multipart(image_form(png(40, 20)))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "image/jpeg");
        assert_eq!(response.header("content-disposition"), "attachment;filename=output.jpg");

        let bytes = response.as_bytes();
        assert_eq!(image::guess_format(bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(bytes).unwrap().dimensions(), (13, 57));
    }

    #[tokio::test]
    async fn test_resize_keeps_aspect_ratio_for_zero_height() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/resize/download")
            .add_query_param("width", 20)
            .add_query_param("height", 0)
            .multipart(image_form(png(40, 20)))
            .await;

        response.assert_status_ok();
        assert_eq!(image::load_from_memory(response.as_bytes()).unwrap().dimensions(), (20, 10));
    }

    #[tokio::test]
    async fn test_resize_without_image_is_400() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/resize/download")
            .add_query_param("width", 10)
            .add_query_param("height", 10)
            .multipart(MultipartForm::new().add_text("other", "value"))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.header("content-type"), "application/json");
        let body: ErrorBody = response.json();
        assert_eq!(body.error, "missing form file `image`");
    }

    #[tokio::test]
    async fn test_resize_without_multipart_body_is_400() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/resize/download")
            .add_query_param("width", 10)
            .add_query_param("height", 10)
            .text("not a form")
            .await;

        response.assert_status_bad_request();
        let body: ErrorBody = response.json();
        assert!(body.error.starts_with("Failed to parse multipart data"), "{}", body.error);
    }

    #[tokio::test]
    async fn test_resize_with_non_integer_width_is_400() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/resize/download")
            .add_query_param("width", "wide")
            .add_query_param("height", 10)
            .multipart(image_form(png(8, 8)))
            .await;

        response.assert_status_bad_request();
        let body: ErrorBody = response.json();
        assert!(body.error.contains("`width`"), "{}", body.error);
    }

    #[tokio::test]
    async fn test_resize_rejects_negative_and_oversized_dimensions() {
        let assets = TestAssets::new();
        let server = assets.server();

        for (width, height) in [("-5", "10"), ("10", "100000"), ("0", "0")] {
            server
                .post("/resize/download")
                .add_query_param("width", width)
                .add_query_param("height", height)
                .multipart(image_form(png(8, 8)))
                .await
                .assert_status_bad_request();
        }
    }

    #[tokio::test]
    async fn test_resize_rejects_derived_dimension_over_limit() {
        let assets = TestAssets::new();
        let mut config = assets.config();
        config.images.max_dimension = 100;
        let response = crate::test_utils::server_with_config(config)
            .post("/resize/download")
            .add_query_param("width", 100)
            .add_query_param("height", 0)
            .multipart(image_form(png(2, 40)))
            .await;

        // 100 wide means 2000 tall for a 2x40 source
        response.assert_status_bad_request();
    }

    #[test_log::test(tokio::test)]
    async fn test_resize_with_undecodable_image_is_500() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/resize/download")
            .add_query_param("width", 10)
            .add_query_param("height", 10)
            .multipart(image_form(b"not an image at all".to_vec()))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = response.json();
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_rotate_zero_keeps_dimensions() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/rotate/download")
            .add_query_param("deg", 0)
            .multipart(image_form(png(30, 10)))
            .await;

        response.assert_status_ok();
        assert_eq!(image::load_from_memory(response.as_bytes()).unwrap().dimensions(), (30, 10));
    }

    #[tokio::test]
    async fn test_rotate_quarter_turn_swaps_dimensions() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/rotate/download")
            .add_query_param("deg", -90)
            .multipart(image_form(png(30, 10)))
            .await;

        response.assert_status_ok();
        assert_eq!(image::load_from_memory(response.as_bytes()).unwrap().dimensions(), (10, 30));
    }

    #[tokio::test]
    async fn test_rotate_arbitrary_angle_grows_canvas() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/rotate/download")
            .add_query_param("deg", 45)
            .multipart(image_form(png(10, 10)))
            .await;

        response.assert_status_ok();
        assert_eq!(image::load_from_memory(response.as_bytes()).unwrap().dimensions(), (15, 15));
    }

    #[tokio::test]
    async fn test_rotate_without_deg_is_400() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/rotate/download")
            .multipart(image_form(png(4, 4)))
            .await;

        response.assert_status_bad_request();
        let body: ErrorBody = response.json();
        assert_eq!(body.error, "missing query parameter `deg`");
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_is_rejected() {
        let assets = TestAssets::new();
        let mut config = assets.config();
        config.limits.max_upload_bytes = 1024;
        let response = crate::test_utils::server_with_config(config)
            .post("/rotate/download")
            .add_query_param("deg", 90)
            .multipart(image_form(vec![0u8; 4096]))
            .await;

        response.assert_status_bad_request();
    }
}
