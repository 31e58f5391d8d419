//! OpenAPI document for the gateway, served through Scalar at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::errors::ErrorBody;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Conversion Gateway",
        description = "Stateless file conversions: image resize and rotate, QR codes and barcodes, CSV to Excel, encrypted zip archives."
    ),
    paths(
        api::handlers::static_assets::index,
        api::handlers::images::resize_image,
        api::handlers::images::rotate_image,
        api::handlers::qr_codes::download_qr_code,
        api::handlers::barcodes::download_barcode,
        api::handlers::spreadsheets::csv_to_excel,
        api::handlers::archives::download_zip,
    ),
    components(
        schemas(
            ErrorBody,
            api::models::downloads::BinaryFile,
            api::models::forms::ImageUpload,
            api::models::forms::CsvUpload,
            api::models::forms::ZipUpload,
        )
    ),
    tags(
        (name = "assets", description = "Browser UI entry point."),
        (name = "images", description = "Re-encode uploaded images as JPEG after resizing or rotating them."),
        (name = "codes", description = "Render text as QR code or Code 128 barcode JPEGs."),
        (name = "spreadsheets", description = "Convert CSV uploads into styled, optionally password protected workbooks."),
        (name = "archives", description = "Bundle uploads into an AES-256 encrypted zip archive."),
    )
)]
pub struct ApiDoc;
