use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use utoipa::ToSchema;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

const JPEG_DISPOSITION: &str = "attachment;filename=output.jpg";
const XLSX_DISPOSITION: &str = r#"attachment; filename="output.xlsx""#;
const ZIP_DISPOSITION: &str = r#"attachment; filename="output.zip""#;

/// Raw file bytes, documented as a binary string
#[derive(ToSchema)]
#[schema(value_type = String, format = Binary)]
pub struct BinaryFile(pub Vec<u8>);

/// A converted file sent back as an attachment.
///
/// The body is complete before the response starts, so a conversion failure always surfaces as
/// an error status rather than a truncated download.
#[derive(Debug)]
pub struct Download {
    content_type: &'static str,
    disposition: &'static str,
    body: Vec<u8>,
}

impl Download {
    pub fn jpeg(body: Vec<u8>) -> Self {
        Self {
            content_type: JPEG_CONTENT_TYPE,
            disposition: JPEG_DISPOSITION,
            body,
        }
    }

    pub fn xlsx(body: Vec<u8>) -> Self {
        Self {
            content_type: XLSX_CONTENT_TYPE,
            disposition: XLSX_DISPOSITION,
            body,
        }
    }

    pub fn zip(body: Vec<u8>) -> Self {
        Self {
            content_type: ZIP_CONTENT_TYPE,
            disposition: ZIP_DISPOSITION,
            body,
        }
    }
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, self.content_type),
                (header::CONTENT_DISPOSITION, self.disposition),
            ],
            self.body,
        )
            .into_response()
    }
}
