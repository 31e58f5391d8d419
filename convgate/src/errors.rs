use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed or missing input (form file, query parameter, form field)
    #[error("{message}")]
    BadRequest { message: String },

    /// Image could not be decoded or encoded
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// QR encoder rejected the content
    #[error(transparent)]
    QrCode(#[from] qrcode::types::QrError),

    /// Barcode symbology rejected the content
    #[error("{message}")]
    Barcode { message: String },

    /// Neither symbology encodes an empty string
    #[error("cannot encode empty content as {symbology}")]
    EmptyContent { symbology: &'static str },

    /// Uploaded CSV could not be parsed
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Workbook styling or serialisation failed
    #[error(transparent)]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// Workbook encryption failed
    #[error("{message}")]
    Encryption { message: String },

    /// Building the encrypted archive failed; the whole archive is discarded
    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human readable description of what went wrong
    #[schema(example = "missing form file `image`")]
    pub error: String,
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } | Error::Archive(_) => StatusCode::BAD_REQUEST,
            Error::Image(_)
            | Error::QrCode(_)
            | Error::Barcode { .. }
            | Error::EmptyContent { .. }
            | Error::Csv(_)
            | Error::Spreadsheet(_)
            | Error::Encryption { .. }
            | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Image(_)
            | Error::QrCode(_)
            | Error::Barcode { .. }
            | Error::EmptyContent { .. }
            | Error::Csv(_)
            | Error::Spreadsheet(_)
            | Error::Encryption { .. } => {
                tracing::warn!("Conversion failed: {}", self);
            }
            Error::BadRequest { .. } | Error::Archive(_) => {
                tracing::debug!("Client error: {}", self);
            }
        }

        // Library errors are reported verbatim
        let body = ErrorBody { error: self.to_string() };
        (self.status_code(), Json(body)).into_response()
    }
}

// Extractor rejections are reported through the JSON envelope rather than axum's plain text body.

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::bad_request(format!("Failed to parse multipart data: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        Error::bad_request(format!("Failed to read multipart field: {}", err.body_text()))
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::bad_request(rejection.body_text())
    }
}

/// Type alias for handler and conversion results
pub type Result<T> = std::result::Result<T, Error>;
