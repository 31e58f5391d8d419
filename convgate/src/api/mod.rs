//! HTTP layer: route handlers and the request/response types they exchange.
//!
//! - **[`handlers`]**: Axum handlers, one module per conversion family
//! - **[`models`]**: Query parameters, multipart form parsing and download responses
//!
//! # Endpoints
//!
//! - **Assets** (`/`, `/src/*`): index document and static files for the browser UI
//! - **Images** (`/resize/download`, `/rotate/download`): JPEG re-encoding of uploaded images
//! - **Codes** (`/qrcode/download`, `/barcode/download`): QR and Code 128 images
//! - **Spreadsheets** (`/csv/excel/download`): CSV to styled, optionally encrypted `.xlsx`
//! - **Archives** (`/zip/download`): AES-256 encrypted zip of the uploaded files
//!
//! All endpoints are annotated with `utoipa`; the reference UI is served at `/docs`.

pub mod handlers;
pub mod models;
