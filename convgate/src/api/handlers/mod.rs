//! HTTP request handlers for all endpoints.
//!
//! Each conversion handler:
//! - reads its multipart form or query string, reporting bad input as 400
//! - runs one conversion from [`crate::convert`] on the blocking thread pool
//! - returns the complete result as a [`Download`](crate::api::models::downloads::Download)
//!
//! # Handler Modules
//!
//! - [`archives`]: password-protected zip archives
//! - [`barcodes`]: Code 128 barcode images
//! - [`images`]: image resize and rotate
//! - [`qr_codes`]: QR code images
//! - [`spreadsheets`]: CSV to `.xlsx` conversion
//! - [`static_assets`]: the index document
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to a JSON `{"error": ...}` body with
//! the matching status code.

pub mod archives;
pub mod barcodes;
pub mod images;
pub mod qr_codes;
pub mod spreadsheets;
pub mod static_assets;
