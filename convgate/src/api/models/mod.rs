//! Request and response types for the conversion endpoints.
//!
//! - [`queries`]: query string parameters, validated into typed values
//! - [`forms`]: buffered multipart forms and their OpenAPI request schemas
//! - [`downloads`]: attachment responses carrying the converted file

pub mod downloads;
pub mod forms;
pub mod queries;
