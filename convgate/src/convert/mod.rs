//! Synchronous conversion routines behind the HTTP handlers.
//!
//! Every function here is CPU bound and side-effect free: it takes request bytes or parameters,
//! calls into one codec library, and returns the encoded output. Handlers run them through
//! [`run_blocking`] so the async workers are never stalled by a codec call.

pub mod archive;
pub mod barcode;
pub mod imaging;
pub mod qr;
pub mod spreadsheet;

use crate::errors::{Error, Result};

/// Run a conversion on the blocking thread pool and wait for its result.
pub async fn run_blocking<T, F>(operation: &'static str, job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job).await.map_err(|e| Error::Internal {
        operation: format!("{operation}: {e}"),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_blocking_returns_job_result() {
        let value = run_blocking("add", || Ok(2 + 2)).await.unwrap();
        assert_eq!(value, 4);
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_job_error() {
        let err = run_blocking::<(), _>("fail", || Err(Error::bad_request("bad input")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_run_blocking_reports_panics_as_internal() {
        let err = run_blocking::<(), _>("explode", || panic!("boom")).await.unwrap_err();
        match err {
            Error::Internal { operation } => assert!(operation.starts_with("explode")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
