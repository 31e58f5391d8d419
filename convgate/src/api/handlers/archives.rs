use axum::extract::{Multipart, multipart::MultipartRejection};
use tracing::{debug, instrument};

use crate::{
    api::models::{
        downloads::{BinaryFile, Download},
        forms::{FormData, ZipUpload},
    },
    convert::{
        archive::{self, ArchiveEntry},
        run_blocking,
    },
    errors::{Error, ErrorBody, Result},
};

/// Form field names accepted for archive members
const FILE_FIELDS: [&str; 2] = ["files", "files[]"];

/// Pack the uploaded files into an AES-256 encrypted zip
#[utoipa::path(
    post,
    path = "/zip/download",
    tag = "archives",
    summary = "Create encrypted zip",
    description = "Adds every uploaded file as an AES-256 encrypted entry named after the upload's file name. If any entry fails the whole archive is discarded.",
    request_body(content = ZipUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Zip archive", content_type = "application/zip", body = BinaryFile),
        (status = 400, description = "No files uploaded or an entry could not be written", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn download_zip(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Download> {
    let mut form = FormData::read(multipart?).await?;
    let password = form.text("password")?;
    let entries: Vec<ArchiveEntry> = form
        .take_files(&FILE_FIELDS)
        .into_iter()
        .enumerate()
        .map(|(index, part)| ArchiveEntry::from_upload(part.file_name.as_deref(), index, part.bytes.to_vec()))
        .collect();
    if entries.is_empty() {
        return Err(Error::bad_request("No files"));
    }
    debug!(files = entries.len(), "building zip archive");

    let zip = run_blocking("build zip archive", move || archive::build_archive(&entries, &password)).await?;

    Ok(Download::zip(zip))
}
