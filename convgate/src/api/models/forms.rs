//! Multipart form handling.
//!
//! Conversions need the whole upload in memory anyway, so forms are read completely before a
//! handler inspects them. The request body limit bounds the total size.

use axum::extract::Multipart;
use bytes::Bytes;
use utoipa::ToSchema;

use super::downloads::BinaryFile;
use crate::errors::{Error, Result};

/// One part of a multipart form
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    /// Client supplied file name, absent for plain text fields
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// A fully buffered multipart form
#[derive(Debug, Default)]
pub struct FormData {
    parts: Vec<FormPart>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            tracing::trace!(field = %name, file_name = ?file_name, bytes = bytes.len(), "read form part");
            parts.push(FormPart { name, file_name, bytes });
        }
        Ok(Self { parts })
    }

    /// Remove and return the first part called `name`.
    pub fn take_file(&mut self, name: &str) -> Result<FormPart> {
        let index = self
            .parts
            .iter()
            .position(|part| part.name == name)
            .ok_or_else(|| Error::bad_request(format!("missing form file `{name}`")))?;
        Ok(self.parts.remove(index))
    }

    /// Remove and return every part whose name is one of `names`, in upload order.
    pub fn take_files(&mut self, names: &[&str]) -> Vec<FormPart> {
        let (taken, rest): (Vec<FormPart>, Vec<FormPart>) = std::mem::take(&mut self.parts)
            .into_iter()
            .partition(|part| names.contains(&part.name.as_str()));
        self.parts = rest;
        taken
    }

    /// Value of the text field `name`; an absent field reads as empty.
    pub fn text(&self, name: &str) -> Result<String> {
        match self.parts.iter().find(|part| part.name == name) {
            Some(part) => String::from_utf8(part.bytes.to_vec())
                .map_err(|_| Error::bad_request(format!("form field `{name}` is not valid UTF-8"))),
            None => Ok(String::new()),
        }
    }
}

/// Form for the image endpoints
#[derive(Debug, ToSchema)]
pub struct ImageUpload {
    /// Image in any supported format (PNG, JPEG, GIF, BMP, WebP, TIFF, ...)
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Form for the CSV to spreadsheet endpoint
#[derive(Debug, ToSchema)]
pub struct CsvUpload {
    /// Comma separated values, every record with the same number of fields
    #[schema(value_type = String, format = Binary)]
    pub csv: Vec<u8>,
    /// Password required to open the workbook; empty for none
    pub password: Option<String>,
    /// Header row fill as `RRGGBB` or `#RRGGBB`; empty for none
    #[schema(example = "#FFCC00")]
    pub colorcode: Option<String>,
}

/// Form for the zip endpoint
#[derive(Debug, ToSchema)]
pub struct ZipUpload {
    /// Files to archive, sent as repeated `files` or `files[]` parts
    #[schema(value_type = Vec<BinaryFile>)]
    pub files: Vec<Vec<u8>>,
    /// Password protecting every entry
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str, file_name: Option<&str>, bytes: &'static [u8]) -> FormPart {
        FormPart {
            name: name.to_string(),
            file_name: file_name.map(str::to_string),
            bytes: Bytes::from_static(bytes),
        }
    }

    fn form(parts: Vec<FormPart>) -> FormData {
        FormData { parts }
    }

    #[test]
    fn test_take_file() {
        let mut data = form(vec![part("password", None, b"pw"), part("csv", Some("a.csv"), b"a,b")]);
        let csv = data.take_file("csv").unwrap();
        assert_eq!(csv.file_name.as_deref(), Some("a.csv"));
        assert_eq!(&csv.bytes[..], b"a,b");

        let err = data.take_file("csv").unwrap_err();
        assert_eq!(err.to_string(), "missing form file `csv`");
    }

    #[test]
    fn test_take_files_keeps_order_across_names() {
        let mut data = form(vec![
            part("files[]", Some("x.txt"), b"x"),
            part("password", None, b"p"),
            part("files", Some("y.txt"), b"y"),
        ]);
        let files = data.take_files(&["files", "files[]"]);
        let names: Vec<_> = files.iter().filter_map(|f| f.file_name.as_deref()).collect();
        assert_eq!(names, ["x.txt", "y.txt"]);
        assert_eq!(data.text("password").unwrap(), "p");
    }

    #[test]
    fn test_text_defaults_to_empty() {
        let data = form(vec![part("colorcode", None, b"#FF0000")]);
        assert_eq!(data.text("colorcode").unwrap(), "#FF0000");
        assert_eq!(data.text("password").unwrap(), "");
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let data = form(vec![part("password", None, &[0xff, 0xfe])]);
        assert!(matches!(data.text("password"), Err(Error::BadRequest { .. })));
    }
}
