//! Password-protected zip archives.

use std::io::{Cursor, Write};

use zip::{AesMode, ZipWriter, result::ZipError, write::SimpleFileOptions};

use crate::errors::Result;

/// One file to place in the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub contents: Vec<u8>,
}

impl ArchiveEntry {
    /// Entry for an upload, named after the client file name without any directory part.
    /// `index` numbers the fallback name when the client sent none.
    pub fn from_upload(file_name: Option<&str>, index: usize, contents: Vec<u8>) -> Self {
        let name = file_name
            .map(base_name)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("file-{}", index + 1));
        Self { name, contents }
    }
}

/// Strip any directory components, whichever separator the client used.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Write every entry AES-256 encrypted under `password`. The first failing entry aborts the
/// whole archive.
pub fn build_archive(entries: &[ArchiveEntry], password: &str) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().with_aes_encryption(AesMode::Aes256, password);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in entries {
        writer.start_file(entry.name.as_str(), options)?;
        writer.write_all(&entry.contents).map_err(ZipError::from)?;
        tracing::debug!(name = %entry.name, bytes = entry.contents.len(), "added archive entry");
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use std::io::Read;
    use zip::ZipArchive;

    fn entry(name: &str, contents: &[u8]) -> ArchiveEntry {
        ArchiveEntry {
            name: name.to_string(),
            contents: contents.to_vec(),
        }
    }

    fn read_entry(archive: &[u8], name: &str, password: &[u8]) -> Vec<u8> {
        let mut archive = ZipArchive::new(Cursor::new(archive)).unwrap();
        let mut file = archive.by_name_decrypt(name, password).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        contents
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("x.txt"), "x.txt");
        assert_eq!(base_name("dir/sub/x.txt"), "x.txt");
        assert_eq!(base_name(r"C:\Users\me\x.txt"), "x.txt");
        assert_eq!(base_name("dir/"), "");
    }

    #[test]
    fn test_entry_name_falls_back_to_index() {
        assert_eq!(ArchiveEntry::from_upload(Some("a/b.csv"), 0, vec![]).name, "b.csv");
        assert_eq!(ArchiveEntry::from_upload(None, 0, vec![]).name, "file-1");
        assert_eq!(ArchiveEntry::from_upload(Some("dir/"), 2, vec![]).name, "file-3");
    }

    #[test]
    fn test_entries_are_aes_encrypted_and_decryptable() {
        let bytes = build_archive(&[entry("x.txt", b"first"), entry("y.txt", b"second file")], "p").unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(archive.len(), 2);
        for index in 0..archive.len() {
            assert!(archive.by_index_raw(index).unwrap().encrypted());
        }

        assert_eq!(read_entry(&bytes, "x.txt", b"p"), b"first");
        assert_eq!(read_entry(&bytes, "y.txt", b"p"), b"second file");
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let bytes = build_archive(&[entry("x.txt", b"secret")], "right").unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name_decrypt("x.txt", b"wrong").is_err());
    }

    #[test]
    fn test_duplicate_names_abort_the_archive() {
        let err = build_archive(&[entry("x.txt", b"1"), entry("x.txt", b"2")], "p").unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_empty_file_is_kept() {
        let bytes = build_archive(&[entry("empty.bin", b"")], "p").unwrap();
        assert!(read_entry(&bytes, "empty.bin", b"p").is_empty());
    }
}
