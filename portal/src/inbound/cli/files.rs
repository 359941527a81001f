//! Attachment file access for the CLI.
//!
//! Files are opened through `cap_std` handles on their parent directory.

use std::io::{self, Read, Write};
use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};

use crate::domain::FileUpload;

/// Read `path` into an upload, guessing the MIME type when none is given.
pub(crate) fn read_upload(path: &Path, mime_type: Option<String>) -> io::Result<FileUpload> {
    let (dir, file_name) = open_parent(path)?;
    let mut file = dir.open(file_name).map_err(|error| {
        io::Error::other(format!("open attachment '{}': {error}", path.display()))
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|error| {
        io::Error::other(format!("read attachment '{}': {error}", path.display()))
    })?;
    Ok(FileUpload {
        file_name: file_name.to_owned(),
        mime_type: mime_type.unwrap_or_else(|| guess_mime_type(file_name).to_owned()),
        bytes,
    })
}

/// Write `bytes` to `path`, replacing any existing file.
pub(crate) fn write_export(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let (dir, file_name) = open_parent(path)?;
    let mut file = dir.create(file_name).map_err(|error| {
        io::Error::other(format!("create export '{}': {error}", path.display()))
    })?;
    file.write_all(bytes)
}

fn open_parent(path: &Path) -> io::Result<(Dir, &str)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' must name a UTF-8 file", path.display()),
            )
        })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
        io::Error::other(format!("open directory '{}': {error}", parent.display()))
    })?;
    Ok((dir, file_name))
}

fn guess_mime_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "js" => "application/javascript",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for attachment file helpers.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("notes.TXT", "text/plain")]
    #[case("scan.pdf", "application/pdf")]
    #[case("archive.tar.gz", "application/octet-stream")]
    #[case("README", "application/octet-stream")]
    fn guesses_common_types(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(guess_mime_type(name), expected);
    }

    #[rstest]
    fn reads_and_exports_through_the_parent_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("hello.txt");
        write_export(&source, b"hello").expect("write");

        let upload = read_upload(&source, None).expect("read");
        assert_eq!(upload.file_name, "hello.txt");
        assert_eq!(upload.mime_type, "text/plain");
        assert_eq!(upload.bytes, b"hello");
    }
}
