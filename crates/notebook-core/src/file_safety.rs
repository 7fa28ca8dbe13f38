//! Upload validation for documents sent to text extraction.
//!
//! Checks run on the client before any network call:
//! 1. Declared content type must be a PDF
//! 2. Size must not exceed the configured limit
//! 3. The file must not be empty

use std::path::Path;

use crate::error::{Error, Result};

/// A document selected for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, detecting its content type from magic bytes
    /// and falling back to the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = detect_content_type(&file_name, &bytes);
        Ok(Self {
            file_name: sanitize_filename(&file_name),
            mime_type,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File name without its extension, used as a suggested note title.
    pub fn stem(&self) -> &str {
        match self.file_name.rfind('.') {
            Some(0) | None => &self.file_name,
            Some(pos) => &self.file_name[..pos],
        }
    }
}

/// Whether a content type denotes a PDF document.
pub fn is_pdf_mime(mime: &str) -> bool {
    mime.to_ascii_lowercase().contains("pdf")
}

/// Validate an upload against the content type and size rules.
pub fn validate_upload(file: &UploadFile, max_size_bytes: u64) -> Result<()> {
    if !is_pdf_mime(&file.mime_type) {
        return Err(Error::Validation(format!(
            "Only PDF documents can be uploaded (got {})",
            if file.mime_type.is_empty() {
                "unknown type"
            } else {
                file.mime_type.as_str()
            }
        )));
    }
    check_size(&file.bytes, max_size_bytes)
}

/// Size rules shared by validation and the extraction client.
pub fn check_size(bytes: &[u8], max_size_bytes: u64) -> Result<()> {
    let size = bytes.len() as u64;
    if size > max_size_bytes {
        return Err(Error::PayloadTooLarge {
            size,
            limit: max_size_bytes,
        });
    }
    if size == 0 {
        return Err(Error::Validation("File is empty".to_string()));
    }
    Ok(())
}

/// Detect the content type of a file from its magic bytes, falling back to
/// the extension, then to `application/octet-stream`.
pub fn detect_content_type(filename: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    // Binary formats with magic bytes are deliberately absent here: a .pdf
    // whose bytes do not match is not a PDF.
    let ext = filename.rsplit('.').next().unwrap_or_default();
    match ext.to_lowercase().as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Strip path components and unsafe characters from a file name.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        "document.pdf".to_string()
    } else {
        sanitized.to_string()
    }
}
