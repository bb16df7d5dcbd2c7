//! Input resolution: existence check and PDF header detection.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Resolve an input path to a PDF we can hand to the renderer.
///
/// Fails with [`Error::InputNotFound`] when nothing exists at `path`, and with
/// [`Error::UnsupportedFormat`] when the path is not a regular file, cannot be
/// read, or does not start with a PDF header. A PDF with an unusual extension is accepted.
///
/// # Example
/// ```no_run
/// use pdfdeck::detect::resolve_input;
///
/// let format = resolve_input("slides.pdf").unwrap();
/// println!("{}", format);
/// ```
pub fn resolve_input<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(Error::UnsupportedFormat(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let has_pdf_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !has_pdf_ext {
        log::warn!(
            "{} does not have a .pdf extension, checking content",
            path.display()
        );
    }

    let format = detect_format_from_path(path).map_err(|e| match e {
        Error::UnknownFormat => {
            Error::UnsupportedFormat(format!("{} is not a PDF file", path.display()))
        }
        Error::Io(io) => {
            Error::UnsupportedFormat(format!("{} cannot be read: {}", path.display(), io))
        }
        other => other,
    })?;
    log::debug!("{}: {}", path.display(), format);
    Ok(format)
}

/// Detect PDF format from a file path.
///
/// Short files are reported as unknown rather than as I/O errors.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(16);
    file.by_ref().take(16).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect PDF format from bytes.
///
/// # Arguments
/// * `data` - Byte slice containing at least the first 8 bytes of the file
///
/// # Returns
/// * `Ok(PdfFormat)` if the data starts with valid PDF header
/// * `Err(Error::UnknownFormat)` if the data is not a PDF
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfFormat { version })
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if a file is a valid PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes represent a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
