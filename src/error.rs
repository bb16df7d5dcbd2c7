//! Error types for pdfdeck library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfdeck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a PDF into a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input path does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The bytes are not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The input could not be opened as a PDF.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// The PDF header carries a version string we do not recognize.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The PDF document is encrypted and requires a password.
    #[error("Document is encrypted (a password is required)")]
    Encrypted,

    /// The provided password is incorrect.
    #[error("Invalid password")]
    InvalidPassword,

    /// The PDFium library could not be loaded.
    #[error("PDF rendering engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The document contains no pages.
    #[error("Document has no pages")]
    EmptyDocument,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// A page could not be rasterized.
    #[error("Failed to render page {page}: {reason}")]
    PageRender {
        /// 1-based page number
        page: usize,
        /// Engine-provided reason
        reason: String,
    },

    /// A slide could not be built from a rendered page.
    #[error("Presentation assembly error: {0}")]
    Assembly(String),

    /// The presentation could not be written to its destination.
    #[error("Failed to write {}: {source}", path.display())]
    OutputWrite {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A presentation package could not be read back.
    #[error("Package error: {0}")]
    Package(String),

    /// An option value is outside its accepted range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

/// Coarse classification of errors, one per failure stage of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input path does not exist.
    InputNotFound,
    /// The input is not a PDF we can open.
    UnsupportedInputFormat,
    /// A page could not be rendered.
    PageRenderFailure,
    /// Slides could not be assembled.
    PresentationAssemblyFailure,
    /// The output could not be written.
    OutputWriteFailure,
    /// Anything else (engine binding, options, generic I/O).
    Other,
}

impl Error {
    /// Classify this error by pipeline stage.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputNotFound(_) => ErrorKind::InputNotFound,
            Error::UnknownFormat
            | Error::UnsupportedFormat(_)
            | Error::UnsupportedVersion(_)
            | Error::Encrypted
            | Error::InvalidPassword => ErrorKind::UnsupportedInputFormat,
            Error::EmptyDocument | Error::PageOutOfRange(..) | Error::PageRender { .. } => {
                ErrorKind::PageRenderFailure
            }
            Error::Assembly(_) => ErrorKind::PresentationAssemblyFailure,
            Error::OutputWrite { .. } => ErrorKind::OutputWriteFailure,
            Error::Io(_)
            | Error::EngineUnavailable(_)
            | Error::Package(_)
            | Error::InvalidOption(_) => ErrorKind::Other,
        }
    }

    pub(crate) fn output_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::OutputWrite {
            path: path.into(),
            source,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Package(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Package(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Assembly(format!("image encoding failed: {}", err))
    }
}
