//! # pdfdeck
//!
//! Convert PDF documents into PowerPoint presentations, one slide per page.
//!
//! Every page is rasterized with PDFium and placed as a full-bleed picture on
//! its own slide of a newly written `.pptx` package.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> pdfdeck::Result<()> {
//!     // Writes slides.pptx next to the input
//!     let report = pdfdeck::convert("slides.pdf")?;
//!     println!("{} slides written to {}", report.pages, report.output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Page fidelity**: pages are rendered at 300 DPI by default
//! - **Slide sizing**: first-page aspect ratio, widescreen or standard
//! - **Picture encoding**: lossless PNG or JPEG for smaller decks
//! - **Safe output**: packages are written atomically
//! - **Read-back**: [`PackageSummary`] inspects a written deck

pub mod backend;
pub mod convert;
pub mod detect;
pub mod error;
pub mod pptx;
pub mod render;

// Re-export commonly used types
pub use backend::{MemorySource, PageSource, PdfiumBackend, PdfiumDocument};
pub use convert::{
    convert_file, convert_source, convert_with_progress, default_output_path, document_info,
    ConvertEvent, ConvertOptions, ConvertReport, DocumentInfo,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, resolve_input, PdfFormat};
pub use error::{Error, ErrorKind, Result};
pub use pptx::{
    PackageSummary, PictureFit, Presentation, SlideAssembler, SlideOptions, SlideSizing,
    SlideSummary,
};
pub use render::{ImageEncoding, ImageFormat, PageSize, RenderOptions, RenderedPage};

use std::path::{Path, PathBuf};

/// Convert a PDF into a presentation next to it (`input` with a `.pptx`
/// extension).
///
/// # Example
///
/// ```no_run
/// use pdfdeck::convert;
///
/// let report = convert("handout.pdf").unwrap();
/// assert_eq!(report.output, std::path::Path::new("handout.pptx"));
/// ```
pub fn convert<P: AsRef<Path>>(input: P) -> Result<ConvertReport> {
    convert_file(input.as_ref(), None, &ConvertOptions::default())
}

/// Convert a PDF into a presentation at `output`.
///
/// An existing file at `output` is replaced.
///
/// # Example
///
/// ```no_run
/// use pdfdeck::convert_to;
///
/// convert_to("handout.pdf", "out/handout.pptx").unwrap();
/// ```
pub fn convert_to<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<ConvertReport> {
    convert_file(
        input.as_ref(),
        Some(output.as_ref()),
        &ConvertOptions::default(),
    )
}

/// Convert a password-protected PDF.
///
/// # Example
///
/// ```no_run
/// use pdfdeck::convert_with_password;
///
/// convert_with_password("locked.pdf", "secret").unwrap();
/// ```
pub fn convert_with_password<P: AsRef<Path>>(input: P, password: &str) -> Result<ConvertReport> {
    let options = ConvertOptions::new().with_password(password);
    convert_file(input.as_ref(), None, &options)
}

/// Builder for configuring and running conversions.
///
/// # Example
///
/// ```no_run
/// use pdfdeck::{PdfDeck, PictureFit};
///
/// let report = PdfDeck::new()
///     .with_dpi(150.0)
///     .with_jpeg(85)
///     .widescreen()
///     .with_fit(PictureFit::Contain)
///     .convert_to("talk.pdf", "talk.pptx")?;
/// println!("{} bytes", report.bytes);
/// # Ok::<(), pdfdeck::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PdfDeck {
    options: ConvertOptions,
}

impl PdfDeck {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rendering resolution in DPI.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.options.render = self.options.render.with_dpi(dpi);
        self
    }

    /// Set the rendering scale relative to 72 DPI.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.options.render = self.options.render.with_scale(scale);
        self
    }

    /// Enable or disable annotation rendering.
    pub fn with_annotations(mut self, render: bool) -> Self {
        self.options.render = self.options.render.with_annotations(render);
        self
    }

    /// Store pictures as JPEG with the given quality.
    pub fn with_jpeg(mut self, quality: u8) -> Self {
        self.options.slides = self
            .options
            .slides
            .with_encoding(ImageEncoding::Jpeg { quality });
        self
    }

    /// Set the picture encoding.
    pub fn with_encoding(mut self, encoding: ImageEncoding) -> Self {
        self.options.slides = self.options.slides.with_encoding(encoding);
        self
    }

    /// Set the slide size policy.
    pub fn with_sizing(mut self, sizing: SlideSizing) -> Self {
        self.options.slides = self.options.slides.with_sizing(sizing);
        self
    }

    /// Use 16:9 slides.
    pub fn widescreen(self) -> Self {
        self.with_sizing(SlideSizing::widescreen())
    }

    /// Use 4:3 slides.
    pub fn standard(self) -> Self {
        self.with_sizing(SlideSizing::standard())
    }

    /// Set picture placement.
    pub fn with_fit(mut self, fit: PictureFit) -> Self {
        self.options.slides = self.options.slides.with_fit(fit);
        self
    }

    /// Set document password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.options = self.options.with_password(password);
        self
    }

    /// Use the PDFium library at `path`.
    pub fn with_pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_pdfium_library(path);
        self
    }

    /// Set the presentation title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.options = self.options.with_title(title);
        self
    }

    /// The accumulated options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a PDF next to itself.
    pub fn convert<P: AsRef<Path>>(&self, input: P) -> Result<ConvertReport> {
        convert_file(input.as_ref(), None, &self.options)
    }

    /// Convert a PDF into `output`.
    pub fn convert_to<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<ConvertReport> {
        convert_file(input.as_ref(), Some(output.as_ref()), &self.options)
    }

    /// Build a presentation from any page source without touching disk.
    pub fn build<S: PageSource + ?Sized>(&self, source: &S) -> Result<Presentation> {
        convert_source(source, &self.options, |_| {})
    }
}
