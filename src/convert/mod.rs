//! PDF to presentation conversion pipeline.
//!
//! Pages are rendered strictly in order and each becomes one slide. The
//! first failure aborts the conversion and nothing is written.
//!
//! # Example
//!
//! ```no_run
//! use pdfdeck::convert::{convert_file, ConvertOptions};
//! use std::path::Path;
//!
//! fn main() -> pdfdeck::Result<()> {
//!     let report = convert_file(Path::new("slides.pdf"), None, &ConvertOptions::default())?;
//!     println!("{} slides -> {}", report.pages, report.output.display());
//!     Ok(())
//! }
//! ```

mod pdf;

pub use pdf::{convert_file, convert_with_progress, document_info, DocumentInfo};

use crate::backend::PageSource;
use crate::error::Result;
use crate::pptx::{Presentation, SlideAssembler, SlideOptions};
use crate::render::{ImageFormat, RenderOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Options for a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Rasterization options
    pub render: RenderOptions,

    /// Slide assembly options
    pub slides: SlideOptions,

    /// Password for encrypted documents
    pub password: Option<String>,

    /// Explicit PDFium library (file or directory); searched for when unset
    pub pdfium_library: Option<PathBuf>,

    /// Title stored in the package; defaults to the input file stem
    pub title: Option<String>,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rasterization options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Set slide assembly options.
    pub fn with_slide_options(mut self, options: SlideOptions) -> Self {
        self.slides = options;
        self
    }

    /// Set document password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Use the PDFium library at `path`.
    pub fn with_pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdfium_library = Some(path.into());
        self
    }

    /// Set the presentation title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Check every option value.
    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        self.slides.validate()
    }
}

/// Progress notifications emitted during a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertEvent {
    /// The document was opened.
    Started {
        /// Total pages
        pages: usize,
    },
    /// A page was rendered and added as a slide.
    PageRendered {
        /// 1-based page number
        page: usize,
        /// Total pages
        total: usize,
    },
    /// The package is being written.
    Writing,
    /// The package was written.
    Finished,
}

/// Summary of a completed conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    /// Input PDF
    pub input: PathBuf,
    /// Written presentation
    pub output: PathBuf,
    /// PDF header version
    pub pdf_version: String,
    /// Number of pages converted (equals the number of slides)
    pub pages: usize,
    /// Slide width in EMUs
    pub slide_width: i64,
    /// Slide height in EMUs
    pub slide_height: i64,
    /// Rendering resolution
    pub dpi: f32,
    /// Media format of the slide pictures
    pub image_format: ImageFormat,
    /// Size of the written package in bytes
    pub bytes: u64,
}

/// Default output path for `input`: the same path with a `.pptx` extension.
///
/// # Example
/// ```
/// use pdfdeck::convert::default_output_path;
/// use std::path::Path;
///
/// assert_eq!(
///     default_output_path(Path::new("decks/q3.pdf")),
///     Path::new("decks/q3.pptx")
/// );
/// ```
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("pptx")
}

/// Render every page of `source` and assemble one slide per page.
///
/// A source without pages yields [`crate::Error::EmptyDocument`].
pub fn convert_source<S, F>(source: &S, options: &ConvertOptions, mut progress: F) -> Result<Presentation>
where
    S: PageSource + ?Sized,
    F: FnMut(ConvertEvent),
{
    options.validate()?;

    let total = source.page_count();
    log::info!("Converting {} pages at {:.0} DPI", total, options.render.dpi());
    progress(ConvertEvent::Started { pages: total });

    let mut assembler = SlideAssembler::new(options.slides);
    if let Some(ref title) = options.title {
        assembler.set_title(title.clone());
    }

    for index in 0..total {
        let page = source.render_page(index, &options.render)?;
        log::debug!(
            "Page {}/{} rendered at {}x{} px",
            index + 1,
            total,
            page.width(),
            page.height()
        );
        assembler.add_slide(page)?;
        progress(ConvertEvent::PageRendered {
            page: index + 1,
            total,
        });
    }

    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemorySource;
    use crate::error::Error;
    use crate::render::{PageSize, RenderedPage};
    use image::{DynamicImage, Rgb, RgbImage};

    fn source(pages: usize) -> MemorySource {
        (0..pages)
            .map(|i| {
                DynamicImage::ImageRgb8(RgbImage::from_pixel(
                    20 + i as u32,
                    10,
                    Rgb([0, 0, 0]),
                ))
            })
            .collect()
    }

    /// Fails on one page, renders the rest.
    struct FailingSource {
        inner: MemorySource,
        fail_at: usize,
    }

    impl PageSource for FailingSource {
        fn page_count(&self) -> usize {
            self.inner.page_count()
        }

        fn page_size(&self, index: usize) -> Result<PageSize> {
            self.inner.page_size(index)
        }

        fn render_page(&self, index: usize, options: &RenderOptions) -> Result<RenderedPage> {
            if index == self.fail_at {
                return Err(Error::PageRender {
                    page: index + 1,
                    reason: "corrupt content stream".into(),
                });
            }
            self.inner.render_page(index, options)
        }
    }

    fn one_to_one() -> ConvertOptions {
        ConvertOptions::new().with_render_options(RenderOptions::new().with_scale(1.0))
    }

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .with_password("secret")
            .with_title("Deck")
            .with_pdfium_library("/opt/pdfium");

        assert_eq!(options.password.as_deref(), Some("secret"));
        assert_eq!(options.title.as_deref(), Some("Deck"));
        assert_eq!(options.pdfium_library, Some(PathBuf::from("/opt/pdfium")));
        assert!((options.render.dpi() - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("report.pdf")),
            PathBuf::from("report.pptx")
        );
        assert_eq!(
            default_output_path(Path::new("scan")),
            PathBuf::from("scan.pptx")
        );
    }

    #[test]
    fn test_convert_source_one_slide_per_page() {
        let mut events = Vec::new();
        let pres = convert_source(&source(3), &one_to_one(), |e| events.push(e)).unwrap();

        assert_eq!(pres.slide_count(), 3);
        let widths: Vec<u32> = pres.slides().iter().map(|s| s.picture().image.width).collect();
        assert_eq!(widths, vec![20, 21, 22]);

        assert_eq!(events.first(), Some(&ConvertEvent::Started { pages: 3 }));
        assert_eq!(
            events.last(),
            Some(&ConvertEvent::PageRendered { page: 3, total: 3 })
        );
    }

    #[test]
    fn test_convert_source_empty() {
        let result = convert_source(&MemorySource::new(), &one_to_one(), |_| {});
        assert!(matches!(result, Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_convert_source_aborts_on_render_failure() {
        let failing = FailingSource {
            inner: source(4),
            fail_at: 2,
        };
        let mut rendered = 0;
        let result = convert_source(&failing, &one_to_one(), |e| {
            if let ConvertEvent::PageRendered { .. } = e {
                rendered += 1;
            }
        });
        assert!(matches!(result, Err(Error::PageRender { page: 3, .. })));
        assert_eq!(rendered, 2);
    }

    #[test]
    fn test_convert_source_rejects_invalid_options() {
        let options = ConvertOptions::new().with_render_options(RenderOptions::new().with_dpi(5000.0));
        let result = convert_source(&source(1), &options, |_| {});
        assert!(matches!(result, Err(Error::InvalidOption(_))));
    }

    #[test]
    fn test_convert_source_sets_title() {
        let options = one_to_one().with_title("Quarterly");
        let pres = convert_source(&source(1), &options, |_| {}).unwrap();
        assert_eq!(pres.title(), Some("Quarterly"));
    }
}
