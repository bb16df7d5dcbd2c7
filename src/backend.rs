//! Page source abstraction layer.
//!
//! Provides a trait-based interface for the operations the converter needs
//! from a document, isolating the concrete rendering engine (PDFium) from the
//! slide assembly logic.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::DynamicImage;
use pdfium_render::prelude::*;

use crate::error::{Error, Result};
use crate::render::{PageSize, RenderOptions, RenderedPage};

/// Abstract interface for a paginated, rasterizable document.
///
/// Pages are addressed by 0-based index and accessed strictly in sequence by
/// the converter.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Size of the page at `index` in points.
    fn page_size(&self, index: usize) -> Result<PageSize>;

    /// Rasterize the page at `index`.
    fn render_page(&self, index: usize, options: &RenderOptions) -> Result<RenderedPage>;

    /// Sizes of all pages, in page order.
    fn page_sizes(&self) -> Result<Vec<PageSize>> {
        (0..self.page_count()).map(|i| self.page_size(i)).collect()
    }
}

fn check_index(index: usize, count: usize) -> Result<()> {
    if index >= count {
        return Err(Error::PageOutOfRange(index + 1, count));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PdfiumBackend: concrete implementation backed by pdfium-render
// ---------------------------------------------------------------------------

/// Directories searched for the PDFium shared library before falling back to
/// the system library path.
fn pdfium_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.join("libs"));
            paths.push(exe_dir.to_path_buf());
        }
    }

    paths.push(PathBuf::from("libs"));
    paths.push(PathBuf::from("./"));

    paths
}

/// Loaded PDFium engine. Documents opened from it borrow the engine.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind to PDFium, looking next to the executable, in `./libs`, in the
    /// working directory and finally in the system library path.
    pub fn bind() -> Result<Self> {
        for dir in pdfium_search_paths() {
            let lib_path = Pdfium::pdfium_platform_library_name_at_path(&dir);
            log::debug!("Trying PDFium at {:?}", lib_path);

            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                log::info!("Loaded PDFium from {:?}", lib_path);
                return Ok(Self {
                    pdfium: Pdfium::new(bindings),
                });
            }
        }

        log::debug!("Trying system PDFium library");
        let bindings = Pdfium::bind_to_system_library().map_err(|e| {
            Error::EngineUnavailable(format!(
                "PDFium library not found ({:?}); place it next to the executable or pass its path explicitly",
                e
            ))
        })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Bind to the PDFium shared library at `path`.
    ///
    /// `path` may name the library file itself or the directory containing it.
    pub fn bind_to_library<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let lib_path = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(path)
        } else {
            path.to_path_buf()
        };

        let bindings = Pdfium::bind_to_library(&lib_path).map_err(|e| {
            Error::EngineUnavailable(format!("cannot load {}: {:?}", lib_path.display(), e))
        })?;
        log::info!("Loaded PDFium from {:?}", lib_path);
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Bind to an explicit library when given, otherwise search for one.
    pub fn bind_with(library: Option<&Path>) -> Result<Self> {
        match library {
            Some(path) => Self::bind_to_library(path),
            None => Self::bind(),
        }
    }

    /// The bound PDFium instance.
    pub fn pdfium(&self) -> &Pdfium {
        &self.pdfium
    }

    /// Open a PDF file.
    pub fn open<'a>(&'a self, path: &Path, password: Option<&'a str>) -> Result<PdfiumDocument<'a>> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| map_load_error(e, password.is_some()))?;
        Ok(PdfiumDocument { document })
    }

    /// Open a PDF held in memory.
    pub fn open_bytes<'a>(
        &'a self,
        data: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<PdfiumDocument<'a>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(data, password)
            .map_err(|e| map_load_error(e, password.is_some()))?;
        Ok(PdfiumDocument { document })
    }
}

fn map_load_error(err: PdfiumError, password_supplied: bool) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            if password_supplied {
                Error::InvalidPassword
            } else {
                Error::Encrypted
            }
        }
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError) => {
            Error::UnsupportedFormat("file is not a readable PDF document".into())
        }
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::SecurityError) => {
            Error::UnsupportedFormat("unsupported PDF security handler".into())
        }
        other => Error::UnsupportedFormat(format!("{:?}", other)),
    }
}

/// An open PDF document. The handle is closed when this value is dropped.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>> {
        check_index(index, self.page_count())?;
        self.document
            .pages()
            .get(index as PdfPageIndex)
            .map_err(|e| Error::PageRender {
                page: index + 1,
                reason: format!("{:?}", e),
            })
    }
}

impl PageSource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<PageSize> {
        let page = self.page(index)?;
        Ok(PageSize::new(page.width().value, page.height().value))
    }

    fn render_page(&self, index: usize, options: &RenderOptions) -> Result<RenderedPage> {
        let page = self.page(index)?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(options.scale)
            .render_annotations(options.render_annotations);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| Error::PageRender {
                page: index + 1,
                reason: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        log::debug!(
            "Page {}: {:.1}x{:.1} pt -> {}x{} px",
            index + 1,
            page.width().value,
            page.height().value,
            image.width(),
            image.height()
        );

        Ok(RenderedPage::new(index, image))
    }
}

// ---------------------------------------------------------------------------
// MemorySource: pre-rasterized pages held in memory
// ---------------------------------------------------------------------------

/// A [`PageSource`] over bitmaps that are already in memory.
///
/// Each bitmap is treated as a page measured at 72 DPI, so one pixel equals
/// one point; rendering resamples it to the requested scale.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<DynamicImage>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page.
    pub fn push(&mut self, image: DynamicImage) {
        self.pages.push(image);
    }

    /// Builder-style append.
    pub fn with_page(mut self, image: DynamicImage) -> Self {
        self.push(image);
        self
    }
}

impl FromIterator<DynamicImage> for MemorySource {
    fn from_iter<I: IntoIterator<Item = DynamicImage>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}

impl PageSource for MemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<PageSize> {
        check_index(index, self.pages.len())?;
        let image = &self.pages[index];
        Ok(PageSize::new(image.width() as f32, image.height() as f32))
    }

    fn render_page(&self, index: usize, options: &RenderOptions) -> Result<RenderedPage> {
        let size = self.page_size(index)?;
        let (width, height) = options.pixel_size(size.width, size.height);
        let image = &self.pages[index];

        let image = if (width, height) == (image.width(), image.height()) {
            image.clone()
        } else {
            image.resize_exact(width, height, FilterType::Triangle)
        };
        Ok(RenderedPage::new(index, image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 20, 30])))
    }

    #[test]
    fn test_memory_source_pages() {
        let source: MemorySource = vec![solid(100, 50), solid(40, 80)].into_iter().collect();
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page_size(1).unwrap(), PageSize::new(40.0, 80.0));
        assert_eq!(source.page_sizes().unwrap().len(), 2);
    }

    #[test]
    fn test_memory_source_render_scales() {
        let source = MemorySource::new().with_page(solid(100, 50));
        let page = source
            .render_page(0, &RenderOptions::new().with_scale(2.0))
            .unwrap();
        assert_eq!((page.width(), page.height()), (200, 100));
        assert_eq!(page.index(), 0);
    }

    #[test]
    fn test_memory_source_out_of_range() {
        let source = MemorySource::new().with_page(solid(10, 10));
        let result = source.render_page(3, &RenderOptions::default());
        assert!(matches!(result, Err(Error::PageOutOfRange(4, 1))));
    }

    #[test]
    fn test_map_load_error_password() {
        let err = || PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError);
        assert!(matches!(map_load_error(err(), false), Error::Encrypted));
        assert!(matches!(map_load_error(err(), true), Error::InvalidPassword));
    }

    #[test]
    fn test_map_load_error_format() {
        let err = PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError);
        assert!(matches!(
            map_load_error(err, false),
            Error::UnsupportedFormat(_)
        ));
    }
}
