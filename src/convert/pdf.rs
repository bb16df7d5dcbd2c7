//! File-to-file conversion through PDFium.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{convert_source, default_output_path, ConvertEvent, ConvertOptions, ConvertReport};
use crate::backend::{PageSource, PdfiumBackend};
use crate::detect::resolve_input;
use crate::error::{Error, Result};
use crate::render::PageSize;

/// Convert `input` into a presentation at `output`, or next to the input
/// when `output` is `None`.
///
/// An existing file at the output path is replaced.
pub fn convert_file(
    input: &Path,
    output: Option<&Path>,
    options: &ConvertOptions,
) -> Result<ConvertReport> {
    convert_with_progress(input, output, options, |_| {})
}

/// Like [`convert_file`], reporting progress through `progress`.
pub fn convert_with_progress<F>(
    input: &Path,
    output: Option<&Path>,
    options: &ConvertOptions,
    mut progress: F,
) -> Result<ConvertReport>
where
    F: FnMut(ConvertEvent),
{
    options.validate()?;

    let format = resolve_input(input)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));
    if same_file(input, &output) {
        return Err(Error::InvalidOption(format!(
            "output {} would overwrite the input",
            output.display()
        )));
    }

    let mut options = options.clone();
    if options.title.is_none() {
        options.title = input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string);
    }

    let backend = PdfiumBackend::bind_with(options.pdfium_library.as_deref())?;
    let presentation = {
        let document = backend.open(input, options.password.as_deref())?;
        convert_source(&document, &options, &mut progress)?
    };

    progress(ConvertEvent::Writing);
    presentation.save(&output)?;
    let bytes = fs::metadata(&output)
        .map_err(|e| Error::output_write(&output, e))?
        .len();
    progress(ConvertEvent::Finished);

    Ok(ConvertReport {
        input: input.to_path_buf(),
        output,
        pdf_version: format.version,
        pages: presentation.slide_count(),
        slide_width: presentation.slide_width(),
        slide_height: presentation.slide_height(),
        dpi: options.render.dpi(),
        image_format: options.slides.encoding.format(),
        bytes,
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Page-level facts about a PDF.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    /// Path of the PDF
    pub path: PathBuf,
    /// PDF header version
    pub pdf_version: String,
    /// Number of pages
    pub page_count: usize,
    /// Size of each page in points
    pub pages: Vec<PageSize>,
}

impl DocumentInfo {
    /// Collect page facts from an open source.
    pub fn from_source<S: PageSource + ?Sized>(
        path: &Path,
        pdf_version: String,
        source: &S,
    ) -> Result<Self> {
        let pages = source.page_sizes()?;
        Ok(Self {
            path: path.to_path_buf(),
            pdf_version,
            page_count: pages.len(),
            pages,
        })
    }

    /// Pixel size of each page at the resolution in `options`.
    pub fn pixel_sizes(&self, options: &ConvertOptions) -> Vec<(u32, u32)> {
        self.pages
            .iter()
            .map(|p| options.render.pixel_size(p.width, p.height))
            .collect()
    }
}

/// Open `path` and report its pages without rendering them.
pub fn document_info(path: &Path, options: &ConvertOptions) -> Result<DocumentInfo> {
    options.render.validate()?;
    let format = resolve_input(path)?;
    let backend = PdfiumBackend::bind_with(options.pdfium_library.as_deref())?;
    let document = backend.open(path, options.password.as_deref())?;
    DocumentInfo::from_source(path, format.version, &document)
}
