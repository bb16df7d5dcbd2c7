//! Page rasterization types shared by every page source.

mod options;
mod page;

pub use options::{RenderOptions, DEFAULT_DPI, MAX_DPI, POINTS_PER_INCH};
pub use page::{EncodedImage, ImageEncoding, ImageFormat, PageSize, RenderedPage};
