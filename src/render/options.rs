//! Rasterization options.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// PDF user space unit: 72 points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Resolution used when nothing else is configured.
pub const DEFAULT_DPI: f32 = 300.0;

/// Highest accepted resolution.
pub const MAX_DPI: f32 = 1200.0;

/// Options for rasterizing PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Resolution multiplier relative to 72 DPI (1.0 = one pixel per point)
    pub scale: f32,

    /// Render annotation appearance streams along with page content
    pub render_annotations: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resolution multiplier directly.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the resolution in dots per inch.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.scale = dpi / POINTS_PER_INCH;
        self
    }

    /// Enable or disable annotation rendering.
    pub fn with_annotations(mut self, render: bool) -> Self {
        self.render_annotations = render;
        self
    }

    /// Effective resolution in dots per inch.
    pub fn dpi(&self) -> f32 {
        self.scale * POINTS_PER_INCH
    }

    /// Pixel size of a page of `width_pt` x `height_pt` points at this scale.
    pub fn pixel_size(&self, width_pt: f32, height_pt: f32) -> (u32, u32) {
        let w = (width_pt * self.scale).round().max(1.0) as u32;
        let h = (height_pt * self.scale).round().max(1.0) as u32;
        (w, h)
    }

    /// Check that the options describe a usable resolution.
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::InvalidOption(format!(
                "render scale must be a positive number, got {}",
                self.scale
            )));
        }
        if self.dpi() > MAX_DPI {
            return Err(Error::InvalidOption(format!(
                "resolution {:.0} DPI exceeds the maximum of {:.0} DPI",
                self.dpi(),
                MAX_DPI
            )));
        }
        Ok(())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_DPI / POINTS_PER_INCH,
            render_annotations: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_300_dpi() {
        let options = RenderOptions::default();
        assert!((options.dpi() - 300.0).abs() < 1e-3);
        assert!(options.render_annotations);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_with_dpi() {
        let options = RenderOptions::new().with_dpi(144.0);
        assert!((options.scale - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pixel_size() {
        let options = RenderOptions::new().with_scale(2.0);
        assert_eq!(options.pixel_size(612.0, 792.0), (1224, 1584));

        let tiny = RenderOptions::new().with_scale(0.001);
        assert_eq!(tiny.pixel_size(10.0, 10.0), (1, 1));
    }

    #[test]
    fn test_validate_rejects_bad_scale() {
        assert!(matches!(
            RenderOptions::new().with_scale(0.0).validate(),
            Err(Error::InvalidOption(_))
        ));
        assert!(RenderOptions::new().with_scale(f32::NAN).validate().is_err());
        assert!(RenderOptions::new().with_dpi(2400.0).validate().is_err());
    }
}
