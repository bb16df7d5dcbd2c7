//! Slide assembly: one picture slide per rendered page.

use serde::{Deserialize, Serialize};

use super::presentation::{Picture, Presentation};
use super::{emu_from_inches, MAX_SLIDE_EMU, MIN_SLIDE_EMU};
use crate::error::{Error, Result};
use crate::render::{ImageEncoding, RenderedPage};

/// How the slide size is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideSizing {
    /// Fixed width; height follows the aspect ratio of the first page.
    FirstPage {
        /// Slide width in EMUs
        width_emu: i64,
    },
    /// Fixed slide size regardless of page shape.
    Fixed {
        /// Slide width in EMUs
        width_emu: i64,
        /// Slide height in EMUs
        height_emu: i64,
    },
}

impl SlideSizing {
    /// 13.33 inch wide slides shaped like the first page.
    pub fn first_page() -> Self {
        SlideSizing::FirstPage {
            width_emu: emu_from_inches(13.33),
        }
    }

    /// 16:9 widescreen (13.333 x 7.5 inches).
    pub fn widescreen() -> Self {
        SlideSizing::Fixed {
            width_emu: 12_192_000,
            height_emu: 6_858_000,
        }
    }

    /// 4:3 standard (10 x 7.5 inches).
    pub fn standard() -> Self {
        SlideSizing::Fixed {
            width_emu: 9_144_000,
            height_emu: 6_858_000,
        }
    }

    /// Slide size for a deck whose first page has the given aspect ratio.
    ///
    /// Sizes are kept within the range presentation software accepts
    /// (1 to 56 inches per side); an out-of-range side scales both sides
    /// down before clamping.
    pub fn resolve(&self, first_page_aspect: f64) -> (i64, i64) {
        match *self {
            SlideSizing::Fixed {
                width_emu,
                height_emu,
            } => (width_emu, height_emu),
            SlideSizing::FirstPage { width_emu } => {
                let mut width = width_emu as f64;
                let mut height = width / first_page_aspect;

                let longest = width.max(height);
                if longest > MAX_SLIDE_EMU as f64 {
                    let shrink = MAX_SLIDE_EMU as f64 / longest;
                    width *= shrink;
                    height *= shrink;
                }

                let clamp = |v: f64| (v.round() as i64).clamp(MIN_SLIDE_EMU, MAX_SLIDE_EMU);
                let (w, h) = (clamp(width), clamp(height));
                if distorts_aspect(first_page_aspect, w, h) {
                    log::warn!(
                        "First page aspect ratio {:.3} does not fit the slide size limits, \
                         slides will be {:.3}",
                        first_page_aspect,
                        w as f64 / h as f64
                    );
                }
                (w, h)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let (width, height) = match *self {
            SlideSizing::FirstPage { width_emu } => (width_emu, None),
            SlideSizing::Fixed {
                width_emu,
                height_emu,
            } => (width_emu, Some(height_emu)),
        };
        if let Some(bad) = std::iter::once(width)
            .chain(height)
            .find(|v| !(MIN_SLIDE_EMU..=MAX_SLIDE_EMU).contains(v))
        {
            return Err(Error::InvalidOption(format!(
                "slide side of {} EMU is outside {}..={}",
                bad, MIN_SLIDE_EMU, MAX_SLIDE_EMU
            )));
        }
        Ok(())
    }
}

/// True when a `width` x `height` slide is visibly off the `aspect` it was
/// derived from.
fn distorts_aspect(aspect: f64, width: i64, height: i64) -> bool {
    let resolved = width as f64 / height as f64;
    (resolved - aspect).abs() > aspect * 0.001
}

impl Default for SlideSizing {
    fn default() -> Self {
        Self::first_page()
    }
}

/// How a picture is placed on its slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PictureFit {
    /// Fill the whole slide from the origin, ignoring aspect ratio.
    #[default]
    Stretch,
    /// Scale to fit inside the slide keeping aspect ratio, centered.
    Contain,
}

impl PictureFit {
    /// Placement rectangle `(x, y, cx, cy)` in EMUs for an image of
    /// `image_w` x `image_h` pixels on a `slide_w` x `slide_h` slide.
    pub fn place(&self, image_w: u32, image_h: u32, slide_w: i64, slide_h: i64) -> (i64, i64, i64, i64) {
        match self {
            PictureFit::Stretch => (0, 0, slide_w, slide_h),
            PictureFit::Contain => {
                let scale = (slide_w as f64 / image_w as f64).min(slide_h as f64 / image_h as f64);
                let cx = ((image_w as f64 * scale).round() as i64).min(slide_w);
                let cy = ((image_h as f64 * scale).round() as i64).min(slide_h);
                ((slide_w - cx) / 2, (slide_h - cy) / 2, cx, cy)
            }
        }
    }
}

/// Options controlling slide assembly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlideOptions {
    /// Slide size policy
    pub sizing: SlideSizing,
    /// Picture placement
    pub fit: PictureFit,
    /// Media encoding
    pub encoding: ImageEncoding,
}

impl SlideOptions {
    /// Create new slide options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slide size policy.
    pub fn with_sizing(mut self, sizing: SlideSizing) -> Self {
        self.sizing = sizing;
        self
    }

    /// Set picture placement.
    pub fn with_fit(mut self, fit: PictureFit) -> Self {
        self.fit = fit;
        self
    }

    /// Set media encoding.
    pub fn with_encoding(mut self, encoding: ImageEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Check option values.
    pub fn validate(&self) -> Result<()> {
        self.sizing.validate()?;
        self.encoding.validate()
    }
}

/// Builds a [`Presentation`] from rendered pages, one slide each, in the
/// order pages are added.
#[derive(Debug)]
pub struct SlideAssembler {
    options: SlideOptions,
    presentation: Presentation,
}

impl SlideAssembler {
    /// Create an assembler with an empty presentation.
    pub fn new(options: SlideOptions) -> Self {
        Self {
            options,
            presentation: Presentation::new(0, 0),
        }
    }

    /// Number of slides added so far.
    pub fn slide_count(&self) -> usize {
        self.presentation.slide_count()
    }

    /// Set the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.presentation.set_title(title);
    }

    /// Encode `page` and append it as a new slide.
    ///
    /// The first page added fixes the slide size.
    pub fn add_slide(&mut self, page: RenderedPage) -> Result<()> {
        if page.width() == 0 || page.height() == 0 {
            return Err(Error::Assembly(format!(
                "page {} rendered to an empty bitmap",
                page.index() + 1
            )));
        }

        if self.presentation.slide_count() == 0 {
            let (w, h) = self.options.sizing.resolve(page.aspect_ratio());
            log::debug!(
                "Slide size {}x{} EMU from page {} ({}x{} px)",
                w,
                h,
                page.index() + 1,
                page.width(),
                page.height()
            );
            self.presentation.set_slide_size(w, h);
        }

        let image = page.encode(self.options.encoding)?;
        let (x, y, cx, cy) = self.options.fit.place(
            image.width,
            image.height,
            self.presentation.slide_width(),
            self.presentation.slide_height(),
        );

        self.presentation.add_slide(Picture {
            image,
            x,
            y,
            cx,
            cy,
            description: format!("Page {}", page.index() + 1),
        });
        Ok(())
    }

    /// Finish assembly. A presentation without slides is rejected.
    pub fn finish(self) -> Result<Presentation> {
        if self.presentation.slide_count() == 0 {
            return Err(Error::EmptyDocument);
        }
        Ok(self.presentation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn page(index: usize, width: u32, height: u32) -> RenderedPage {
        let image = RgbImage::from_pixel(width, height, Rgb([200, 200, 200]));
        RenderedPage::new(index, DynamicImage::ImageRgb8(image))
    }

    #[test]
    fn test_first_page_sizing_follows_aspect() {
        let (w, h) = SlideSizing::first_page().resolve(612.0 / 792.0);
        assert_eq!(w, emu_from_inches(13.33));
        let ratio = w as f64 / h as f64;
        assert!((ratio - 612.0 / 792.0).abs() < 1e-4);
    }

    #[test]
    fn test_first_page_sizing_stays_in_range() {
        let (w, h) = SlideSizing::first_page().resolve(0.05);
        assert!(h <= MAX_SLIDE_EMU);
        assert!(w >= MIN_SLIDE_EMU);

        let (w, h) = SlideSizing::first_page().resolve(40.0);
        assert!(h >= MIN_SLIDE_EMU);
        assert!(w <= MAX_SLIDE_EMU);
    }

    #[test]
    fn test_extreme_aspect_is_clamped() {
        // A 13.33in wide slide cannot be shorter than 1in
        let (w, h) = SlideSizing::first_page().resolve(40.0);
        assert_eq!((w, h), (emu_from_inches(13.33), MIN_SLIDE_EMU));
        assert!(distorts_aspect(40.0, w, h));

        let (w, h) = SlideSizing::first_page().resolve(1.0 / 100.0);
        assert_eq!((w, h), (MIN_SLIDE_EMU, MAX_SLIDE_EMU));
        assert!(distorts_aspect(1.0 / 100.0, w, h));

        for aspect in [612.0 / 792.0, 10.0, 0.05] {
            let (w, h) = SlideSizing::first_page().resolve(aspect);
            assert!(!distorts_aspect(aspect, w, h), "aspect {}", aspect);
        }
    }

    #[test]
    fn test_fixed_sizing() {
        assert_eq!(SlideSizing::widescreen().resolve(0.5), (12_192_000, 6_858_000));
    }

    #[test]
    fn test_contain_centers_picture() {
        let (x, y, cx, cy) = PictureFit::Contain.place(100, 100, 2000, 1000);
        assert_eq!((cx, cy), (1000, 1000));
        assert_eq!((x, y), (500, 0));
    }

    #[test]
    fn test_stretch_fills_slide() {
        assert_eq!(
            PictureFit::Stretch.place(10, 30, 2000, 1000),
            (0, 0, 2000, 1000)
        );
    }

    #[test]
    fn test_assembler_preserves_order() {
        let mut assembler = SlideAssembler::new(SlideOptions::default());
        for i in 0..3 {
            assembler.add_slide(page(i, 20 + i as u32, 10)).unwrap();
        }
        let pres = assembler.finish().unwrap();
        assert_eq!(pres.slide_count(), 3);
        for (i, slide) in pres.slides().iter().enumerate() {
            assert_eq!(slide.picture().image.width, 20 + i as u32);
            assert_eq!(slide.picture().description, format!("Page {}", i + 1));
        }
    }

    #[test]
    fn test_assembler_slide_size_from_first_page() {
        let mut assembler = SlideAssembler::new(SlideOptions::default());
        assembler.add_slide(page(0, 300, 100)).unwrap();
        assembler.add_slide(page(1, 100, 300)).unwrap();
        let pres = assembler.finish().unwrap();
        let ratio = pres.slide_width() as f64 / pres.slide_height() as f64;
        assert!((ratio - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_assembler_empty_is_error() {
        let assembler = SlideAssembler::new(SlideOptions::default());
        assert!(matches!(assembler.finish(), Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_assembler_rejects_empty_bitmap() {
        let mut assembler = SlideAssembler::new(SlideOptions::default());
        let empty = RenderedPage::new(0, DynamicImage::new_rgb8(0, 0));
        assert!(matches!(
            assembler.add_slide(empty),
            Err(Error::Assembly(_))
        ));
    }

    #[test]
    fn test_slide_options_validation() {
        assert!(SlideOptions::new().validate().is_ok());
        let bad = SlideOptions::new().with_sizing(SlideSizing::Fixed {
            width_emu: 10,
            height_emu: 6_858_000,
        });
        assert!(matches!(bad.validate(), Err(Error::InvalidOption(_))));
        let bad = SlideOptions::new().with_encoding(ImageEncoding::Jpeg { quality: 0 });
        assert!(bad.validate().is_err());
    }
}
