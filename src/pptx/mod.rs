//! PowerPoint (PresentationML) output.
//!
//! [`SlideAssembler`] turns rendered pages into a [`Presentation`], which is
//! serialized as an Open Packaging Conventions ZIP archive. [`PackageSummary`]
//! reads a written package back.

mod assembler;
mod inspect;
mod package;
mod presentation;
mod template;

pub use assembler::{PictureFit, SlideAssembler, SlideOptions, SlideSizing};
pub use inspect::{PackageSummary, SlideSummary};
pub use presentation::{Picture, Presentation, Slide};

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Smallest slide side accepted by presentation software (1 inch).
pub const MIN_SLIDE_EMU: i64 = EMU_PER_INCH;

/// Largest slide side accepted by presentation software (56 inches).
pub const MAX_SLIDE_EMU: i64 = 56 * EMU_PER_INCH;

/// Convert inches to EMUs, rounding to the nearest unit.
pub fn emu_from_inches(inches: f64) -> i64 {
    (inches * EMU_PER_INCH as f64).round() as i64
}
