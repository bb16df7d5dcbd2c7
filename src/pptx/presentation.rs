//! In-memory presentation model and its PresentationML parts.

use std::fmt::Write as FmtWrite;
use std::path::Path;

use quick_xml::escape::escape;

use super::{package, EMU_PER_INCH};
use crate::error::{Error, Result};
use crate::render::EncodedImage;

/// First slide ID; PresentationML reserves values below 256.
const FIRST_SLIDE_ID: u32 = 256;

/// A picture placed on a slide. Coordinates are in EMUs.
#[derive(Debug, Clone)]
pub struct Picture {
    /// Encoded image bytes
    pub image: EncodedImage,
    /// Left offset
    pub x: i64,
    /// Top offset
    pub y: i64,
    /// Width
    pub cx: i64,
    /// Height
    pub cy: i64,
    /// Alternative text
    pub description: String,
}

/// A slide holding one full-bleed picture.
#[derive(Debug, Clone)]
pub struct Slide {
    slide_id: u32,
    picture: Picture,
}

impl Slide {
    /// Slide ID as listed in `presentation.xml`.
    pub fn slide_id(&self) -> u32 {
        self.slide_id
    }

    /// The slide's picture.
    pub fn picture(&self) -> &Picture {
        &self.picture
    }

    /// Generate the slide part. `image_rel_id` is the relationship ID of the
    /// picture's media part in the slide's rels.
    pub(crate) fn to_xml(&self, image_rel_id: &str) -> String {
        let pic = &self.picture;
        let mut xml = String::with_capacity(1024);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
        xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);

        xml.push_str("<p:pic><p:nvPicPr>");
        // Writing to a String cannot fail
        let _ = write!(
            xml,
            r#"<p:cNvPr id="2" name="Picture 1" descr="{}"/>"#,
            escape(pic.description.as_str())
        );
        xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
        let _ = write!(
            xml,
            r#"<p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            image_rel_id
        );
        let _ = write!(
            xml,
            r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
            pic.x, pic.y, pic.cx, pic.cy
        );
        xml.push_str("</p:pic>");

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");
        xml
    }
}

/// An ordered collection of picture slides.
#[derive(Debug, Clone)]
pub struct Presentation {
    slides: Vec<Slide>,
    /// Slide width in EMUs (914400 EMU = 1 inch)
    slide_width: i64,
    /// Slide height in EMUs
    slide_height: i64,
    title: Option<String>,
}

impl Presentation {
    /// Create an empty presentation with the given slide size in EMUs.
    pub fn new(slide_width: i64, slide_height: i64) -> Self {
        Self {
            slides: Vec::new(),
            slide_width,
            slide_height,
            title: None,
        }
    }

    /// Append a slide holding `picture`.
    pub fn add_slide(&mut self, picture: Picture) -> &Slide {
        let slide_id = FIRST_SLIDE_ID + self.slides.len() as u32;
        self.slides.push(Slide { slide_id, picture });
        &self.slides[self.slides.len() - 1]
    }

    /// Slides in order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Get the number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Get the slide width in EMUs.
    pub fn slide_width(&self) -> i64 {
        self.slide_width
    }

    /// Get the slide height in EMUs.
    pub fn slide_height(&self) -> i64 {
        self.slide_height
    }

    /// Set the slide size in EMUs.
    pub fn set_slide_size(&mut self, width: i64, height: i64) {
        self.slide_width = width;
        self.slide_height = height;
    }

    /// Document title stored in the core properties.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Slide size in inches.
    pub fn slide_size_inches(&self) -> (f64, f64) {
        (
            self.slide_width as f64 / EMU_PER_INCH as f64,
            self.slide_height as f64 / EMU_PER_INCH as f64,
        )
    }

    /// Serialize the package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let cursor = package::write_package(self, std::io::Cursor::new(Vec::new()))
            .map_err(|e| Error::Assembly(format!("cannot serialize package: {}", e)))?;
        Ok(cursor.into_inner())
    }

    /// Write the package to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        package::save(self, path.as_ref())
    }

    /// Generate `presentation.xml`.
    ///
    /// `slide_rel_ids` holds the relationship ID of each slide, in order.
    pub(crate) fn presentation_xml(&self, slide_rel_ids: &[String]) -> String {
        let mut xml = String::with_capacity(1024 + self.slides.len() * 48);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" saveSubsetFonts="1">"#);

        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);

        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for (slide, rel_id) in self.slides.iter().zip(slide_rel_ids) {
                let _ = write!(
                    xml,
                    r#"<p:sldId id="{}" r:id="{}"/>"#,
                    slide.slide_id, rel_id
                );
            }
            xml.push_str("</p:sldIdLst>");
        }

        let _ = write!(
            xml,
            r#"<p:sldSz cx="{}" cy="{}"/>"#,
            self.slide_width, self.slide_height
        );
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ImageFormat;

    fn picture(description: &str) -> Picture {
        Picture {
            image: EncodedImage {
                data: vec![0; 4],
                format: ImageFormat::Png,
                width: 4,
                height: 3,
            },
            x: 0,
            y: 0,
            cx: 400,
            cy: 300,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_create_presentation() {
        let pres = Presentation::new(9144000, 6858000);
        assert_eq!(pres.slide_count(), 0);
        assert_eq!(pres.slide_size_inches(), (10.0, 7.5));
    }

    #[test]
    fn test_slide_ids_are_sequential() {
        let mut pres = Presentation::new(100, 100);
        assert_eq!(pres.add_slide(picture("Page 1")).slide_id(), 256);
        assert_eq!(pres.add_slide(picture("Page 2")).slide_id(), 257);
        assert_eq!(pres.slide_count(), 2);
    }

    #[test]
    fn test_presentation_xml() {
        let mut pres = Presentation::new(12188952, 9144000);
        pres.add_slide(picture("Page 1"));
        pres.add_slide(picture("Page 2"));

        let xml = pres.presentation_xml(&["rId2".to_string(), "rId3".to_string()]);
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(xml.contains(r#"<p:sldId id="257" r:id="rId3"/>"#));
        assert!(xml.contains(r#"<p:sldSz cx="12188952" cy="9144000"/>"#));
    }

    #[test]
    fn test_empty_presentation_has_no_slide_list() {
        let pres = Presentation::new(100, 100);
        assert!(!pres.presentation_xml(&[]).contains("sldIdLst"));
    }

    #[test]
    fn test_slide_xml_escapes_description() {
        let mut pres = Presentation::new(100, 100);
        let slide = pres.add_slide(picture("A & <B>"));
        let xml = slide.to_xml("rId2");
        assert!(xml.contains(r#"descr="A &amp; &lt;B&gt;""#));
        assert!(xml.contains(r#"<a:blip r:embed="rId2"/>"#));
        assert!(xml.contains(r#"<a:ext cx="400" cy="300"/>"#));
    }
}
