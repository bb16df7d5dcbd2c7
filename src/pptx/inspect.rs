//! Read-back of a written presentation package.
//!
//! Only the parts this crate writes are examined: slide order and size from
//! `presentation.xml`, and each slide's picture placement and media.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::render::ImageFormat;

/// Summary of one slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideSummary {
    /// 1-based slide number
    pub number: usize,
    /// Slide part name inside the package
    pub part: String,
    /// Picture alternative text
    pub description: Option<String>,
    /// Picture offset and extent in EMUs: `(x, y, cx, cy)`
    pub placement: Option<(i64, i64, i64, i64)>,
    /// Media part name
    pub media: Option<String>,
    /// Media container format
    pub format: Option<ImageFormat>,
    /// Media pixel size
    pub pixel_size: Option<(u32, u32)>,
}

/// Summary of a presentation package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageSummary {
    /// Slide width in EMUs
    pub slide_width: i64,
    /// Slide height in EMUs
    pub slide_height: i64,
    /// Slides in presentation order
    pub slides: Vec<SlideSummary>,
}

impl PackageSummary {
    /// Read the package at `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read a package held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        if archive.index_for_name("[Content_Types].xml").is_none() {
            return Err(Error::Package("missing [Content_Types].xml".into()));
        }

        let presentation = read_part(&mut archive, "ppt/presentation.xml")?;
        let (slide_width, slide_height, slide_rel_ids) = parse_presentation(&presentation)?;

        let rels = parse_rels(&read_part(&mut archive, "ppt/_rels/presentation.xml.rels")?)?;

        let mut slides = Vec::with_capacity(slide_rel_ids.len());
        for (i, rel_id) in slide_rel_ids.iter().enumerate() {
            let target = rels
                .get(rel_id)
                .ok_or_else(|| Error::Package(format!("dangling slide relationship {}", rel_id)))?;
            let part = resolve_target("ppt", target);
            slides.push(read_slide(&mut archive, i + 1, part)?);
        }

        Ok(Self {
            slide_width,
            slide_height,
            slides,
        })
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slide width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.slide_width as f64 / self.slide_height as f64
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| Error::Package(format!("missing part {}", name)))?;
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(data)
}

fn attr(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    let value = e
        .try_get_attribute(key)
        .map_err(quick_xml::Error::from)?
        .map(|a| a.unescape_value().map(|v| v.into_owned()))
        .transpose()
        .map_err(quick_xml::Error::from)?;
    Ok(value)
}

fn attr_i64(e: &BytesStart, key: &[u8]) -> Result<i64> {
    let value = attr(e, key)?.unwrap_or_default();
    value.parse().map_err(|_| {
        Error::Package(format!(
            "bad {} value {:?}",
            String::from_utf8_lossy(key),
            value
        ))
    })
}

/// Slide size and slide relationship IDs in order.
fn parse_presentation(xml: &[u8]) -> Result<(i64, i64, Vec<String>)> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut size = None;
    let mut rel_ids = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"p:sldSz" => size = Some((attr_i64(&e, b"cx")?, attr_i64(&e, b"cy")?)),
                b"p:sldId" => {
                    if let Some(id) = attr(&e, b"r:id")? {
                        rel_ids.push(id);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let (cx, cy) = size.ok_or_else(|| Error::Package("presentation has no slide size".into()))?;
    Ok((cx, cy, rel_ids))
}

/// Relationship ID to target.
fn parse_rels(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, b"Id")?, attr(&e, b"Target")?) {
                    rels.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Resolve a relationship target relative to the directory of its source.
fn resolve_target(base_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn rels_part_for(part: &str) -> (String, &str) {
    match part.rsplit_once('/') {
        Some((dir, file)) => (format!("{}/_rels/{}.rels", dir, file), dir),
        None => (format!("_rels/{}.rels", part), ""),
    }
}

fn read_slide<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    number: usize,
    part: String,
) -> Result<SlideSummary> {
    let xml = read_part(archive, &part)?;
    let mut reader = Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();

    let mut description = None;
    let mut embed = None;
    let mut in_pic_props = false;
    let mut offset = None;
    let mut extent = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"p:spPr" => in_pic_props = true,
                b"p:cNvPr" if description.is_none() => description = attr(&e, b"descr")?,
                b"a:blip" => embed = attr(&e, b"r:embed")?,
                b"a:off" if in_pic_props => offset = Some((attr_i64(&e, b"x")?, attr_i64(&e, b"y")?)),
                b"a:ext" if in_pic_props => {
                    extent = Some((attr_i64(&e, b"cx")?, attr_i64(&e, b"cy")?))
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"p:spPr" => in_pic_props = false,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let placement = match (offset, extent) {
        (Some((x, y)), Some((cx, cy))) => Some((x, y, cx, cy)),
        _ => None,
    };

    let mut summary = SlideSummary {
        number,
        part,
        description,
        placement,
        media: None,
        format: None,
        pixel_size: None,
    };

    let Some(embed) = embed else {
        return Ok(summary);
    };

    let (rels_name, slide_dir) = rels_part_for(&summary.part);
    let slide_dir = slide_dir.to_string();
    let rels = parse_rels(&read_part(archive, &rels_name)?)?;
    let target = rels
        .get(&embed)
        .ok_or_else(|| Error::Package(format!("{}: dangling image relationship {}", summary.part, embed)))?;
    let media = resolve_target(&slide_dir, target);

    let data = read_part(archive, &media)?;
    let dimensions = image::ImageReader::new(Cursor::new(&data))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| Error::Package(format!("{}: {}", media, e)))?;

    summary.format = media
        .rsplit_once('.')
        .and_then(|(_, ext)| ImageFormat::from_extension(ext));
    summary.pixel_size = Some(dimensions);
    summary.media = Some(media);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::{PictureFit, SlideAssembler, SlideOptions, SlideSizing};
    use crate::render::{ImageEncoding, RenderedPage};
    use image::{DynamicImage, Rgb, RgbImage};

    fn deck(sizes: &[(u32, u32)], options: SlideOptions) -> Vec<u8> {
        let mut assembler = SlideAssembler::new(options);
        for (i, &(w, h)) in sizes.iter().enumerate() {
            let image = RgbImage::from_pixel(w, h, Rgb([i as u8, 0, 0]));
            assembler
                .add_slide(RenderedPage::new(i, DynamicImage::ImageRgb8(image)))
                .unwrap();
        }
        assembler.finish().unwrap().to_bytes().unwrap()
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(
            resolve_target("ppt/slides", "../media/image1.png"),
            "ppt/media/image1.png"
        );
    }

    #[test]
    fn test_rels_part_for() {
        let (rels, dir) = rels_part_for("ppt/slides/slide3.xml");
        assert_eq!(rels, "ppt/slides/_rels/slide3.xml.rels");
        assert_eq!(dir, "ppt/slides");
    }

    #[test]
    fn test_summary_of_written_package() {
        let bytes = deck(&[(40, 30), (30, 40), (20, 20)], SlideOptions::default());
        let summary = PackageSummary::from_bytes(&bytes).unwrap();

        assert_eq!(summary.slide_count(), 3);
        assert!((summary.aspect_ratio() - 40.0 / 30.0).abs() < 1e-4);
        for (i, slide) in summary.slides.iter().enumerate() {
            assert_eq!(slide.number, i + 1);
            assert_eq!(slide.description.as_deref(), Some(format!("Page {}", i + 1).as_str()));
            assert_eq!(slide.format, Some(ImageFormat::Png));
            assert_eq!(
                slide.placement,
                Some((0, 0, summary.slide_width, summary.slide_height))
            );
        }
        assert_eq!(summary.slides[1].pixel_size, Some((30, 40)));
    }

    #[test]
    fn test_summary_reports_jpeg_and_contain() {
        let options = SlideOptions::new()
            .with_sizing(SlideSizing::widescreen())
            .with_fit(PictureFit::Contain)
            .with_encoding(ImageEncoding::jpeg());
        let bytes = deck(&[(10, 10)], options);
        let summary = PackageSummary::from_bytes(&bytes).unwrap();

        let slide = &summary.slides[0];
        assert_eq!(slide.format, Some(ImageFormat::Jpeg));
        assert_eq!(slide.media.as_deref(), Some("ppt/media/image1.jpeg"));
        let (x, y, cx, cy) = slide.placement.unwrap();
        assert_eq!((cx, cy), (6_858_000, 6_858_000));
        assert_eq!(y, 0);
        assert_eq!(x, (12_192_000 - 6_858_000) / 2);
    }

    #[test]
    fn test_not_a_package() {
        let result = PackageSummary::from_bytes(b"not a zip");
        assert!(matches!(result, Err(Error::Package(_))));
    }
}
