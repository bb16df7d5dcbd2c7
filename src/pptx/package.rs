//! Package writer: serializes a [`Presentation`] into an OPC ZIP archive.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::{self, Seek, Write};
use std::path::Path;

use chrono::Utc;
use quick_xml::escape::escape;
use tempfile::NamedTempFile;
use zip::result::{ZipError, ZipResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::presentation::Presentation;
use super::template;
use crate::error::{Error, Result};
use crate::render::ImageFormat;

const RT_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const RT_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const RT_EXTENDED_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
const RT_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const RT_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const RT_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const RT_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const RT_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
const RT_VIEW_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
const RT_TABLE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
const RT_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_PRES_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
const CT_VIEW_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
const CT_TABLE_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
const CT_CORE_PROPS: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_EXTENDED_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";
const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Relationships of one part, in insertion order with sequential `rIdN` IDs.
struct Rels {
    entries: Vec<(String, &'static str, String)>,
}

impl Rels {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a relationship and return its ID.
    fn add(&mut self, rel_type: &'static str, target: impl Into<String>) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push((id.clone(), rel_type, target.into()));
        id
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.entries.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, rel_type, target) in &self.entries {
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id,
                rel_type,
                escape(target.as_str())
            );
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// Builder for `[Content_Types].xml`.
struct ContentTypes {
    defaults: BTreeMap<&'static str, &'static str>,
    overrides: Vec<(String, &'static str)>,
}

impl ContentTypes {
    fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels", CT_RELATIONSHIPS);
        defaults.insert("xml", "application/xml");
        Self {
            defaults,
            overrides: Vec::new(),
        }
    }

    fn add_default(&mut self, format: ImageFormat) {
        self.defaults
            .insert(format.extension(), format.content_type());
    }

    fn add_override(&mut self, part_name: impl Into<String>, content_type: &'static str) {
        self.overrides.push((part_name.into(), content_type));
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(2048);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        for (ext, content_type) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                ext, content_type
            );
        }
        for (part_name, content_type) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                part_name, content_type
            );
        }
        xml.push_str("</Types>");
        xml
    }
}

fn core_props_xml(title: Option<&str>) -> String {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let mut xml = String::with_capacity(768);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    if let Some(title) = title {
        let _ = write!(xml, "<dc:title>{}</dc:title>", escape(title));
    }
    xml.push_str("<dc:creator>pdfdeck</dc:creator>");
    let _ = write!(
        xml,
        r#"<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>"#
    );
    xml.push_str("</cp:coreProperties>");
    xml
}

fn app_props_xml(slide_count: usize) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            "<Application>pdfdeck</Application><PresentationFormat>Custom</PresentationFormat>",
            "<Slides>{}</Slides><AppVersion>{}</AppVersion>",
            "</Properties>"
        ),
        slide_count,
        app_version()
    )
}

/// `AppVersion` must look like `XX.YYYY`.
fn app_version() -> String {
    let major: u32 = env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0);
    let minor: u32 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0);
    format!("{:02}.{:04}", major, minor)
}

/// Write every part of `presentation` into a ZIP archive over `writer`.
pub(crate) fn write_package<W: Write + Seek>(
    presentation: &Presentation,
    writer: W,
) -> ZipResult<W> {
    let mut zip = ZipWriter::new(writer);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    // Media is already compressed
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut content_types = ContentTypes::new();

    let mut pkg_rels = Rels::new();
    pkg_rels.add(RT_OFFICE_DOCUMENT, "ppt/presentation.xml");
    pkg_rels.add(RT_CORE_PROPS, "docProps/core.xml");
    pkg_rels.add(RT_EXTENDED_PROPS, "docProps/app.xml");

    let mut pres_rels = Rels::new();
    pres_rels.add(RT_SLIDE_MASTER, "slideMasters/slideMaster1.xml");

    let mut slide_rel_ids = Vec::with_capacity(presentation.slide_count());
    for (i, slide) in presentation.slides().iter().enumerate() {
        let number = i + 1;
        slide_rel_ids.push(pres_rels.add(RT_SLIDE, format!("slides/slide{}.xml", number)));
        content_types.add_default(slide.picture().image.format);
        content_types.add_override(format!("/ppt/slides/slide{}.xml", number), CT_SLIDE);
    }

    pres_rels.add(RT_PRES_PROPS, "presProps.xml");
    pres_rels.add(RT_VIEW_PROPS, "viewProps.xml");
    pres_rels.add(RT_THEME, "theme/theme1.xml");
    pres_rels.add(RT_TABLE_STYLES, "tableStyles.xml");

    let mut master_rels = Rels::new();
    master_rels.add(RT_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
    master_rels.add(RT_THEME, "../theme/theme1.xml");

    let mut layout_rels = Rels::new();
    layout_rels.add(RT_SLIDE_MASTER, "../slideMasters/slideMaster1.xml");

    content_types.add_override("/ppt/presentation.xml", CT_PRESENTATION);
    content_types.add_override("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER);
    content_types.add_override("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT);
    content_types.add_override("/ppt/theme/theme1.xml", CT_THEME);
    content_types.add_override("/ppt/presProps.xml", CT_PRES_PROPS);
    content_types.add_override("/ppt/viewProps.xml", CT_VIEW_PROPS);
    content_types.add_override("/ppt/tableStyles.xml", CT_TABLE_STYLES);
    content_types.add_override("/docProps/core.xml", CT_CORE_PROPS);
    content_types.add_override("/docProps/app.xml", CT_EXTENDED_PROPS);

    let fixed: Vec<(&str, String)> = vec![
        ("[Content_Types].xml", content_types.to_xml()),
        ("_rels/.rels", pkg_rels.to_xml()),
        ("docProps/core.xml", core_props_xml(presentation.title())),
        ("docProps/app.xml", app_props_xml(presentation.slide_count())),
        (
            "ppt/presentation.xml",
            presentation.presentation_xml(&slide_rel_ids),
        ),
        ("ppt/_rels/presentation.xml.rels", pres_rels.to_xml()),
        (
            "ppt/slideMasters/slideMaster1.xml",
            template::SLIDE_MASTER_XML.to_string(),
        ),
        (
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            master_rels.to_xml(),
        ),
        (
            "ppt/slideLayouts/slideLayout1.xml",
            template::BLANK_LAYOUT_XML.to_string(),
        ),
        (
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            layout_rels.to_xml(),
        ),
        ("ppt/theme/theme1.xml", template::THEME_XML.to_string()),
        ("ppt/presProps.xml", template::PRES_PROPS_XML.to_string()),
        ("ppt/viewProps.xml", template::VIEW_PROPS_XML.to_string()),
        ("ppt/tableStyles.xml", template::TABLE_STYLES_XML.to_string()),
    ];

    for (name, xml) in fixed {
        zip.start_file(name, deflated)?;
        zip.write_all(xml.as_bytes())?;
    }

    for (i, slide) in presentation.slides().iter().enumerate() {
        let number = i + 1;
        let image = &slide.picture().image;
        let media_name = format!("image{}.{}", number, image.format.extension());

        let mut slide_rels = Rels::new();
        slide_rels.add(RT_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        let image_rel = slide_rels.add(RT_IMAGE, format!("../media/{}", media_name));

        zip.start_file(format!("ppt/slides/slide{}.xml", number), deflated)?;
        zip.write_all(slide.to_xml(&image_rel).as_bytes())?;
        zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", number), deflated)?;
        zip.write_all(slide_rels.to_xml().as_bytes())?;
        zip.start_file(format!("ppt/media/{}", media_name), stored)?;
        zip.write_all(&image.data)?;
    }

    zip.finish()
}

fn zip_to_io(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(e) => e,
        other => io::Error::other(other.to_string()),
    }
}

/// Write `presentation` to `path` through a temporary file in the same
/// directory, then rename it over the destination.
pub(crate) fn save(presentation: &Presentation, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::output_write(path, e))?;

    write_package(presentation, tmp.as_file_mut())
        .map_err(|e| Error::output_write(path, zip_to_io(e)))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::output_write(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::output_write(path, e))?;
    }

    tmp.persist(path)
        .map_err(|e| Error::output_write(path, e.error))?;

    log::info!(
        "Wrote {} slides to {}",
        presentation.slide_count(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::presentation::Picture;
    use crate::render::EncodedImage;
    use std::io::{Cursor, Read};

    fn sample(slides: usize) -> Presentation {
        let mut pres = Presentation::new(12188952, 6858000);
        for i in 0..slides {
            pres.add_slide(Picture {
                image: EncodedImage {
                    data: vec![i as u8; 8],
                    format: ImageFormat::Png,
                    width: 16,
                    height: 9,
                },
                x: 0,
                y: 0,
                cx: 12188952,
                cy: 6858000,
                description: format!("Page {}", i + 1),
            });
        }
        pres
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut s = String::new();
        file.read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn test_rels_ids_are_sequential() {
        let mut rels = Rels::new();
        assert_eq!(rels.add(RT_SLIDE, "slides/slide1.xml"), "rId1");
        assert_eq!(rels.add(RT_SLIDE, "slides/slide2.xml"), "rId2");
        assert!(rels.to_xml().contains(r#"Target="slides/slide2.xml""#));
    }

    #[test]
    fn test_package_contains_expected_parts() {
        let bytes = write_package(&sample(2), Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();

        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide2.xml.rels",
            "ppt/media/image1.png",
            "ppt/media/image2.png",
            "ppt/theme/theme1.xml",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_content_types_cover_slides_and_media() {
        let bytes = write_package(&sample(1), Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        let ct = read_entry(&bytes, "[Content_Types].xml");
        assert!(ct.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
        assert!(ct.contains(r#"PartName="/ppt/slides/slide1.xml""#));
        assert!(!ct.contains("image/jpeg"));
    }

    #[test]
    fn test_presentation_rels_list_slides_in_order() {
        let bytes = write_package(&sample(3), Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        let rels = read_entry(&bytes, "ppt/_rels/presentation.xml.rels");
        let first = rels.find("slides/slide1.xml").unwrap();
        let third = rels.find("slides/slide3.xml").unwrap();
        assert!(first < third);

        let pres = read_entry(&bytes, "ppt/presentation.xml");
        assert!(pres.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(pres.contains(r#"<p:sldId id="258" r:id="rId4"/>"#));
    }

    #[test]
    fn test_core_props_title_is_escaped() {
        let xml = core_props_xml(Some("Q&A"));
        assert!(xml.contains("<dc:title>Q&amp;A</dc:title>"));
        assert!(!core_props_xml(None).contains("dc:title"));
    }

    #[test]
    fn test_app_version_format() {
        let v = app_version();
        assert_eq!(v.len(), 7);
        assert_eq!(&v[2..3], ".");
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        fs::write(&path, b"old contents").unwrap();

        sample(1).save(&path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("deck.pptx");
        let result = sample(1).save(&path);
        assert!(matches!(result, Err(Error::OutputWrite { .. })));
        assert!(!path.exists());
    }
}
