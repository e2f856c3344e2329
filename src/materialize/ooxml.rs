//! Office Open XML packages (docx, pptx)
//!
//! Both formats are zip archives of XML parts. Only the parts needed for a document to
//! open are written: no styles beyond the defaults, one slide layout, one theme.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use super::slides::Slide;
use crate::Result;
use crate::error::MaterializationError;

const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Escape text for XML character data and attribute values
///
/// Control characters other than tab and line breaks are not allowed in XML 1.0 and are
/// dropped.
pub fn escape_xml(text: &str) -> String {
    let allowed: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    escape(allowed.as_str()).into_owned()
}

struct Package {
    format: &'static str,
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl Package {
    fn new(format: &'static str) -> Self {
        Self {
            format,
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn part(&mut self, name: &str, xml: &str) -> Result<()> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(name, options)
            .map_err(|e| self.error(e))?;
        self.writer
            .write_all(xml.as_bytes())
            .map_err(|e| self.error(e))?;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self.writer.finish().map_err(|e| MaterializationError::Render {
            format: self.format.to_string(),
            reason: e.to_string(),
        })?;
        Ok(cursor.into_inner())
    }

    fn error(&self, e: impl std::fmt::Display) -> MaterializationError {
        MaterializationError::Render {
            format: self.format.to_string(),
            reason: e.to_string(),
        }
    }
}

fn xml_decl() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#
}

fn relationships(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        xml_decl()
    );
    for (id, rel_type, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            escape_xml(id),
            escape_xml(rel_type),
            escape_xml(target)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Render paragraphs as a Word document
pub fn render_docx(paragraphs: &[String]) -> Result<Vec<u8>> {
    let mut pkg = Package::new("docx");

    pkg.part(
        "[Content_Types].xml",
        &format!(
            r#"{}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
            xml_decl(),
            RELS_CONTENT_TYPE
        ),
    )?;
    pkg.part(
        "_rels/.rels",
        &relationships(&[("rId1", REL_OFFICE_DOCUMENT, "word/document.xml")]),
    )?;

    let mut body = String::new();
    for paragraph in paragraphs.iter().filter(|p| !p.trim().is_empty()) {
        body.push_str(&format!(
            r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape_xml(paragraph)
        ));
    }

    pkg.part(
        "word/document.xml",
        &format!(
            r#"{}<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
            xml_decl(),
            body
        ),
    )?;

    pkg.finish()
}

/// Render slides as a PowerPoint deck, one title and body per slide
pub fn render_pptx(slides: &[Slide]) -> Result<Vec<u8>> {
    let mut pkg = Package::new("pptx");

    let mut overrides = String::from(
        r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
    );
    for n in 1..=slides.len() {
        overrides.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            n
        ));
    }
    pkg.part(
        "[Content_Types].xml",
        &format!(
            r#"{}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="application/xml"/>{}</Types>"#,
            xml_decl(),
            RELS_CONTENT_TYPE,
            overrides
        ),
    )?;
    pkg.part(
        "_rels/.rels",
        &relationships(&[("rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml")]),
    )?;

    // rId1 is the master, rId2 the theme, slides follow
    let slide_master_rel = format!("{}/slideMaster", REL_BASE);
    let theme_rel = format!("{}/theme", REL_BASE);
    let slide_rel = format!("{}/slide", REL_BASE);
    let layout_rel = format!("{}/slideLayout", REL_BASE);

    let slide_targets: Vec<(String, String)> = (1..=slides.len())
        .map(|n| (format!("rId{}", n + 2), format!("slides/slide{}.xml", n)))
        .collect();
    let mut presentation_rels: Vec<(&str, &str, &str)> = vec![
        ("rId1", slide_master_rel.as_str(), "slideMasters/slideMaster1.xml"),
        ("rId2", theme_rel.as_str(), "theme/theme1.xml"),
    ];
    for (id, target) in &slide_targets {
        presentation_rels.push((id.as_str(), slide_rel.as_str(), target.as_str()));
    }
    pkg.part(
        "ppt/_rels/presentation.xml.rels",
        &relationships(&presentation_rels),
    )?;

    let slide_ids: String = slide_targets
        .iter()
        .enumerate()
        .map(|(i, (rid, _))| format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, rid))
        .collect();
    pkg.part(
        "ppt/presentation.xml",
        &format!(
            r#"{}<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
            xml_decl(),
            NS_A,
            NS_R,
            NS_P,
            slide_ids
        ),
    )?;

    pkg.part(
        "ppt/slideMasters/slideMaster1.xml",
        &format!(
            r#"{}<p:sldMaster xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree>{}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
            xml_decl(),
            NS_A,
            NS_R,
            NS_P,
            empty_group()
        ),
    )?;
    pkg.part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &relationships(&[
            ("rId1", layout_rel.as_str(), "../slideLayouts/slideLayout1.xml"),
            ("rId2", theme_rel.as_str(), "../theme/theme1.xml"),
        ]),
    )?;

    pkg.part(
        "ppt/slideLayouts/slideLayout1.xml",
        &format!(
            r#"{}<p:sldLayout xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" type="titleAndBody"><p:cSld name="Title and Content"><p:spTree>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
            xml_decl(),
            NS_A,
            NS_R,
            NS_P,
            empty_group()
        ),
    )?;
    pkg.part(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &relationships(&[(
            "rId1",
            slide_master_rel.as_str(),
            "../slideMasters/slideMaster1.xml",
        )]),
    )?;

    pkg.part("ppt/theme/theme1.xml", &theme())?;

    for (i, slide) in slides.iter().enumerate() {
        let n = i + 1;
        pkg.part(&format!("ppt/slides/slide{}.xml", n), &slide_xml(slide))?;
        pkg.part(
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            &relationships(&[(
                "rId1",
                layout_rel.as_str(),
                "../slideLayouts/slideLayout1.xml",
            )]),
        )?;
    }

    pkg.finish()
}

fn empty_group() -> &'static str {
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#
}

fn slide_xml(slide: &Slide) -> String {
    let title = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="274638"/><a:ext cx="8229600" cy="1143000"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="3200" b="1"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        escape_xml(&slide.title)
    );

    let mut body_paragraphs: String = slide
        .content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            format!(
                r#"<a:p><a:r><a:rPr lang="en-US" sz="1800"/><a:t>{}</a:t></a:r></a:p>"#,
                escape_xml(line.trim_end())
            )
        })
        .collect();
    if body_paragraphs.is_empty() {
        body_paragraphs.push_str("<a:p/>");
    }

    let body = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="1600200"/><a:ext cx="8229600" cy="4525963"/></a:xfrm></p:spPr><p:txBody><a:bodyPr><a:normAutofit/></a:bodyPr><a:lstStyle/>{}</p:txBody></p:sp>"#,
        body_paragraphs
    );

    format!(
        r#"{}<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree>{}{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        xml_decl(),
        NS_A,
        NS_R,
        NS_P,
        empty_group(),
        title,
        body
    )
}

fn theme() -> String {
    let colors = [
        ("dk1", "000000"),
        ("lt1", "FFFFFF"),
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ];
    let scheme: String = colors
        .iter()
        .map(|(name, rgb)| format!(r#"<a:{0}><a:srgbClr val="{1}"/></a:{0}>"#, name, rgb))
        .collect();

    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = r#"<a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        r#"{}<a:theme xmlns:a="{}" name="Office Theme"><a:themeElements><a:clrScheme name="Office">{}</a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{f}{f}{f}</a:fillStyleLst><a:lnStyleLst>{l}{l}{l}</a:lnStyleLst><a:effectStyleLst>{e}{e}{e}</a:effectStyleLst><a:bgFillStyleLst>{f}{f}{f}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#,
        xml_decl(),
        NS_A,
        scheme,
        f = fill,
        l = line,
        e = effect
    )
}
