//! Summary document as a minimal `.docx` (OOXML) package.
//!
//! The package holds three parts: `[Content_Types].xml`, `_rels/.rels`
//! and `word/document.xml`. Word, LibreOffice and Google Docs all open it
//! without styles or numbering parts.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use lightdesk_core::answers::RowValue;
use lightdesk_core::error::CoreError;
use lightdesk_core::naming::sanitize_name;
use lightdesk_core::options::PLACEHOLDER;
use lightdesk_core::ports::{DocRenderer, PortError};
use lightdesk_core::submission::Submission;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

const DOCUMENT_CLOSE: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="850" w:bottom="1134" w:left="1418" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

/// Column widths of the answer table, in twentieths of a point.
const LABEL_WIDTH: u32 = 3400;
const VALUE_WIDTH: u32 = 6200;

/// File name of a submission's summary document.
pub fn summary_file_name(submission: &Submission) -> String {
    let a = &submission.answers;
    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
    let stem = sanitize_name(&format!(
        "{}_{}_{}",
        field(&a.event_date),
        field(&a.org),
        field(&a.event_title)
    ));
    format!("submission_{}_{}.docx", submission.id, stem.replace(' ', "_"))
}

/// [`DocRenderer`] producing `.docx` bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

impl DocRenderer for DocxRenderer {
    fn render_summary_document(&self, submission: &Submission) -> Result<Vec<u8>, PortError> {
        let body = document_xml(submission);
        package(&body).map_err(|e| PortError::Core(CoreError::Internal(format!("docx: {e}"))))
    }
}

fn package(document: &str) -> Result<Vec<u8>, zip::result::ZipError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", document),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Build `word/document.xml`.
fn document_xml(submission: &Submission) -> String {
    let a = &submission.answers;
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut xml = String::from(DOCUMENT_OPEN);
    xml.push_str(&paragraph(
        &format!("Lighting requirements #{}", submission.id),
        true,
        32,
    ));
    for line in [
        format!("Organization: {}", or_dash(&a.org)),
        format!("Event: {} ({})", or_dash(&a.event_title), or_dash(&a.event_date)),
        format!("Contact: {}, {}", or_dash(&a.name), or_dash(&a.phone)),
        format!("Submitted: {}", submission.created_at.format("%d.%m.%Y %H:%M UTC")),
    ] {
        xml.push_str(&paragraph(&line, false, 22));
    }
    xml.push_str(&paragraph("", false, 22));

    xml.push_str("<w:tbl><w:tblPr><w:tblStyle w:val=\"TableGrid\"/><w:tblW w:w=\"0\" w:type=\"auto\"/>");
    xml.push_str("<w:tblBorders>");
    for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        xml.push_str(&format!(
            "<w:{side} w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"000000\"/>"
        ));
    }
    xml.push_str("</w:tblBorders></w:tblPr>");
    xml.push_str(&format!(
        "<w:tblGrid><w:gridCol w:w=\"{LABEL_WIDTH}\"/><w:gridCol w:w=\"{VALUE_WIDTH}\"/></w:tblGrid>"
    ));
    for row in a.summary().rows {
        let lines = match &row.value {
            RowValue::Text(s) => vec![s.clone()],
            RowValue::List(items) if items.is_empty() => vec![PLACEHOLDER.to_string()],
            RowValue::List(items) => items.clone(),
        };
        xml.push_str(&table_row(row.label, &lines));
    }
    xml.push_str(&table_row("Folder", &[submission.folder_path.clone()]));
    xml.push_str("</w:tbl>");

    xml.push_str(&paragraph("", false, 22));
    xml.push_str(&paragraph("Client: ______________________ / ______________", false, 22));
    xml.push_str(&paragraph(
        "Venue lighting department: ______________________ / ______________",
        false,
        22,
    ));
    xml.push_str(DOCUMENT_CLOSE);
    xml
}

/// One paragraph; `size` is in half-points.
fn paragraph(text: &str, bold: bool, size: u32) -> String {
    let bold = if bold { "<w:b/>" } else { "" };
    format!(
        "<w:p><w:r><w:rPr>{bold}<w:sz w:val=\"{size}\"/></w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        escape(text)
    )
}

fn table_row(label: &str, lines: &[String]) -> String {
    let value: String = lines.iter().map(|l| paragraph(l, false, 22)).collect();
    format!(
        "<w:tr><w:tc><w:tcPr><w:tcW w:w=\"{LABEL_WIDTH}\" w:type=\"dxa\"/></w:tcPr>{}</w:tc>\
         <w:tc><w:tcPr><w:tcW w:w=\"{VALUE_WIDTH}\" w:type=\"dxa\"/></w:tcPr>{value}</w:tc></w:tr>",
        paragraph(label, true, 22)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0.
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use chrono::Utc;
    use lightdesk_core::answers::Answers;
    use lightdesk_core::options::YesNo;

    use super::*;

    fn submission() -> Submission {
        Submission {
            id: 12,
            user_id: 5,
            answers: Answers {
                org: Some("Acme & Sons".to_string()),
                event_date: Some("01.01.2030".to_string()),
                event_title: Some("Gala <Night>".to_string()),
                dimmer_needed: Some(YesNo::No),
                power_type: Some("A, B".to_string()),
                power_where: Some(vec!["A: L1".to_string(), "B: L3".to_string()]),
                ..Default::default()
            },
            folder_path: "Festival/01.01.2030-Acme & Sons-Gala _Night_".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn document_part(bytes: Vec<u8>) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    #[test]
    fn package_contains_required_parts() {
        let bytes = DocxRenderer.render_summary_document(&submission()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert!(names.contains(&"_rels/.rels".to_string()));
        assert!(archive.by_name("word/document.xml").is_ok());
    }

    #[test]
    fn text_is_escaped() {
        let xml = document_part(DocxRenderer.render_summary_document(&submission()).unwrap());
        assert!(xml.contains("Acme &amp; Sons"));
        assert!(xml.contains("Gala &lt;Night&gt;"));
        assert!(!xml.contains("Gala <Night>"));
    }

    #[test]
    fn dimmer_details_row_only_when_needed() {
        let xml = document_part(DocxRenderer.render_summary_document(&submission()).unwrap());
        assert!(xml.contains("Dimmer channels"));
        assert!(!xml.contains("Dimmer details"));

        let mut s = submission();
        s.answers.dimmer_needed = Some(YesNo::Yes);
        s.answers.dimmer_text = Some("12 ch, stage left".to_string());
        let xml = document_part(DocxRenderer.render_summary_document(&s).unwrap());
        assert!(xml.contains("Dimmer details"));
        assert!(xml.contains("12 ch, stage left"));
    }

    #[test]
    fn placements_and_folder_rows() {
        let xml = document_part(DocxRenderer.render_summary_document(&submission()).unwrap());
        assert!(xml.contains("A: L1"));
        assert!(xml.contains("B: L3"));
        assert!(xml.contains("Folder"));
        assert!(xml.contains("Client: "));
    }

    #[test]
    fn file_name_is_sanitized() {
        assert_eq!(
            summary_file_name(&submission()),
            "submission_12_01.01.2030_Acme_&_Sons_Gala__Night_.docx"
        );
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(escape("a\u{1}b\tc"), "ab\tc");
    }
}
