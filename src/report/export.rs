//! Document export: report markup to a durable local PDF or Word file.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::path::Path;
use thiserror::Error;

use crate::{
    model::{DocumentFormat, GeneratedDocument},
    report::pdf::{self, JpegImage},
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not write document: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert report markup into a document and persist it under `out_dir`.
///
/// The file is written before any sharing or upload step runs, so it
/// survives whatever happens to the rest of the submission. PDF is the
/// primary path: the markup is flattened to text lines on letter-size pages
/// and the embedded signature (if any) is re-extracted from its data URI and
/// placed as an image. The Word path is a degraded envelope, the HTML bytes
/// saved under the Word MIME/extension; a known limitation kept as-is.
pub async fn export(
    markup: &str,
    file_name: &str,
    format: DocumentFormat,
    out_dir: &Path,
) -> Result<GeneratedDocument, ExportError> {
    tokio::fs::create_dir_all(out_dir).await?;
    let path = out_dir.join(format!("{file_name}.{}", format.extension()));

    let bytes = match format {
        DocumentFormat::Pdf => {
            let lines = markup_to_lines(markup);
            let image = extract_signature_jpeg(markup);
            pdf::write_pdf(&lines, image.as_ref())
        }
        DocumentFormat::Docx => markup.as_bytes().to_vec(),
    };

    tokio::fs::write(&path, &bytes).await?;
    tracing::info!("exported {} ({} bytes)", path.display(), bytes.len());
    Ok(GeneratedDocument {
        format,
        local_path: path,
        remote_url: None,
    })
}

/// Tags whose inner text never belongs in the document body.
fn skips_content(name: &str) -> bool {
    matches!(name, "style" | "script" | "title")
}

/// Tags that terminate the current text line.
fn is_block(name: &str) -> bool {
    matches!(
        name,
        "div" | "p" | "br" | "tr" | "table" | "li" | "ul" | "ol" | "head" | "body" | "html"
    ) || (name.len() == 2 && name.starts_with('h') && name[1..].chars().all(|c| c.is_ascii_digit()))
}

/// Flatten HTML markup into display text lines: tags stripped, block
/// boundaries becoming line breaks, entities decoded, whitespace collapsed.
pub fn markup_to_lines(html: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        push_text(&rest[..lt], &mut current);
        let after = &rest[lt + 1..];
        let Some(gt) = after.find('>') else {
            rest = "";
            break;
        };
        let tag = &after[..gt];
        rest = &after[gt + 1..];

        let name = tag_name(tag);
        let closing = tag.starts_with('/');

        if !closing && skips_content(&name) {
            // Jump past the element's content wholesale.
            let close = format!("</{name}");
            match rest.find(&close) {
                Some(pos) => {
                    let tail = &rest[pos..];
                    rest = match tail.find('>') {
                        Some(end) => &tail[end + 1..],
                        None => "",
                    };
                }
                None => rest = "",
            }
            continue;
        }

        if is_block(&name) {
            flush_line(&mut current, &mut lines);
        }
    }
    push_text(rest, &mut current);
    flush_line(&mut current, &mut lines);
    lines
}

/// Lowercased element name of a tag body like `div class="x"` or `/div`.
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn push_text(text: &str, current: &mut String) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            // Try a short named/numeric entity; fall through on no match.
            let mut entity = String::new();
            let mut probe = chars.clone();
            let mut matched = false;
            for _ in 0..8 {
                match probe.next() {
                    Some(';') => {
                        if let Some(decoded) = decode_entity(&entity) {
                            push_char(decoded, current);
                            chars = probe;
                            matched = true;
                        }
                        break;
                    }
                    Some(e) => entity.push(e),
                    None => break,
                }
            }
            if !matched {
                push_char('&', current);
            }
        } else {
            push_char(c, current);
        }
    }
}

fn push_char(c: char, current: &mut String) {
    if c.is_whitespace() {
        if !current.ends_with(' ') && !current.is_empty() {
            current.push(' ');
        }
    } else {
        current.push(c);
    }
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "#39" => Some('\''),
        "nbsp" => Some(' '),
        _ => None,
    }
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
    current.clear();
}

/// Pull the signature JPEG back out of its inline data URI.
///
/// Returns `None` when there is no signature or the bytes do not decode;
/// the PDF then simply omits the image, matching the textual placeholder
/// the template emitted.
fn extract_signature_jpeg(html: &str) -> Option<JpegImage> {
    const NEEDLE: &str = "data:image/jpeg;base64,";
    let start = html.find(NEEDLE)? + NEEDLE.len();
    let end = html[start..].find('"')? + start;
    let data = STANDARD.decode(&html[start..end]).ok()?;
    let decoded = image::load_from_memory(&data).ok()?;
    let was_rgb = matches!(decoded, image::DynamicImage::ImageRgb8(_));
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    // Pass RGB JPEGs through untouched; anything else is normalized so the
    // XObject color space stays DeviceRGB.
    if was_rgb {
        return Some(JpegImage { data, width, height });
    }
    let mut out = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 85);
    encoder
        .encode(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .ok()?;
    Some(JpegImage {
        data: out,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateTimePair, ReportStatus, TypeOfCall, VisitReport, WorkItem};
    use crate::report::{signature::{Point, SignaturePad}, template};
    use chrono::TimeZone;

    #[test]
    fn test_markup_to_lines_strips_tags_and_style() {
        let html = r#"<html><head><style>body { color: red; }</style></head>
            <body><div>Client Name</div><div>Acme &amp; Sons</div></body></html>"#;
        let lines = markup_to_lines(html);
        assert_eq!(lines, vec!["Client Name", "Acme & Sons"]);
    }

    #[test]
    fn test_markup_to_lines_decodes_entities_and_collapses_space() {
        let lines = markup_to_lines("<p>a &lt;b&gt;   &quot;c&quot; &#39;d&#39;&nbsp;e</p>");
        assert_eq!(lines, vec![r#"a <b> "c" 'd' e"#]);
    }

    #[test]
    fn test_markup_to_lines_keeps_bare_ampersand() {
        let lines = markup_to_lines("<div>R&D team</div>");
        assert_eq!(lines, vec!["R&D team"]);
    }

    #[test]
    fn test_markup_to_lines_empty_input() {
        assert!(markup_to_lines("").is_empty());
    }

    fn sample_item() -> WorkItem {
        WorkItem {
            id: "SRV-2024-001".into(),
            client_name: "Acme & Sons <Pvt>".into(),
            address1: Some("12 Ring Road".into()),
            address2: None,
            address3: None,
            system_name: Some("Chiller-9".into()),
            task_type: Some("Repair".into()),
            assigned_engineer: Some("eng1".into()),
            assign_date: Some("2024-03-01".into()),
            remark: None,
            job_status: Some("Pending".into()),
            reported_at: None,
        }
    }

    fn sample_report(signature: Option<Vec<u8>>) -> VisitReport {
        VisitReport {
            work_item_id: "SRV-2024-001".into(),
            fault_reported: "Compressor trips".into(),
            cause_problem: "".into(),
            diagnosis: "Worn bearing".into(),
            part_replaced: "".into(),
            material_taken_out: "".into(),
            remark: "Replaced on site".into(),
            customer_comment: "".into(),
            type_of_call: Some(TypeOfCall::Amc),
            call_attended_at: DateTimePair {
                date: "2024-03-05".into(),
                time: "10:30".into(),
            },
            call_completed_at: DateTimePair {
                date: "2024-03-05".into(),
                time: "12:10".into(),
            },
            status: Some(ReportStatus::Completed),
            pending_reason: "".into(),
            signature_image: signature,
        }
    }

    #[tokio::test]
    async fn test_export_empty_markup_is_valid_blank_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let doc = export("", "blank", DocumentFormat::Pdf, dir.path())
            .await
            .unwrap();
        let bytes = std::fs::read(&doc.local_path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(doc.remote_url.is_none());
    }

    #[tokio::test]
    async fn test_render_then_export_round_trips_fields_verbatim() {
        let item = sample_item();
        let report = sample_report(None);
        let ts = chrono::Utc.with_ymd_and_hms(2024, 3, 5, 14, 45, 0).unwrap();
        let markup = template::render(&report, &item, ts);

        let dir = tempfile::tempdir().unwrap();
        let doc = export(
            &markup,
            "complaint_SRV-2024-001_report",
            DocumentFormat::Pdf,
            dir.path(),
        )
        .await
        .unwrap();

        let text = String::from_utf8_lossy(&std::fs::read(&doc.local_path).unwrap()).into_owned();
        // Escaped HTML comes back out as the user-entered text.
        assert!(text.contains("Acme & Sons <Pvt>"));
        assert!(text.contains("Complaint No: SRV-2024-001"));
        assert!(text.contains("Completed"));
        assert!(
            doc.local_path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .ends_with(".pdf")
        );
    }

    #[tokio::test]
    async fn test_export_embeds_signature_image() {
        let mut pad = SignaturePad::new(200, 80, 85);
        pad.stroke_start(Point { x: 10.0, y: 40.0 });
        pad.stroke_move(Point { x: 150.0, y: 30.0 });
        pad.stroke_end();
        let jpeg = pad.rasterize().unwrap();

        let report = sample_report(Some(jpeg));
        let ts = chrono::Utc.with_ymd_and_hms(2024, 3, 5, 14, 45, 0).unwrap();
        let markup = template::render(&report, &sample_item(), ts);

        let dir = tempfile::tempdir().unwrap();
        let doc = export(&markup, "signed", DocumentFormat::Pdf, dir.path())
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&std::fs::read(&doc.local_path).unwrap()).into_owned();
        assert!(text.contains("/Filter /DCTDecode"));
        assert!(text.contains("/Im1 Do"));
    }

    #[tokio::test]
    async fn test_export_docx_is_markup_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let markup = "<html><body>report</body></html>";
        let doc = export(markup, "r", DocumentFormat::Docx, dir.path())
            .await
            .unwrap();
        let bytes = std::fs::read(&doc.local_path).unwrap();
        assert_eq!(bytes, markup.as_bytes());
        assert!(
            doc.local_path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .ends_with(".docx")
        );
    }
}
