//! Minimal PDF writer used by the document exporter.
//!
//! Lays plain text lines onto US-Letter pages with the built-in Helvetica
//! font and optionally places one JPEG image after the text. Content streams
//! stay uncompressed and the JPEG bytes pass straight through as a
//! `DCTDecode` XObject, so the embedded text and image survive verbatim and
//! tests can assert on the raw output.

/// US Letter width in points (8.5in x 72).
pub const PAGE_WIDTH: f32 = 612.0;
/// US Letter height in points (11in x 72).
pub const PAGE_HEIGHT: f32 = 792.0;

const MARGIN: f32 = 54.0;
const FONT_SIZE: f32 = 10.0;
const LEADING: f32 = 14.0;

/// Widest box the embedded image may occupy, in points.
const IMAGE_MAX_WIDTH: f32 = 216.0;
const IMAGE_MAX_HEIGHT: f32 = 90.0;

/// A baseline JPEG ready for pass-through embedding.
#[derive(Clone, Debug)]
pub struct JpegImage {
    /// Raw JFIF bytes, RGB color.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Render text lines (plus an optional trailing image) into a complete PDF.
///
/// An empty line set still produces a structurally valid single blank page.
pub fn write_pdf(lines: &[String], image: Option<&JpegImage>) -> Vec<u8> {
    let per_page = ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING) as usize;
    let mut chunks: Vec<&[String]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(per_page).collect()
    };

    // Decide where the image lands: below the last text block when it fits,
    // otherwise on a page of its own.
    let mut image_placement: Option<(usize, f32, f32, f32)> = None;
    if let Some(img) = image {
        let scale = (IMAGE_MAX_WIDTH / img.width as f32)
            .min(IMAGE_MAX_HEIGHT / img.height as f32)
            .min(1.0);
        let w = img.width as f32 * scale;
        let h = img.height as f32 * scale;

        let last = chunks.len() - 1;
        let used = chunks[last].len() as f32 * LEADING;
        let free_bottom = PAGE_HEIGHT - MARGIN - used - LEADING;
        if free_bottom - h >= MARGIN {
            image_placement = Some((last, w, h, free_bottom - h));
        } else {
            chunks.push(&[]);
            image_placement = Some((chunks.len() - 1, w, h, PAGE_HEIGHT - MARGIN - h));
        }
    }

    let n_pages = chunks.len();
    let image_obj = image.map(|_| 4usize);
    let first_page_obj = if image_obj.is_some() { 5 } else { 4 };
    let page_obj = |i: usize| first_page_obj + 2 * i;
    let content_obj = |i: usize| page_obj(i) + 1;

    let mut objects: Vec<Vec<u8>> = Vec::new();

    // 1: document catalog.
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());

    // 2: page tree.
    let kids = (0..n_pages)
        .map(|i| format!("{} 0 R", page_obj(i)))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!("<< /Type /Pages /Kids [{kids}] /Count {n_pages} >>").into_bytes());

    // 3: the one font resource.
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    // 4: image XObject, JPEG bytes embedded as-is.
    if let Some(img) = image {
        let mut obj = format!(
            "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
            img.width,
            img.height,
            img.data.len()
        )
        .into_bytes();
        obj.extend_from_slice(&img.data);
        obj.extend_from_slice(b"\nendstream");
        objects.push(obj);
    }

    // Page + content pairs.
    for (i, chunk) in chunks.iter().enumerate() {
        let xobject = if image_obj.is_some() {
            " /XObject << /Im1 4 0 R >>"
        } else {
            ""
        };
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] /Resources << /Font << /F1 3 0 R >>{xobject} >> /Contents {} 0 R >>",
                content_obj(i)
            )
            .into_bytes(),
        );

        let mut stream = Vec::new();
        if !chunk.is_empty() {
            stream.extend_from_slice(
                format!(
                    "BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{MARGIN} {} Td\n",
                    PAGE_HEIGHT - MARGIN - FONT_SIZE
                )
                .as_bytes(),
            );
            for (n, line) in chunk.iter().enumerate() {
                if n > 0 {
                    stream.extend_from_slice(b"T*\n");
                }
                stream.push(b'(');
                stream.extend_from_slice(&escape_pdf_string(line));
                stream.extend_from_slice(b") Tj\n");
            }
            stream.extend_from_slice(b"ET\n");
        }
        if let Some((page, w, h, y)) = image_placement {
            if page == i {
                stream.extend_from_slice(
                    format!("q\n{w} 0 0 {h} {MARGIN} {y} cm\n/Im1 Do\nQ\n").as_bytes(),
                );
            }
        }

        let mut content =
            format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        content.extend_from_slice(&stream);
        content.extend_from_slice(b"\nendstream");
        objects.push(content);
    }

    serialize(&objects)
}

/// Escape a text line into a PDF literal string. Characters outside Latin-1
/// fall back to `?` (the embedded font is WinAnsi-encoded).
fn escape_pdf_string(line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' | '\r' => out.push(b' '),
            c if (c as u32) < 256 => out.push(c as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Write the object list with header, cross-reference table, and trailer.
fn serialize(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut buf: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());

    for (i, body) in objects.iter().enumerate() {
        offsets.push(buf.len());
        buf.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(b"\nendobj\n");
    }

    let xref_at = buf.len();
    buf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    buf.extend_from_slice(b"0000000000 65535 f \n");
    for off in offsets {
        buf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    buf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    buf
}
