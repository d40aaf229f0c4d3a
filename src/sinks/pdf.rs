//! Single-page PDF rendering.
//!
//! Writes PDF 1.4 by hand using the built-in Helvetica fonts, so no font
//! files are needed. Text is encoded as WinAnsi (Windows-1252); characters
//! that code page cannot hold are drawn as `?`.

const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 56.0;
const LINE_HEIGHT: f64 = 28.0;

const TITLE_FONT: &str = "Helvetica-Bold";
const BODY_FONT: &str = "Helvetica";

/// Render a page with a centred bold title followed by one line per entry.
pub fn render_page(title: &str, lines: &[String]) -> Vec<u8> {
    let mut content = String::new();
    let mut y = PAGE_HEIGHT - MARGIN - 16.0;

    let title_size = 16.0;
    // Helvetica averages roughly half an em per glyph.
    let title_width = title.chars().count() as f64 * title_size * 0.5;
    let title_x = ((PAGE_WIDTH - title_width) / 2.0).max(MARGIN);

    show_text(&mut content, "F1", title_size, title_x, y, title);
    y -= LINE_HEIGHT * 1.5;

    for line in lines {
        show_text(&mut content, "F2", 12.0, MARGIN, y, line);
        y -= LINE_HEIGHT;
    }

    // Every escaped string is ASCII, so the stream length is its byte count.
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
             /Contents 4 0 R /Resources << /Font << /F1 5 0 R /F2 6 0 R >> >> >>"
        ),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        font(TITLE_FONT),
        font(BODY_FONT),
        format!("<< /Title ({}) /Producer (formsink) >>", pdf_escape(title)),
    ];

    assemble(&objects, 7)
}

fn show_text(content: &mut String, font: &str, size: f64, x: f64, y: f64, text: &str) {
    content.push_str(&format!(
        "BT\n/{font} {size:.0} Tf\n{x:.0} {y:.0} Td\n({}) Tj\nET\n",
        pdf_escape(text)
    ));
}

fn font(base: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
}

/// Number `objects` from 1, then append the xref table and trailer.
fn assemble(objects: &[String], info: usize) -> Vec<u8> {
    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());

    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }

    let xref_offset = pdf.len();
    let size = objects.len() + 1;
    pdf.push_str(&format!("xref\n0 {size}\n0000000000 65535 f \n"));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {size} /Root 1 0 R /Info {info} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
    ));

    pdf.into_bytes()
}

/// Escape a string for a PDF literal. Printable ASCII passes through,
/// other Windows-1252 characters become octal escapes, the rest `?`.
fn pdf_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(c),
            _ => match win_ansi(c) {
                Some(byte) => out.push_str(&format!("\\{byte:03o}")),
                None => out.push('?'),
            },
        }
    }
    out
}

/// The Windows-1252 byte for a character outside printable ASCII.
fn win_ansi(c: char) -> Option<u8> {
    let byte = match c {
        '\u{a0}'..='\u{ff}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => return None,
    };
    Some(byte)
}
