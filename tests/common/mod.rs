//! Shared test fixtures: synthetic PDF documents built at test time

use std::sync::Once;

use log::LevelFilter;
use simplelog::{Config, SimpleLogger};

static LOGGER: Once = Once::new();

pub fn init_logging() {
    LOGGER.call_once(|| {
        let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());
    });
}

/// Build a minimal valid PDF with one US-letter page per entry in `texts`,
/// drawn in 24pt Helvetica near the top of the page. A `\n` in an entry
/// starts a new text line 30 points below the previous one.
pub fn minimal_pdf(texts: &[&str]) -> Vec<u8> {
    let n = texts.len();
    let kids: String = (0..n)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".into(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {n} >>"),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".into(),
    ];

    for (i, text) in texts.iter().enumerate() {
        let shows: String = text
            .split('\n')
            .enumerate()
            .map(|(j, part)| {
                if j == 0 {
                    format!("({part}) Tj")
                } else {
                    format!("0 -30 Td ({part}) Tj")
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        let content = format!("BT /F1 24 Tf 72 700 Td {shows} ET");
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_pos = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_pos}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );

    out
}

/// A 3-page document with known text on each page.
pub fn three_page_pdf() -> Vec<u8> {
    minimal_pdf(&["Hello paper one", "Hello paper two", "Hello paper three"])
}
