//! PDF text extraction, page by page

use crate::error::{Error, Result};

/// Text of one PDF page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Page number (1-indexed)
    pub number: u32,
    pub text: String,
}

/// Normalise characters that PDF text extraction commonly mangles
fn cleanup_pdf_text(text: &str) -> String {
    let result = text
        .replace('\0', "")
        .replace('\u{00A0}', " ") // Non-breaking space -> space
        .replace('\u{2010}', "-")
        .replace('\u{2011}', "-")
        .replace('\u{2013}', "-")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    result
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// PDF parser
pub struct PdfParser;

impl PdfParser {
    /// Extract the text of every page that has any
    ///
    /// Pages without text are left out. A PDF with no extractable text yields
    /// an empty list; only an unreadable file is an error.
    pub fn parse(filename: &str, data: &[u8]) -> Result<Vec<PageText>> {
        let load_error = match lopdf::Document::load_mem(data) {
            Ok(doc) => {
                let pages = Self::extract_pages(filename, &doc);
                if !pages.is_empty() {
                    return Ok(pages);
                }
                tracing::debug!("{}: no per-page text, trying fallback extractor", filename);
                None
            }
            Err(e) => {
                tracing::warn!("{}: lopdf failed to load ({}), trying fallback extractor", filename, e);
                Some(e.to_string())
            }
        };

        match pdf_extract::extract_text_from_mem(data) {
            Ok(text) => {
                let text = cleanup_pdf_text(&text);
                if text.is_empty() {
                    Ok(Vec::new())
                } else {
                    Ok(vec![PageText { number: 1, text }])
                }
            }
            Err(e) => Err(Error::pdf_parse(
                filename,
                match load_error {
                    Some(load_error) => format!("{}; fallback: {}", load_error, e),
                    None => e.to_string(),
                },
            )),
        }
    }

    fn extract_pages(filename: &str, doc: &lopdf::Document) -> Vec<PageText> {
        doc.get_pages()
            .keys()
            .filter_map(|&number| match doc.extract_text(&[number]) {
                Ok(text) => {
                    let text = cleanup_pdf_text(&text);
                    (!text.is_empty()).then_some(PageText { number, text })
                }
                Err(e) => {
                    tracing::warn!("{}: skipping page {}: {}", filename, number, e);
                    None
                }
            })
            .collect()
    }
}
