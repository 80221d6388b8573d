//! PDF text extraction, one text unit per page.

use super::{TextUnit, UploadedDocument};
use crate::error::{EnkelError, Result};
use tracing::{debug, instrument, warn};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Parse a PDF and return the text of each page in page order.
///
/// This is CPU-bound; call it from a blocking task in async contexts.
#[instrument(skip(document), fields(filename = %document.filename, size = document.bytes.len()))]
pub fn load_pages(document: &UploadedDocument) -> Result<Vec<TextUnit>> {
    if !document.bytes.starts_with(PDF_MAGIC) {
        return Err(EnkelError::Pdf(format!("{} is not a PDF file", document.filename)));
    }

    let pdf = lopdf::Document::load_mem(&document.bytes)
        .map_err(|e| EnkelError::Pdf(format!("Failed to parse {}: {}", document.filename, e)))?;

    if pdf.is_encrypted() {
        return Err(EnkelError::Pdf(format!("{} is encrypted", document.filename)));
    }

    let pages = pdf.get_pages();
    if pages.is_empty() {
        return Err(EnkelError::Pdf(format!("{} has no pages", document.filename)));
    }

    let mut units = Vec::with_capacity(pages.len());
    for page_number in pages.keys().copied() {
        let text = match pdf.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                warn!("No text extracted from page {}: {}", page_number, e);
                String::new()
            }
        };
        units.push(TextUnit::page(&document.filename, page_number, text));
    }

    debug!("Loaded {} pages", units.len());
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encrypted_pdf, pdf_with_pages};

    #[test]
    fn test_one_unit_per_page() {
        let bytes = pdf_with_pages(&["The first page.", "The second page."]);
        let doc = UploadedDocument::new("two-pages.pdf", bytes);

        let units = load_pages(&doc).unwrap();

        assert_eq!(units.len(), 2);
        assert!(units[0].content.contains("The first page."));
        assert!(units[1].content.contains("The second page."));
        assert_eq!(units[0].page, Some(1));
        assert_eq!(units[1].page, Some(2));
        assert_eq!(units[1].source.as_deref(), Some("two-pages.pdf"));
    }

    #[test]
    fn test_rejects_non_pdf() {
        let doc = UploadedDocument::new("notes.txt", b"just some text".to_vec());
        assert!(matches!(load_pages(&doc), Err(EnkelError::Pdf(_))));
    }

    #[test]
    fn test_rejects_encrypted_pdf() {
        let doc = UploadedDocument::new("locked.pdf", encrypted_pdf("Secret text."));
        assert!(matches!(load_pages(&doc), Err(EnkelError::Pdf(_))));
    }

    #[test]
    fn test_rejects_truncated_pdf() {
        let doc = UploadedDocument::new("broken.pdf", b"%PDF-1.5\n%garbage".to_vec());
        assert!(matches!(load_pages(&doc), Err(EnkelError::Pdf(_))));
    }
}
