//! Turns input files into [`Document`]s.
//!
//! `.pdf` files go through `pdf-extract`; anything else is read as UTF-8
//! text with form feeds separating pages.

use std::path::{Path, PathBuf};

use payslip::Document;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to extract text from {}: {message}", path.display())]
    Pdf { path: PathBuf, message: String },

    #[error("{} is not valid UTF-8 text", path.display())]
    Encoding { path: PathBuf },
}

/// Reads one input file.
///
/// # Errors
///
/// Fails if the file cannot be read or its text cannot be recovered.
pub fn load_document(path: &Path) -> Result<Document, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = decode(path, &bytes)?;
    log::debug!(
        "Read {} ({} bytes, {} page(s))",
        document.name,
        bytes.len(),
        document.pages.len()
    );
    Ok(document)
}

fn decode(path: &Path, bytes: &[u8]) -> Result<Document, SourceError> {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| SourceError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        String::from_utf8(bytes.to_vec()).map_err(|_| SourceError::Encoding {
            path: path.to_path_buf(),
        })?
    };

    Ok(Document::from_text(name, &text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_files_split_pages_on_form_feed() {
        let document = decode(
            Path::new("dumps/holerite.txt"),
            b"Janeiro/2023\nVANTAGENS\n\x0cFevereiro/2023\n",
        )
        .unwrap();
        assert_eq!(document.name, "holerite.txt");
        assert_eq!(document.pages.len(), 2);
        assert!(document.pages[1].text.starts_with("Fevereiro/2023"));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let err = decode(Path::new("bad.txt"), &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, SourceError::Encoding { .. }));
    }

    #[test]
    fn garbage_pdf_is_an_error() {
        let err = decode(Path::new("scan.PDF"), b"not a pdf").unwrap_err();
        assert!(matches!(err, SourceError::Pdf { .. }));
    }
}
