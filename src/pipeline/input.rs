//! Source resolution: confirm a book's PDF exists and is a PDF.
//!
//! pdfium reports a missing file and a garbage file with the same opaque
//! load error. Checking existence and the `%PDF` magic bytes up front lets
//! the batch summary say which of the two happened.

use crate::error::ExtractError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Validate the source PDF at `path`.
///
/// # Errors
/// * [`ExtractError::SourceNotFound`] — absent or unreadable
/// * [`ExtractError::DocumentParse`] — present but not starting with `%PDF`
pub fn resolve_source(path: &Path) -> Result<(), ExtractError> {
    if !path.is_file() {
        let reason = if path.exists() {
            "not a regular file"
        } else {
            "no such file"
        };
        return Err(ExtractError::SourceNotFound {
            path: path.to_path_buf(),
            reason: reason.into(),
        });
    }

    let mut f = std::fs::File::open(path).map_err(|e| ExtractError::SourceNotFound {
        path: path.to_path_buf(),
        reason: format!("cannot open for reading: {e}"),
    })?;

    let mut magic = [0u8; 4];
    match f.read_exact(&mut magic) {
        Ok(()) if &magic == b"%PDF" => {}
        Ok(()) => {
            return Err(ExtractError::DocumentParse {
                path: path.to_path_buf(),
                detail: format!("not a PDF, first bytes: {magic:?}"),
            })
        }
        Err(e) => {
            return Err(ExtractError::DocumentParse {
                path: path.to_path_buf(),
                detail: format!("file too short to be a PDF ({e})"),
            })
        }
    }

    debug!("Resolved source PDF: {}", path.display());
    Ok(())
}
