//! Reading stored book JSON and writing it back atomically.
//!
//! A book's JSON is written only after the whole book has been extracted,
//! via a temp file in the destination directory renamed over the target.
//! An interrupted run therefore leaves either the previous file or the new
//! one, never a truncated mix.
//!
//! The temp file is created owner-only, so before the rename it takes the
//! permissions of the file it replaces, or [`NEW_FILE_MODE`] for a new one.
//! Other readers of `data/` keep their access across re-extractions.

use crate::error::ExtractError;
use crate::output::BookJson;
use std::fs::Permissions;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Unix mode given to a book JSON that did not exist before.
pub const NEW_FILE_MODE: u32 = 0o644;

/// Load the stored output at `path`, if any.
///
/// # Errors
/// [`ExtractError::PriorOutputInvalid`] when the file exists but cannot be
/// read or parsed. The caller must not overwrite it.
pub fn load_prior(path: &Path) -> Result<Option<BookJson>, ExtractError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ExtractError::PriorOutputInvalid {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })
        }
    };

    let book = serde_json::from_str(&raw).map_err(|e| ExtractError::PriorOutputInvalid {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    debug!("Loaded stored output {}", path.display());
    Ok(Some(book))
}

/// Atomically write `book` to `path`, creating parent directories.
pub fn write_book_json(path: &Path, book: &BookJson) -> Result<(), ExtractError> {
    let write_err = |source: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut body = serde_json::to_string_pretty(book).map_err(|e| write_err(e.into()))?;
    body.push('\n');

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(body.as_bytes()).map_err(write_err)?;
    if let Some(perms) = target_permissions(path) {
        tmp.as_file().set_permissions(perms).map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Permissions the written file should end up with.
fn target_permissions(path: &Path) -> Option<Permissions> {
    match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Element, ElementType, PageRecord};
    use tempfile::TempDir;

    fn sample() -> BookJson {
        BookJson {
            pages: vec![PageRecord::new(1, "Привет\n")],
            elements: vec![Element::new(1, 1, ElementType::Text)],
        }
    }

    #[test]
    fn missing_prior_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_prior(&dir.path().join("1.json")).unwrap().is_none());
    }

    #[test]
    fn corrupt_prior_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1.json");
        std::fs::write(&path, "{\"pages\": [").unwrap();
        assert!(matches!(
            load_prior(&path),
            Err(ExtractError::PriorOutputInvalid { .. })
        ));
    }

    #[test]
    fn write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("1.json");
        write_book_json(&path, &sample()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("{\n  \"pages\": [\n"));
        assert!(raw.contains("Привет"), "UTF-8 must not be escaped");
        assert!(raw.ends_with("}\n"));
        assert_eq!(load_prior(&path).unwrap(), Some(sample()));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2.json");
        write_book_json(&path, &sample()).unwrap();
        write_book_json(&path, &sample()).unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("3.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, Permissions::from_mode(0o644)).unwrap();

        write_book_json(&path, &sample()).unwrap();
        assert_eq!(mode(&path), 0o644);

        std::fs::set_permissions(&path, Permissions::from_mode(0o640)).unwrap();
        write_book_json(&path, &sample()).unwrap();
        assert_eq!(mode(&path), 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn new_file_is_world_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("4.json");
        write_book_json(&path, &sample()).unwrap();
        assert_eq!(mode(&path), NEW_FILE_MODE);
    }

    #[test]
    fn unwritable_target_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "a file where a directory should be").unwrap();
        let err = write_book_json(&blocker.join("1.json"), &sample()).unwrap_err();
        assert!(matches!(err, ExtractError::OutputWriteFailed { .. }));
    }
}
