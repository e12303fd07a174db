//! Post-delivery cleanup of files on disk.

use std::{fs, path::Path};

/// Marker logged when the caller does not supply one.
pub const DEFAULT_MARKER: &str = "none";

/// Deletes `path` and logs the outcome together with `marker`.
///
/// Returns `true` when the file was removed and `false` otherwise; errors are logged,
/// never returned. Removing the same path twice therefore yields `true` then `false`.
///
/// # Examples
///
/// ```rust,no_run
/// use zipsend::remove::remove_file;
///
/// if !remove_file("/tmp/upload-1234.bin", Some("after delivery")) {
///     eprintln!("nothing to clean up");
/// }
/// ```
pub fn remove_file<P: AsRef<Path>>(path: P, marker: Option<&str>) -> bool {
    let path = path.as_ref();
    let marker = marker.unwrap_or(DEFAULT_MARKER);

    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), marker, "removed file");
            true
        }
        Err(error) => {
            tracing::error!(path = %path.display(), marker, %error, "can't remove file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_removal_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.txt");
        fs::write(&path, "hello world").unwrap();

        assert!(remove_file(&path, Some("first")));
        assert!(!path.exists());
        assert!(!remove_file(&path, None));
    }

    #[test]
    fn directories_are_not_removed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!remove_file(dir.path(), None));
        assert!(dir.path().exists());
    }
}
