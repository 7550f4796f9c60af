use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Reduce an uploaded file name to a safe ASCII basename.
///
/// Returns `None` when nothing usable is left (e.g. `"../"` or `"..."`).
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let spaced = WHITESPACE.replace_all(base.trim(), "_");
    let cleaned = DISALLOWED.replace_all(&spaced, "");
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c == '_');

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `YYYYmmddHHMMSS_<name>`, keeping same-named uploads apart.
pub fn stamped_filename(name: &str, now: NaiveDateTime) -> String {
    format!("{}_{name}", now.format("%Y%m%d%H%M%S"))
}

/// Copies `src` into `upload_dir` under a sanitized, timestamp-prefixed
/// name and returns that name.
pub fn store_image(src: &Path, upload_dir: &Path, now: NaiveDateTime) -> Result<String> {
    let raw = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = sanitize_filename(&raw).ok_or(Error::MissingField("image filename"))?;
    let filename = stamped_filename(&name, now);

    fs::create_dir_all(upload_dir)?;
    let dest = upload_dir.join(&filename);
    let bytes = fs::copy(src, &dest)?;

    tracing::info!(
        src = %src.display(),
        dest = %dest.display(),
        bytes,
        "stored workout image"
    );
    Ok(filename)
}

/// Removes a stored image; a missing file is not an error.
pub fn remove_image(upload_dir: &Path, filename: &str) -> Result<()> {
    let Some(name) = sanitize_filename(filename) else {
        return Ok(());
    };
    match fs::remove_file(upload_dir.join(name)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(7, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("run.jpg").as_deref(), Some("run.jpg"));
        assert_eq!(
            sanitize_filename("my  summit photo.png").as_deref(),
            Some("my_summit_photo.png")
        );
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename(r"C:\photos\trail (1).jpg").as_deref(),
            Some("trail_1.jpg")
        );
        assert_eq!(sanitize_filename(".hidden").as_deref(), Some("hidden"));
        assert_eq!(sanitize_filename("..."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn test_stamped_filename() {
        assert_eq!(stamped_filename("run.jpg", stamp()), "20240501073005_run.jpg");
    }

    #[test]
    fn test_store_and_remove_image() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("morning run.jpg");
        fs::write(&src, b"jpeg bytes").unwrap();
        let uploads = dir.path().join("static").join("uploads");

        let name = store_image(&src, &uploads, stamp()).unwrap();
        assert_eq!(name, "20240501073005_morning_run.jpg");
        assert_eq!(fs::read(uploads.join(&name)).unwrap(), b"jpeg bytes");

        remove_image(&uploads, &name).unwrap();
        assert!(!uploads.join(&name).exists());
        // already gone
        remove_image(&uploads, &name).unwrap();
    }

    #[test]
    fn test_store_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = store_image(&dir.path().join("nope.jpg"), dir.path(), stamp()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
