use crate::{Result, StoreError};
use std::path::{Path, PathBuf};

/// Directory holding registrant photos.
#[derive(Debug, Clone)]
pub struct Uploads {
    dir: PathBuf,
}

impl Uploads {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `bytes` under a unique name derived from `original_name`.
    ///
    /// Returns the stored file name.
    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let clean = sanitize_filename(original_name)
            .ok_or_else(|| StoreError::InvalidPhotoName(original_name.to_string()))?;
        let stored = format!("{}_{clean}", uuid::Uuid::new_v4().simple());
        std::fs::write(self.dir.join(&stored), bytes)?;
        tracing::debug!(original = original_name, stored = %stored, bytes = bytes.len(), "photo saved");
        Ok(stored)
    }

    /// Absolute location of a stored photo.
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        let plain = !name.is_empty()
            && !name.contains(['/', '\\'])
            && name != "."
            && name != ".."
            && !name.starts_with('.');
        if !plain {
            return Err(StoreError::InvalidPhotoName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }

    /// Delete a stored photo. A file that is already gone is not an error.
    pub fn remove(&self, name: &str) -> Result<()> {
        match std::fs::remove_file(self.path(name)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(photo = name, "photo already removed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Reduce a client-supplied file name to a safe, flat ASCII name.
///
/// Directory components are dropped, whitespace becomes `_`, anything other
/// than ASCII alphanumerics, `.`, `-`, `_` is removed, and leading dots or
/// underscores are stripped. `None` if nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let trimmed = cleaned.trim_start_matches(['.', '_']);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My cool pic.jpg").as_deref(), Some("My_cool_pic.jpg"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\Users\\me\\face.png").as_deref(), Some("face.png"));
        assert_eq!(sanitize_filename(".hidden.png").as_deref(), Some("hidden.png"));
        assert_eq!(sanitize_filename("fötö.png").as_deref(), Some("ft.png"));
        assert_eq!(sanitize_filename("..").as_deref(), None);
        assert_eq!(sanitize_filename("   ").as_deref(), None);
        assert_eq!(sanitize_filename("").as_deref(), None);
    }

    #[test]
    fn test_save_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::new(dir.path().join("uploads")).unwrap();

        let a = uploads.save("face.jpg", b"first").unwrap();
        let b = uploads.save("face.jpg", b"second").unwrap();
        assert_ne!(a, b);
        assert!(a.ends_with("_face.jpg"));
        assert_eq!(std::fs::read(uploads.path(&a).unwrap()).unwrap(), b"first");
        assert_eq!(std::fs::read(uploads.path(&b).unwrap()).unwrap(), b"second");
    }

    #[test]
    fn test_save_rejects_unusable_name() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::new(dir.path()).unwrap();
        assert!(matches!(uploads.save("///", b"x"), Err(StoreError::InvalidPhotoName(_))));
    }

    #[test]
    fn test_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::new(dir.path()).unwrap();
        assert!(uploads.path("../persons.db").is_err());
        assert!(uploads.path("a/b.png").is_err());
        assert!(uploads.path("..").is_err());
        assert!(uploads.path("ok.png").is_ok());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::new(dir.path()).unwrap();
        let name = uploads.save("x.png", b"x").unwrap();
        uploads.remove(&name).unwrap();
        assert!(!uploads.path(&name).unwrap().exists());
        uploads.remove(&name).unwrap();
    }
}
