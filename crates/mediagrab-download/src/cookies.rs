//! Cookie file store.
//!
//! Manages uploaded credential files used for authenticated fetches.
//! Uploaded files expire after 24 hours and are swept opportunistically
//! before listing; the default (non-uploaded) file never expires and is
//! always listed first when present.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Default lifetime of an uploaded cookie file.
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// The reserved name that maps to the default cookie file.
pub const DEFAULT_COOKIE_NAME: &str = "default";

/// One cookie file known to the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CookieRecord {
    /// Logical name (stored filename without the `.txt` extension).
    pub name: String,
    pub path: PathBuf,
    /// False only for the default record.
    pub uploaded: bool,
    /// Upload timestamp, absent for the default record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<String>,
}

/// Errors from cookie store operations.
#[derive(Debug, Error)]
pub enum CookieError {
    /// Uploads must be `.txt` files.
    #[error("Only .txt files are allowed")]
    InvalidExtension,

    /// Uploaded content was empty after trimming.
    #[error("Cookie file is empty")]
    EmptyFile,

    /// A file with the generated name already exists.
    #[error("Cookie file '{name}' already exists")]
    AlreadyExists {
        name: String,
    },

    /// No cookie file with the given name.
    #[error("Cookie file '{name}' not found")]
    NotFound {
        name: String,
    },

    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// File-backed cookie store.
pub struct CookieStore {
    dir: PathBuf,
    default_file: PathBuf,
    max_age: Duration,
}

impl CookieStore {
    /// Open a store over the given directory and default cookie file.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, default_file: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            default_file: default_file.into(),
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Override the expiry age (test hook).
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Store uploaded cookie content under a collision-resistant name.
    ///
    /// The stored name is the sanitized original stem plus an upload
    /// timestamp. Content validation happens after the write; a file that
    /// fails validation is removed again.
    pub fn upload(&self, file_name: &str, content: &[u8]) -> Result<CookieRecord, CookieError> {
        let stem = file_name
            .strip_suffix(".txt")
            .ok_or(CookieError::InvalidExtension)?;
        let stem = sanitize_stem(stem);

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let stored_name = format!("{stem}_{timestamp}");
        let path = self.dir.join(format!("{stored_name}.txt"));
        if path.exists() {
            return Err(CookieError::AlreadyExists { name: stored_name });
        }

        fs::create_dir_all(&self.dir)?;
        fs::write(&path, content)?;

        if content.iter().all(u8::is_ascii_whitespace) {
            let _ = fs::remove_file(&path);
            return Err(CookieError::EmptyFile);
        }

        tracing::info!(name = %stored_name, "Cookie file uploaded");
        Ok(CookieRecord {
            name: stored_name,
            path,
            uploaded: true,
            upload_time: Some(Local::now().format("%Y-%m-%d %H:%M").to_string()),
        })
    }

    /// Delete an uploaded cookie file by name.
    pub fn delete(&self, name: &str) -> Result<(), CookieError> {
        let path = self.dir.join(format!("{name}.txt"));
        if !path.is_file() {
            return Err(CookieError::NotFound {
                name: name.to_string(),
            });
        }
        fs::remove_file(&path)?;
        tracing::info!(name = %name, "Cookie file deleted");
        Ok(())
    }

    /// List available cookie files.
    ///
    /// Sweeps expired uploads first. The default record comes first when
    /// its file exists; uploads follow, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<CookieRecord> {
        self.sweep_expired();

        let mut records = Vec::new();
        if self.default_file.exists() {
            records.push(CookieRecord {
                name: DEFAULT_COOKIE_NAME.to_string(),
                path: self.default_file.clone(),
                uploaded: false,
                upload_time: None,
            });
        }

        let mut uploaded: Vec<(SystemTime, CookieRecord)> = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                let Some(name) = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_suffix(".txt"))
                else {
                    continue;
                };
                let Ok(meta) = entry.metadata() else { continue };
                if !meta.is_file() {
                    continue;
                }
                let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                uploaded.push((
                    modified,
                    CookieRecord {
                        name: name.to_string(),
                        path: path.clone(),
                        uploaded: true,
                        upload_time: Some(
                            DateTime::<Local>::from(modified)
                                .format("%Y-%m-%d %H:%M")
                                .to_string(),
                        ),
                    },
                ));
            }
        }
        uploaded.sort_by(|a, b| b.0.cmp(&a.0));
        records.extend(uploaded.into_iter().map(|(_, r)| r));
        records
    }

    /// Map a logical cookie name to its file path, verifying existence.
    ///
    /// `"default"` resolves to the fixed default file; anything else maps
    /// into the store directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, CookieError> {
        let path = if name == DEFAULT_COOKIE_NAME {
            self.default_file.clone()
        } else {
            self.dir.join(format!("{name}.txt"))
        };
        if !path.is_file() {
            return Err(CookieError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(path)
    }

    /// Whether any cookie file is currently usable.
    #[must_use]
    pub fn any_available(&self) -> bool {
        !self.list().is_empty()
    }

    /// The fixed default cookie path (may not exist).
    #[must_use]
    pub fn default_path(&self) -> &Path {
        &self.default_file
    }

    /// Remove uploaded files older than the configured age. The default
    /// file lives outside the store directory and is never touched.
    fn sweep_expired(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|m| SystemTime::now().duration_since(m).ok());
            if age.is_some_and(|age| age > self.max_age) {
                if fs::remove_file(entry.path()).is_ok() {
                    tracing::info!(path = %entry.path().display(), "Removed expired cookie file");
                }
            }
        }
    }
}

/// Keep only filesystem-safe characters in an uploaded file stem.
fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "cookies".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> CookieStore {
        CookieStore::new(tmp.path().join("cookies"), tmp.path().join("cookies.txt"))
    }

    #[test]
    fn upload_and_resolve() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let record = store.upload("work.txt", b"# Netscape HTTP Cookie File\n").unwrap();
        assert!(record.uploaded);
        assert!(record.name.starts_with("work_"));
        assert!(record.path.is_file());

        let resolved = store.resolve(&record.name).unwrap();
        assert_eq!(resolved, record.path);
    }

    #[test]
    fn upload_rejects_wrong_extension() {
        let tmp = TempDir::new().unwrap();
        let err = store(&tmp).upload("cookies.json", b"x").unwrap_err();
        assert!(matches!(err, CookieError::InvalidExtension));
    }

    #[test]
    fn upload_rejects_empty_content_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let err = store.upload("blank.txt", b"  \n ").unwrap_err();
        assert!(matches!(err, CookieError::EmptyFile));
        assert!(store.list().is_empty());
    }

    #[test]
    fn delete_then_resolve_fails() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let record = store.upload("session.txt", b"data").unwrap();

        store.delete(&record.name).unwrap();
        assert!(matches!(
            store.resolve(&record.name),
            Err(CookieError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&record.name),
            Err(CookieError::NotFound { .. })
        ));
    }

    #[test]
    fn default_record_listed_first_and_never_expires() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("cookies.txt"), b"default data").unwrap();
        let store = store(&tmp).with_max_age(Duration::ZERO);
        store.upload("old.txt", b"data").unwrap();

        // Zero max-age expires every upload on the next listing
        let records = store.list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, DEFAULT_COOKIE_NAME);
        assert!(!records[0].uploaded);
    }

    #[test]
    fn expired_uploads_are_swept_before_listing() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).with_max_age(Duration::ZERO);
        let record = store.upload("gone.txt", b"data").unwrap();

        assert!(store.list().is_empty());
        assert!(!record.path.exists());
    }

    #[test]
    fn resolve_default_requires_the_file() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        assert!(matches!(
            store.resolve(DEFAULT_COOKIE_NAME),
            Err(CookieError::NotFound { .. })
        ));

        std::fs::write(tmp.path().join("cookies.txt"), b"data").unwrap();
        assert_eq!(
            store.resolve(DEFAULT_COOKIE_NAME).unwrap(),
            tmp.path().join("cookies.txt")
        );
    }
}
