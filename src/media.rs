//! Media references for logos, icons and product images.
//!
//! Rows only store a relative path such as `product/images/shoe.png`; the bytes
//! live in a [`MediaStorage`] backend.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

static INVALID_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^-\w.]").expect("valid regex"));

const COLLISION_SUFFIX_LEN: usize = 7;
const MAX_SAVE_ATTEMPTS: usize = 100;

/// Upload directory for each kind of media the catalog references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadTo {
    ManufacturerLogo,
    BrandLogo,
    CategoryLogo,
    CategoryIcon,
    ProductImages,
}

impl UploadTo {
    pub fn dir(self) -> &'static str {
        match self {
            UploadTo::ManufacturerLogo => "product/manufacturer_logo",
            UploadTo::BrandLogo => "product/brand_logo",
            UploadTo::CategoryLogo => "product/category_logo",
            UploadTo::CategoryIcon => "product/category_icon",
            UploadTo::ProductImages => "product/images",
        }
    }
}

impl fmt::Display for UploadTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid media path: {0}")]
    InvalidPath(String),
    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not find a free name for {0}")]
    Exhausted(String),
}

/// File storage collaborator for media referenced by catalog rows.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Stores `bytes` under the upload directory and returns the relative path to persist.
    async fn save(&self, upload_to: UploadTo, filename: &str, bytes: &[u8])
        -> Result<String, MediaError>;

    async fn delete(&self, path: &str) -> Result<(), MediaError>;

    async fn exists(&self, path: &str) -> Result<bool, MediaError>;
}

/// Stores media on the local filesystem below a root directory.
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(MediaError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn save(
        &self,
        upload_to: UploadTo,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let clean = valid_filename(filename)?;
        let dir = self.root.join(upload_to.dir());
        tokio::fs::create_dir_all(&dir).await?;

        let mut candidate = clean.clone();
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let target = dir.join(&candidate);
            // create_new refuses to clobber a file saved by someone else in the meantime
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await;
            match opened {
                Ok(mut file) => {
                    use tokio::io::AsyncWriteExt;
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    let stored = format!("{}/{}", upload_to.dir(), candidate);
                    debug!(path = %stored, size = bytes.len(), "Stored media file");
                    return Ok(stored);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = with_random_suffix(&clean);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(MediaError::Exhausted(clean))
    }

    async fn delete(&self, path: &str) -> Result<(), MediaError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, MediaError> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }
}

/// Reduces an uploaded filename to a safe basename.
///
/// Directory components are dropped, spaces become underscores and anything
/// outside `[-\w.]` is removed.
pub fn valid_filename(filename: &str) -> Result<String, MediaError> {
    let base = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim()
        .replace(' ', "_");
    let clean = INVALID_FILENAME_CHARS.replace_all(&base, "").into_owned();
    if clean.is_empty() || clean == "." || clean == ".." {
        return Err(MediaError::InvalidPath(filename.to_string()));
    }
    Ok(clean)
}

fn with_random_suffix(filename: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(COLLISION_SUFFIX_LEN)
        .map(char::from)
        .collect();
    match filename.rfind('.') {
        Some(dot) if dot > 0 => format!("{}_{}{}", &filename[..dot], suffix, &filename[dot..]),
        _ => format!("{}_{}", filename, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn upload_dirs_follow_product_namespace() {
        assert_eq!(UploadTo::ManufacturerLogo.dir(), "product/manufacturer_logo");
        assert_eq!(UploadTo::BrandLogo.dir(), "product/brand_logo");
        assert_eq!(UploadTo::CategoryLogo.dir(), "product/category_logo");
        assert_eq!(UploadTo::CategoryIcon.dir(), "product/category_icon");
        assert_eq!(UploadTo::ProductImages.to_string(), "product/images");
    }

    #[test]
    fn valid_filename_strips_directories_and_symbols() {
        assert_eq!(valid_filename("../../etc/my logo!.png").unwrap(), "my_logo.png");
        assert_eq!(valid_filename("C:\\uploads\\shoe.jpg").unwrap(), "shoe.jpg");
        assert_matches!(valid_filename("???"), Err(MediaError::InvalidPath(_)));
        assert_matches!(valid_filename(".."), Err(MediaError::InvalidPath(_)));
    }

    #[test]
    fn random_suffix_goes_before_extension() {
        let renamed = with_random_suffix("shoe.tar.gz");
        assert!(renamed.starts_with("shoe.tar_"));
        assert!(renamed.ends_with(".gz"));
        assert_eq!(renamed.len(), "shoe.tar.gz".len() + 1 + COLLISION_SUFFIX_LEN);

        let bare = with_random_suffix("README");
        assert!(bare.starts_with("README_"));
    }

    #[test]
    fn resolve_rejects_escaping_paths() {
        let storage = LocalMediaStorage::new("/srv/media");
        assert_matches!(storage.resolve("../secret"), Err(MediaError::InvalidPath(_)));
        assert_matches!(storage.resolve("/etc/passwd"), Err(MediaError::InvalidPath(_)));
        assert_matches!(storage.resolve(""), Err(MediaError::InvalidPath(_)));
        assert_eq!(
            storage.resolve("product/images/a.png").unwrap(),
            PathBuf::from("/srv/media/product/images/a.png")
        );
    }
}
