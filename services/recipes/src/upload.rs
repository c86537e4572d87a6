//! Managed image storage on the local filesystem
//!
//! Uploaded files are named by the service, written under one directory and
//! exposed publicly as `images/<key>`. A stored file stays only if the write
//! it belongs to succeeds; see [`ImageStore::settle`].

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::ApiResult;

/// Public path prefix of managed files, as stored in `img_name`
pub const PUBLIC_PREFIX: &str = "images";

/// Multipart field names that may carry the image
pub const IMAGE_FIELDS: [&str; 2] = ["img", "image"];

/// Image MIME types accepted for upload and the file extensions that go
/// with each; the first extension is the canonical one
pub const ALLOWED_TYPES: [(&str, &[&str]); 4] = [
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
];

/// Extensions a file of an accepted MIME type may be stored under
pub fn extensions_for(content_type: &str) -> Option<&'static [&'static str]> {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, extensions)| *extensions)
}

/// Canonical extension for an accepted MIME type
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    extensions_for(content_type).and_then(|extensions| extensions.first().copied())
}

fn key_regex() -> &'static Regex {
    static KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    KEY_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9]+-[0-9]+\.[a-z0-9]{1,8}$").expect("Failed to compile storage key regex")
    })
}

/// Derive the file name a new upload is stored under
///
/// The original extension is kept only when it is one of `extensions`,
/// the extensions of the declared MIME type. Anything else is stored under
/// the first of them so the file is never served as another type.
pub fn storage_key(
    original_name: Option<&str>,
    extensions: &[&str],
    timestamp_millis: i64,
    suffix: u32,
) -> String {
    let fallback = extensions.first().copied().unwrap_or("bin");
    let ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| extensions.contains(&ext.as_str()))
        .unwrap_or_else(|| fallback.to_string());

    format!("{}-{:09}.{}", timestamp_millis, suffix, ext)
}

/// A file written by [`ImageStore::save`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    /// File name inside the managed directory
    pub key: String,
    /// Value persisted as the recipe's `img_name`
    pub img_name: String,
    pub path: PathBuf,
}

/// Managed image directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    /// Create a store rooted at `root` accepting files up to `max_bytes`
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Create the managed directory if it does not exist yet
    pub async fn init(&self) -> Result<()> {
        self.ensure_dir().await?;
        info!("Serving managed images from {}", self.root.display());
        Ok(())
    }

    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create image directory {}", self.root.display()))
    }

    /// Write an accepted upload under a fresh storage key
    pub async fn save(
        &self,
        original_name: Option<&str>,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredImage> {
        let extensions = extensions_for(content_type)
            .with_context(|| format!("Unsupported image type {}", content_type))?;
        let suffix = rand::thread_rng().gen_range(0..1_000_000_000);
        let key = storage_key(
            original_name,
            extensions,
            Utc::now().timestamp_millis(),
            suffix,
        );

        self.ensure_dir().await?;
        let path = self.root.join(&key);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write image {}", path.display()))?;

        debug!("Stored {} byte image as {}", data.len(), key);
        Ok(StoredImage {
            img_name: format!("{}/{}", PUBLIC_PREFIX, key),
            key,
            path,
        })
    }

    /// Remove a managed file by its `img_name`
    ///
    /// Missing files are ignored and other failures are logged; names that
    /// do not point at a storage key inside the directory are left alone.
    pub async fn remove(&self, img_name: &str) {
        let key = img_name
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(img_name);

        if !key_regex().is_match(key) {
            warn!("Refusing to remove unmanaged image path {:?}", img_name);
            return;
        }

        let path = self.root.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Removed image {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Image {} already gone", path.display())
            }
            Err(e) => warn!("Failed to remove image {}: {}", path.display(), e),
        }
    }

    /// Keep `image` only if `result` succeeded
    ///
    /// On failure the file is removed before the error is handed back.
    pub async fn settle<T>(
        &self,
        image: Option<&StoredImage>,
        result: ApiResult<T>,
    ) -> ApiResult<T> {
        if result.is_err() {
            if let Some(image) = image {
                self.remove(&image.img_name).await;
            }
        }
        result
    }
}
