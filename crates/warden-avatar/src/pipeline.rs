//! Avatar ingestion: stage → validate → resize in place → rename into
//! the public directory.
//!
//! Readers of the public directory never observe a partially written
//! avatar: the final step is a single `rename` from the staging area.
//! The staged file is removed on every failure path.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AvatarConfig;
use crate::error::AvatarError;

/// An upload written to a private per-request path, not yet published.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    original_filename: String,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAvatar {
    /// Location on disk inside the public directory.
    pub path: PathBuf,
    /// URL path clients fetch the avatar from.
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct AvatarPipeline {
    config: AvatarConfig,
}

impl AvatarPipeline {
    pub fn new(config: AvatarConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    /// Create the staging and public directories if missing.
    pub async fn prepare(&self) -> Result<(), AvatarError> {
        for dir in [&self.config.staging_dir, &self.config.public_dir] {
            fs::create_dir_all(dir).await.map_err(|e| {
                AvatarError::Io(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }

    /// Write raw upload bytes to a fresh private path in the staging area.
    pub async fn stage(
        &self,
        bytes: &[u8],
        original_filename: &str,
    ) -> Result<StagedUpload, AvatarError> {
        if bytes.len() > self.config.max_upload_bytes {
            return Err(AvatarError::InvalidImage(format!(
                "avatar exceeds {} bytes",
                self.config.max_upload_bytes
            )));
        }

        let path = self
            .config
            .staging_dir
            .join(format!("{}.upload", Uuid::new_v4()));

        if let Err(e) = fs::write(&path, bytes).await {
            discard(&path).await;
            return Err(AvatarError::Io(format!(
                "Failed to stage upload at {}: {e}",
                path.display()
            )));
        }

        Ok(StagedUpload {
            path,
            original_filename: original_filename.to_string(),
        })
    }

    /// Validate, resize and publish a staged upload for `identity`.
    ///
    /// Consumes the staged file: on success it has been renamed into the
    /// public directory, on failure it has been removed.
    pub async fn ingest(
        &self,
        identity: &str,
        upload: StagedUpload,
    ) -> Result<PublishedAvatar, AvatarError> {
        let result = self.publish(identity, &upload).await;
        if let Err(e) = &result {
            warn!(identity, error = %e, "Avatar ingestion failed");
            discard(&upload.path).await;
        }
        result
    }

    async fn publish(
        &self,
        identity: &str,
        upload: &StagedUpload,
    ) -> Result<PublishedAvatar, AvatarError> {
        let (name, format) = target_name(identity, &upload.original_filename)?;

        let bytes = fs::read(&upload.path).await.map_err(|e| {
            AvatarError::Io(format!("Failed to read {}: {e}", upload.path.display()))
        })?;

        let dimension = self.config.dimension;
        let encoded = tokio::task::spawn_blocking(move || transform(&bytes, format, dimension))
            .await
            .map_err(|e| AvatarError::Io(format!("resize task failed: {e}")))??;

        fs::write(&upload.path, &encoded).await.map_err(|e| {
            AvatarError::Io(format!("Failed to write {}: {e}", upload.path.display()))
        })?;

        let target = self.config.public_dir.join(&name);
        fs::rename(&upload.path, &target).await.map_err(|e| {
            AvatarError::Io(format!(
                "Failed to move {} -> {}: {e}",
                upload.path.display(),
                target.display()
            ))
        })?;

        let url = format!("{}/{}", self.config.url_prefix.trim_end_matches('/'), name);
        info!(identity, %url, "Avatar published");

        Ok(PublishedAvatar { path: target, url })
    }
}

/// Published file name for `identity`: `<identity>.<ext>` where `ext` is
/// the lower-cased text after the last `.` of the original name.
pub fn target_name(
    identity: &str,
    original_filename: &str,
) -> Result<(String, ImageFormat), AvatarError> {
    if identity.is_empty()
        || !identity
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AvatarError::Io(format!(
            "refusing to derive avatar name from identity {identity:?}"
        )));
    }

    let ext = original_filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(|| {
            AvatarError::InvalidImage("avatar file name must have an image extension".into())
        })?;

    let format = ImageFormat::from_extension(&ext)
        .ok_or_else(|| AvatarError::InvalidImage(format!("unsupported image type: .{ext}")))?;

    Ok((format!("{identity}.{ext}"), format))
}

/// Decode, resize to `dimension`×`dimension` and re-encode as `format`.
fn transform(bytes: &[u8], format: ImageFormat, dimension: u32) -> Result<Vec<u8>, AvatarError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AvatarError::InvalidImage(format!("not a readable image: {e}")))?;

    let resized = img.resize_exact(dimension, dimension, FilterType::Triangle);
    let resized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        ImageFormat::Png => resized,
        _ => DynamicImage::ImageRgba8(resized.to_rgba8()),
    };

    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, format).map_err(|e| match e {
        ImageError::Unsupported(_) => {
            AvatarError::InvalidImage(format!("cannot encode avatar as {format:?}: {e}"))
        }
        other => AvatarError::Io(format!("encode avatar: {other}")),
    })?;

    Ok(out.into_inner())
}

/// Best-effort removal of a staged file.
async fn discard(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove staged upload"),
    }
}
