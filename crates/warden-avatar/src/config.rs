//! Avatar pipeline configuration.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AvatarConfig {
    /// Private scratch directory for uploads in flight. Must live on the
    /// same filesystem as `public_dir` for the publish rename to be atomic.
    pub staging_dir: PathBuf,
    /// Directory served to clients.
    pub public_dir: PathBuf,
    /// URL path under which `public_dir` is served.
    pub url_prefix: String,
    /// Edge length of the square output, in pixels.
    pub dimension: u32,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("tmp"),
            public_dir: PathBuf::from("public/avatars"),
            url_prefix: "/avatars".into(),
            dimension: 250,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}
