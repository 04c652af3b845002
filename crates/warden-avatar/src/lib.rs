//! Warden Avatar — validates uploaded images, resizes them to a fixed
//! square and publishes them under an identity-derived name.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::AvatarConfig;
pub use error::AvatarError;
pub use pipeline::{AvatarPipeline, PublishedAvatar, StagedUpload};
