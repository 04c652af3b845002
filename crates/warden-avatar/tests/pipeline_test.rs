//! Integration tests for the avatar pipeline on a scratch filesystem.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use warden_avatar::{AvatarConfig, AvatarError, AvatarPipeline};

async fn setup() -> (TempDir, AvatarPipeline) {
    let root = tempfile::tempdir().unwrap();
    let pipeline = AvatarPipeline::new(AvatarConfig {
        staging_dir: root.path().join("tmp"),
        public_dir: root.path().join("public/avatars"),
        ..AvatarConfig::default()
    });
    pipeline.prepare().await.unwrap();
    (root, pipeline)
}

fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn large_image_is_published_as_fixed_square() {
    let (root, pipeline) = setup().await;
    let bytes = encoded_image(4000, 3000, ImageFormat::Jpeg);

    let staged = pipeline.stage(&bytes, "Holiday.JPG").await.unwrap();
    let published = pipeline.ingest("abc", staged).await.unwrap();

    assert_eq!(published.url, "/avatars/abc.jpg");
    assert_eq!(published.path, root.path().join("public/avatars/abc.jpg"));

    let output = image::open(&published.path).unwrap();
    assert_eq!(output.width(), 250);
    assert_eq!(output.height(), 250);

    // Staging area is empty after publish.
    assert_eq!(dir_entries(&root.path().join("tmp")), 0);
}

#[tokio::test]
async fn same_input_gives_same_output_bytes() {
    let (root, pipeline) = setup().await;
    let bytes = encoded_image(640, 480, ImageFormat::Png);

    let first = pipeline
        .ingest("abc", pipeline.stage(&bytes, "a.png").await.unwrap())
        .await
        .unwrap();
    let first_bytes = std::fs::read(&first.path).unwrap();

    let second = pipeline
        .ingest("abc", pipeline.stage(&bytes, "b.PNG").await.unwrap())
        .await
        .unwrap();
    let second_bytes = std::fs::read(&second.path).unwrap();

    // Same identity + extension overwrites the same target.
    assert_eq!(first.path, second.path);
    assert_eq!(first_bytes, second_bytes);
    assert_eq!(dir_entries(&root.path().join("public/avatars")), 1);
}

#[tokio::test]
async fn corrupt_upload_is_rejected_and_cleaned_up() {
    let (root, pipeline) = setup().await;

    let staged = pipeline
        .stage(b"GIF89a but not really", "avatar.gif")
        .await
        .unwrap();
    assert!(staged.path().exists());

    let err = pipeline.ingest("abc", staged).await.unwrap_err();
    assert!(matches!(err, AvatarError::InvalidImage(_)), "got {err:?}");

    assert_eq!(dir_entries(&root.path().join("tmp")), 0);
    assert_eq!(dir_entries(&root.path().join("public/avatars")), 0);
}

#[tokio::test]
async fn unsupported_extension_is_cleaned_up() {
    let (root, pipeline) = setup().await;
    let bytes = encoded_image(32, 32, ImageFormat::Png);

    let staged = pipeline.stage(&bytes, "avatar.exe").await.unwrap();
    let err = pipeline.ingest("abc", staged).await.unwrap_err();

    assert!(matches!(err, AvatarError::InvalidImage(_)));
    assert_eq!(dir_entries(&root.path().join("tmp")), 0);
}

#[tokio::test]
async fn publish_failure_removes_staged_file() {
    let (root, pipeline) = setup().await;
    let bytes = encoded_image(32, 32, ImageFormat::Png);

    // A directory squatting on the target path makes the rename fail.
    std::fs::create_dir(root.path().join("public/avatars/abc.png")).unwrap();
    std::fs::write(root.path().join("public/avatars/abc.png/keep"), b"x").unwrap();

    let staged = pipeline.stage(&bytes, "me.png").await.unwrap();
    let err = pipeline.ingest("abc", staged).await.unwrap_err();

    assert!(matches!(err, AvatarError::Io(_)), "got {err:?}");
    assert_eq!(dir_entries(&root.path().join("tmp")), 0);
}

#[tokio::test]
async fn oversized_upload_is_never_staged() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = AvatarPipeline::new(AvatarConfig {
        staging_dir: root.path().join("tmp"),
        public_dir: root.path().join("public"),
        max_upload_bytes: 16,
        ..AvatarConfig::default()
    });
    pipeline.prepare().await.unwrap();

    let err = pipeline.stage(&[0u8; 17], "a.png").await.unwrap_err();
    assert!(matches!(err, AvatarError::InvalidImage(_)));
    assert_eq!(dir_entries(&root.path().join("tmp")), 0);
}
