use std::path::Path;

use uuid::Uuid;

/// Subdirectory of the media root holding profile pictures.
pub const PROFILE_IMAGES_DIR: &str = "profile_images";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// The normalized extension of an uploaded picture, if its name says it is
/// an image we accept.
pub fn picture_extension(filename: &str) -> Option<&'static str> {
    let is_image = mime_guess::from_path(filename)
        .first()
        .is_some_and(|m| m.type_().as_str() == "image");
    if !is_image {
        return None;
    }

    let ext = Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().copied().find(|e| *e == ext)
}

/// Write a profile picture under a fresh name and return its path relative
/// to the media root.
pub async fn store_profile_picture(
    media_root: &Path,
    extension: &str,
    bytes: &[u8],
) -> std::io::Result<String> {
    let dir = media_root.join(PROFILE_IMAGES_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let name = format!("{}.{}", Uuid::now_v7(), extension);
    tokio::fs::write(dir.join(&name), bytes).await?;

    Ok(format!("{PROFILE_IMAGES_DIR}/{name}"))
}

/// Delete a file previously returned by [`store_profile_picture`].
///
/// Failures are logged, not returned; callers are already unwinding.
pub async fn remove_stored_file(media_root: &Path, relative: &str) {
    if let Err(e) = tokio::fs::remove_file(media_root.join(relative)).await {
        tracing::warn!(path = relative, "Failed to remove stored file: {}", e);
    }
}
