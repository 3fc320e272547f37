//! Image upload storage. Files land under the configured uploads directory
//! with a generated unique filename; only the filename is persisted.

use std::path::Path;

use uuid::Uuid;

use crate::error::{AppError, AppResult};

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Unique stored filename preserving the original extension.
pub fn generate_filename(original: &str) -> AppResult<String> {
    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| AppError::BadRequest("Image file has no extension".into()))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported image type: {extension}"
        )));
    }

    Ok(format!("{}.{}", Uuid::new_v4(), extension))
}

/// Write uploaded bytes to the uploads directory, returning the stored
/// filename to persist on the row.
pub async fn save_image(uploads_dir: &str, original: &str, bytes: &[u8]) -> AppResult<String> {
    let filename = generate_filename(original)?;
    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let path = Path::new(uploads_dir).join(&filename);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_keeps_extension_and_is_unique() {
        let a = generate_filename("photo.JPG").unwrap();
        let b = generate_filename("photo.jpg").unwrap();
        assert!(a.ends_with(".jpg"));
        assert_ne!(a, b);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        assert!(generate_filename("script.exe").is_err());
        assert!(generate_filename("noextension").is_err());
    }
}
