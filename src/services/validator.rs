//! Upload validation.
//!
//! A candidate filename is accepted only if it has an extension and that
//! extension (case-insensitive) is in the configured allow-list. The
//! sanitized name is safe to use as a single path segment; sanitization
//! never alters the extension beyond case folding.

use crate::config::UploadConfig;
use crate::error::{AppError, Result};
use crate::models::MediaKind;

/// A filename that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    /// Sanitized filename, safe as one path segment
    pub sanitized_filename: String,
    /// Lowercased extension (no dot)
    pub extension: String,
    /// Classification derived from the extension
    pub kind: MediaKind,
}

/// Validates candidate filenames against the configured allow-lists
#[derive(Debug, Clone)]
pub struct Validator {
    upload: UploadConfig,
}

impl Validator {
    /// Create a validator from the upload configuration
    pub fn new(upload: &UploadConfig) -> Self {
        Self {
            upload: upload.clone(),
        }
    }

    /// Validate a candidate filename
    ///
    /// # Errors
    /// - `Validation` if the filename is empty or sanitizes to nothing
    /// - `UnsupportedMediaType` if there is no extension or it is not allowed
    pub fn validate(&self, filename: &str) -> Result<ValidatedUpload> {
        if filename.trim().is_empty() {
            return Err(AppError::validation("Filename is empty"));
        }

        let sanitized = sanitize_filename(filename);
        if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
            return Err(AppError::validation(format!(
                "Filename {:?} contains no usable characters",
                filename
            )));
        }

        let extension = match sanitized.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
            _ => {
                return Err(AppError::unsupported_media_type(format!(
                    "Filename {:?} has no extension",
                    filename
                )))
            }
        };

        let kind = self.classify(&extension).ok_or_else(|| {
            AppError::unsupported_media_type(format!(
                "Extension {:?} is not in the allow-list",
                extension
            ))
        })?;

        Ok(ValidatedUpload {
            sanitized_filename: sanitized,
            extension,
            kind,
        })
    }

    /// Classify an extension as image or video, if allowed
    pub fn classify(&self, extension: &str) -> Option<MediaKind> {
        if self.upload.is_allowed_image_extension(extension) {
            Some(MediaKind::Image)
        } else if self.upload.is_allowed_video_extension(extension) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Sanitize a filename into a single safe path segment
///
/// Strips any leading path (both separator styles) and drops characters
/// outside `[A-Za-z0-9 . - _]`.
pub fn sanitize_filename(filename: &str) -> String {
    let last_segment = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = last_segment
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .collect();

    // "." and ".." must never survive as names
    if cleaned.trim_matches('.').is_empty() {
        String::new()
    } else {
        cleaned
    }
}

/// Check that a client-supplied stored filename is one safe path segment
///
/// Used by handlers that take a filename in the URL path before it is joined
/// onto a storage directory.
pub fn ensure_safe_component(filename: &str) -> Result<()> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename == "."
        || filename == ".."
    {
        return Err(AppError::validation(format!(
            "Invalid filename {:?}",
            filename
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadConfig;

    fn test_validator() -> Validator {
        Validator::new(&UploadConfig {
            max_upload_size: 1024,
            allowed_image_extensions: vec![
                "png".into(),
                "jpg".into(),
                "jpeg".into(),
                "gif".into(),
                "bmp".into(),
                "webp".into(),
                "heic".into(),
            ],
            allowed_video_extensions: vec![
                "mp4".into(),
                "mov".into(),
                "avi".into(),
                "mkv".into(),
                "webm".into(),
            ],
        })
    }

    #[test]
    fn test_accepts_allowed_extensions() {
        let v = test_validator();

        let png = v.validate("photo.png").unwrap();
        assert_eq!(png.kind, MediaKind::Image);
        assert_eq!(png.extension, "png");

        let heic = v.validate("IMG_0001.HEIC").unwrap();
        assert_eq!(heic.kind, MediaKind::Image);
        assert_eq!(heic.extension, "heic");

        let mov = v.validate("clip.MOV").unwrap();
        assert_eq!(mov.kind, MediaKind::Video);
        assert_eq!(mov.extension, "mov");
    }

    #[test]
    fn test_rejects_disallowed_or_missing_extension() {
        let v = test_validator();

        assert!(matches!(
            v.validate("script.exe"),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            v.validate("noextension"),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(v.validate(""), Err(AppError::Validation(_))));
        assert!(matches!(v.validate("   "), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_sanitize_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd.png"), "passwd.png");
        assert_eq!(sanitize_filename("C:\\Users\\me\\photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename("a b?.png"), "ab.png");
        assert_eq!(sanitize_filename("weird<>|name.gif"), "weirdname.gif");
    }

    #[test]
    fn test_sanitize_preserves_extension() {
        let v = test_validator();
        let validated = v.validate("/tmp/upload dir/snap shot.JPeG").unwrap();
        assert_eq!(validated.sanitized_filename, "snapshot.JPeG");
        assert_eq!(validated.extension, "jpeg");
    }

    #[test]
    fn test_dot_names_rejected() {
        let v = test_validator();
        assert!(v.validate("..").is_err());
        assert!(v.validate(".").is_err());
    }

    #[test]
    fn test_ensure_safe_component() {
        assert!(ensure_safe_component("photo.jpg").is_ok());
        assert!(ensure_safe_component("a/b.jpg").is_err());
        assert!(ensure_safe_component("..").is_err());
        assert!(ensure_safe_component("").is_err());
    }
}
