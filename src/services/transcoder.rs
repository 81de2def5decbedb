//! Format conversion via ffmpeg.
//!
//! Non-web-native uploads are converted before they become visible in the
//! gallery: HEIC stills to JPEG, QuickTime containers to MP4. Videos also
//! get one representative frame extracted as a thumbnail. Conversion is
//! delegated entirely to an external ffmpeg binary driven as a subprocess;
//! the logic here is path bookkeeping, timeouts, and cleanup of partial
//! output on failure.

use crate::config::TranscodeConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

/// Capability interface for media format conversion
///
/// One fallible operation per conversion kind keeps failure handling typed
/// and exhaustive at the call site.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert a HEIC still image to JPEG
    async fn heic_to_jpeg(&self, input: &Path, output: &Path) -> Result<()>;

    /// Convert a QuickTime (MOV) video to MP4
    async fn mov_to_mp4(&self, input: &Path, output: &Path) -> Result<()>;

    /// Extract one representative frame from a video as a JPEG thumbnail
    async fn video_thumbnail(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Transcoder backed by the ffmpeg command-line tool
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    timeout: Duration,
    thumbnail_offset_seconds: f64,
}

impl FfmpegTranscoder {
    /// Create a transcoder from configuration
    pub fn new(config: &TranscodeConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            thumbnail_offset_seconds: config.thumbnail_offset_seconds,
        }
    }

    /// Run ffmpeg with the given arguments, bounded by the configured timeout
    ///
    /// On non-zero exit the stderr tail is surfaced in the error. The child
    /// is killed if the timeout elapses.
    async fn run(&self, args: &[String], what: &str) -> Result<()> {
        debug!(ffmpeg = %self.ffmpeg_path, args = ?args, "Running ffmpeg");

        let invocation = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, invocation)
            .await
            .map_err(|_| {
                AppError::conversion(format!(
                    "{} timed out after {}s",
                    what,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::conversion(format!("Failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::conversion(format!(
                "{} failed: {}",
                what,
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Run a conversion and delete the output file if it fails
    ///
    /// ffmpeg may leave a truncated file behind when it dies mid-write; no
    /// partial derivative must remain.
    async fn run_and_clean(&self, args: &[String], output_path: &Path, what: &str) -> Result<()> {
        match self.run(args, what).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if output_path.exists() {
                    if let Err(cleanup) = fs::remove_file(output_path).await {
                        warn!(
                            path = %output_path.display(),
                            error = %cleanup,
                            "Failed to remove partial conversion output"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    fn heic_args(input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    fn mov_args(input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    fn thumbnail_args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-ss".to_string(),
            self.thumbnail_offset_seconds.to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vframes".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn heic_to_jpeg(&self, input: &Path, output: &Path) -> Result<()> {
        let args = Self::heic_args(input, output);
        self.run_and_clean(&args, output, "HEIC to JPEG conversion")
            .await
    }

    async fn mov_to_mp4(&self, input: &Path, output: &Path) -> Result<()> {
        let args = Self::mov_args(input, output);
        self.run_and_clean(&args, output, "MOV to MP4 conversion")
            .await
    }

    async fn video_thumbnail(&self, input: &Path, output: &Path) -> Result<()> {
        let args = self.thumbnail_args(input, output);
        self.run_and_clean(&args, output, "Thumbnail extraction")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_transcoder() -> FfmpegTranscoder {
        FfmpegTranscoder::new(&TranscodeConfig {
            ffmpeg_path: "ffmpeg".to_string(),
            timeout_seconds: 60,
            thumbnail_offset_seconds: 1.0,
        })
    }

    #[test]
    fn test_heic_args_shape() {
        let args = FfmpegTranscoder::heic_args(
            &PathBuf::from("/data/media/a.heic"),
            &PathBuf::from("/data/media/a.jpg"),
        );

        assert_eq!(args[0], "-y");
        assert!(args.contains(&"/data/media/a.heic".to_string()));
        assert_eq!(args.last().unwrap(), "/data/media/a.jpg");
    }

    #[test]
    fn test_thumbnail_args_include_offset() {
        let t = test_transcoder();
        let args = t.thumbnail_args(
            &PathBuf::from("/data/media/clip.mp4"),
            &PathBuf::from("/data/thumbnails/clip.jpg"),
        );

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "1");
        assert!(args.contains(&"-vframes".to_string()));
    }

    #[test]
    fn test_mov_args_request_faststart() {
        let args = FfmpegTranscoder::mov_args(
            &PathBuf::from("in.mov"),
            &PathBuf::from("out.mp4"),
        );

        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_conversion_error() {
        let t = FfmpegTranscoder::new(&TranscodeConfig {
            ffmpeg_path: "/nonexistent/ffmpeg-binary".to_string(),
            timeout_seconds: 5,
            thumbnail_offset_seconds: 1.0,
        });

        let err = t
            .heic_to_jpeg(Path::new("in.heic"), Path::new("out.jpg"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conversion(_)));
    }
}
