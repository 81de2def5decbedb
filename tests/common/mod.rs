//! Common test utilities and helpers.

#![allow(dead_code)]

use media_gallery_server::{
    config::{
        Config, LoggingConfig, NamingPolicy, ServerConfig, StorageConfig, TranscodeConfig,
        UploadConfig,
    },
    create_router, AppState,
};
use std::net::TcpListener;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener as TokioTcpListener;

/// Test server instance
pub struct TestServer {
    pub base_url: String,
    pub data_dir: TempDir,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a test server on a random port
    pub async fn start() -> Self {
        let port = get_available_port();
        let data_dir = TempDir::new().expect("Failed to create temp dir");
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = create_test_config(&data_dir, port, &base_url);

        let state = AppState::new(config)
            .await
            .expect("Failed to create app state");

        let app = create_router(state);

        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
        let listener = TokioTcpListener::bind(addr)
            .await
            .expect("Failed to bind listener");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            tokio::select! {
                _ = axum::serve(listener, app) => {}
                _ = shutdown_rx => {}
            }
        });

        // Give the server time to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            base_url,
            data_dir,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get HTTP client
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap()
    }

    /// Build a full URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Create test configuration
fn create_test_config(data_dir: &TempDir, port: u16, base_url: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            base_url: base_url.to_string(),
            request_timeout: 30,
        },
        storage: StorageConfig {
            data_dir: data_dir.path().to_path_buf(),
            media_dir: "media".to_string(),
            thumbnail_dir: "thumbnails".to_string(),
            naming: NamingPolicy::Preserve,
        },
        upload: UploadConfig {
            max_upload_size: 10 * 1024 * 1024,
            allowed_image_extensions: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "heic".to_string(),
            ],
            allowed_video_extensions: vec!["mp4".to_string(), "mov".to_string()],
        },
        transcode: TranscodeConfig::default(),
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Find an available TCP port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to random port")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

/// Create a test PNG image
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    use image::codecs::png::PngEncoder;
    use image::{ImageBuffer, ImageEncoder, Rgb};

    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([((x * 255) / width) as u8, ((y * 255) / height) as u8, 128])
    });

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .expect("Failed to encode PNG");

    buffer
}

/// Create a test JPEG image
pub fn create_test_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageBuffer, ImageEncoder, Rgb};

    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([((x * 255) / width) as u8, ((y * 255) / height) as u8, 200])
    });

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .expect("Failed to encode JPEG");

    buffer
}

/// Upload a single file, optionally with album and description fields
pub async fn upload_file(
    server: &TestServer,
    filename: &str,
    data: Vec<u8>,
    album: Option<&str>,
    description: Option<&str>,
) -> reqwest::Response {
    use reqwest::multipart;

    let mut form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(data).file_name(filename.to_string()),
    );

    if let Some(album) = album {
        form = form.text("album", album.to_string());
    }
    if let Some(description) = description {
        form = form.text("description", description.to_string());
    }

    server
        .client()
        .post(server.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send upload request")
}
