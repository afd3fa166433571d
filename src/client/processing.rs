use std::time::Duration;

use crate::assets::decode::{SourceImage, probe_dimensions};
use crate::config::EditorConfig;
use crate::foundation::error::{UnmarkError, UnmarkResult};
use crate::render::backend::MaskImage;

/// Endpoint receiving `image` + `mask` multipart submissions.
pub const PROCESS_IMAGE_PATH: &str = "process-image";

const ERROR_BODY_LIMIT: usize = 512;

/// Image returned by the backend, already checked to decode.
///
/// Only [`ProcessingClient::submit`] builds one, so its dimensions can be trusted downstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessingResult {
    pub(crate) bytes: Vec<u8>,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl ProcessingResult {
    /// Encoded bytes exactly as received.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decoded width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Decoded height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Take the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[derive(serde::Deserialize)]
struct HealthBody {
    message: String,
}

/// Stateless HTTP client for the inpainting backend.
///
/// Each call is a single attempt; failures are reported, never retried.
#[derive(Clone, Debug)]
pub struct ProcessingClient {
    http: reqwest::Client,
    process_url: String,
    root_url: String,
}

impl ProcessingClient {
    /// Build a client for `config.api_base_url`.
    pub fn new(config: &EditorConfig) -> UnmarkResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| UnmarkError::network(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            process_url: config.endpoint(PROCESS_IMAGE_PATH),
            root_url: config.endpoint(""),
        })
    }

    /// Full URL submissions are posted to.
    pub fn process_url(&self) -> &str {
        &self.process_url
    }

    /// Send the original image and its mask; return the processed image.
    #[tracing::instrument(
        skip_all,
        fields(url = %self.process_url, image_len = source.encoded.len(), mask_w = mask.width)
    )]
    pub async fn submit(
        &self,
        source: &SourceImage,
        mask: &MaskImage,
    ) -> UnmarkResult<ProcessingResult> {
        let image_part = reqwest::multipart::Part::bytes(source.encoded.as_ref().clone())
            .file_name(source.file_name.clone())
            .mime_str(source.content_type)
            .map_err(|e| UnmarkError::validation(format!("image content type: {e}")))?;
        let mask_part = reqwest::multipart::Part::bytes(mask.png.clone())
            .file_name(MaskImage::FILE_NAME)
            .mime_str("image/png")
            .map_err(|e| UnmarkError::validation(format!("mask content type: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("image", image_part)
            .part("mask", mask_part);

        let resp = self
            .http
            .post(&self.process_url)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;
        let resp = check_status(resp).await?;

        if let Some(ct) = resp.headers().get(reqwest::header::CONTENT_TYPE) {
            let ct = ct.to_str().unwrap_or_default().to_ascii_lowercase();
            if !(ct.starts_with("image/") || ct.starts_with("application/octet-stream")) {
                return Err(UnmarkError::decode(format!(
                    "expected an image response, got content type '{ct}'"
                )));
            }
        }

        let bytes = resp.bytes().await.map_err(map_transport_error)?.to_vec();
        let (width, height) = probe_dimensions(&bytes)?;
        tracing::debug!(width, height, bytes = bytes.len(), "processed image received");
        Ok(ProcessingResult {
            bytes,
            width,
            height,
        })
    }

    /// Ask the backend root endpoint for its status message.
    pub async fn health(&self) -> UnmarkResult<String> {
        let resp = self
            .http
            .get(&self.root_url)
            .send()
            .await
            .map_err(map_transport_error)?;
        let resp = check_status(resp).await?;
        let body = resp.bytes().await.map_err(map_transport_error)?;
        let parsed: HealthBody = serde_json::from_slice(&body)
            .map_err(|e| UnmarkError::decode(format!("health response: {e}")))?;
        Ok(parsed.message)
    }
}

async fn check_status(resp: reqwest::Response) -> UnmarkResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    tracing::warn!(status = status.as_u16(), "backend returned failure status");
    Err(UnmarkError::server(status.as_u16(), message))
}

fn map_transport_error(e: reqwest::Error) -> UnmarkError {
    if e.is_timeout() {
        UnmarkError::network(format!("request timed out: {e}"))
    } else if e.is_connect() {
        UnmarkError::network(format!("backend unreachable: {e}"))
    } else {
        UnmarkError::network(e.to_string())
    }
}
