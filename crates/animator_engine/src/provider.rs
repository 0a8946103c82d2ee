use std::sync::Arc;
use std::time::Duration;

use animator_core::{JobHandle, JobSpec, ProviderFault};
use animator_logging::{animator_debug, animator_info};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::auth::AuthorizationProvider;
use crate::{ProviderError, ProviderErrorKind};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub model: String,
    /// Output resolution tier requested for every job.
    pub resolution: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_asset_bytes: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "veo-3.1-fast-generate-preview".to_string(),
            resolution: "720p".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            max_asset_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Remote video generation service.
#[async_trait::async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn create_job(&self, spec: &JobSpec) -> Result<JobHandle, ProviderError>;

    /// Side-effect free re-read of an operation.
    async fn poll_job(&self, handle: &JobHandle) -> Result<JobHandle, ProviderError>;

    /// Authenticated download of a finished asset.
    async fn fetch_asset(&self, uri: &str) -> Result<Bytes, ProviderError>;
}

pub struct GeminiProvider {
    settings: GeminiSettings,
    client: reqwest::Client,
    auth: Arc<dyn AuthorizationProvider>,
}

impl GeminiProvider {
    pub fn new(
        settings: GeminiSettings,
        auth: Arc<dyn AuthorizationProvider>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ProviderError::new(ProviderErrorKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            client,
            auth,
        })
    }

    async fn api_key(&self) -> Result<String, ProviderError> {
        self.auth.credential().await.ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::MissingCredential,
                "no credential selected",
            )
        })
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, ProviderError> {
        let raw = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path);
        reqwest::Url::parse(&raw)
            .map_err(|err| ProviderError::new(ProviderErrorKind::InvalidUrl, err.to_string()))
    }

    fn create_body<'a>(&'a self, spec: &'a JobSpec) -> PredictRequest<'a> {
        PredictRequest {
            instances: [Instance {
                prompt: &spec.prompt,
                image: InlineImage {
                    bytes_base64_encoded: BASE64.encode(&spec.image.bytes),
                    mime_type: &spec.image.mime_type,
                },
            }],
            parameters: Parameters {
                aspect_ratio: spec.aspect_ratio.as_str(),
                resolution: &self.settings.resolution,
                sample_count: spec.sample_count,
            },
        }
    }
}

#[async_trait::async_trait]
impl GenerationProvider for GeminiProvider {
    async fn create_job(&self, spec: &JobSpec) -> Result<JobHandle, ProviderError> {
        let key = self.api_key().await?;
        let url = self.endpoint(&format!(
            "models/{}:predictLongRunning",
            self.settings.model
        ))?;
        animator_info!(
            "create job model={} aspect_ratio={} image_bytes={}",
            self.settings.model,
            spec.aspect_ratio,
            spec.image.bytes.len()
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, key)
            .json(&self.create_body(spec))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let operation: OperationBody = read_json(response).await?;
        Ok(operation.into_handle())
    }

    async fn poll_job(&self, handle: &JobHandle) -> Result<JobHandle, ProviderError> {
        let key = self.api_key().await?;
        let url = self.endpoint(&handle.name)?;
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, key)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let operation: OperationBody = read_json(response).await?;
        animator_debug!("poll {} done={}", operation.name, operation.done);
        Ok(operation.into_handle())
    }

    async fn fetch_asset(&self, uri: &str) -> Result<Bytes, ProviderError> {
        let key = self.api_key().await?;
        let url = reqwest::Url::parse(uri)
            .map_err(|err| ProviderError::new(ProviderErrorKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, key)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;

        let max_bytes = self.settings.max_asset_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ProviderError::new(
                    ProviderErrorKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "asset too large",
                ));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ProviderError::new(
                    ProviderErrorKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "asset too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }
        animator_info!("downloaded asset ({} bytes)", body.len());
        Ok(body.freeze())
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: Parameters<'a>,
}

#[derive(Serialize)]
struct Instance<'a> {
    prompt: &'a str,
    image: InlineImage<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineImage<'a> {
    bytes_base64_encoded: String,
    mime_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters<'a> {
    aspect_ratio: &'a str,
    resolution: &'a str,
    sample_count: u8,
}

#[derive(Debug, Deserialize)]
struct OperationBody {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<OperationResponse>,
    error: Option<ErrorPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    code: Option<u16>,
    #[serde(default)]
    message: String,
    status: Option<String>,
}

impl OperationBody {
    fn into_handle(self) -> JobHandle {
        let asset_uri = self
            .response
            .and_then(|response| response.generate_video_response)
            .and_then(|videos| videos.generated_samples.into_iter().next())
            .and_then(|sample| sample.video)
            .and_then(|video| video.uri);
        JobHandle {
            name: self.name,
            done: self.done,
            asset_uri,
            error: self.error.map(|payload| ProviderFault {
                code: payload.code,
                status: payload.status,
                message: payload.message,
            }),
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let (message, remote_status) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (status.to_string(), None),
    };
    Err(
        ProviderError::new(ProviderErrorKind::HttpStatus(status.as_u16()), message)
            .with_remote_status(remote_status),
    )
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = check_status(response).await?;
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body)
        .map_err(|err| ProviderError::new(ProviderErrorKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        return ProviderError::new(ProviderErrorKind::Timeout, err.to_string());
    }
    ProviderError::new(ProviderErrorKind::Network, err.to_string())
}
