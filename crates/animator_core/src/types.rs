use std::fmt;
use std::str::FromStr;

use url::Url;

/// Prompt used when the caller leaves the prompt empty.
pub const DEFAULT_PROMPT: &str =
    "Smooth cinematic animation adding life to the character in the photo";

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    /// 16:9
    #[default]
    Landscape,
    /// 9:16
    Portrait,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAspectRatioError(pub String);

impl fmt::Display for ParseAspectRatioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported aspect ratio {:?} (expected 16:9 or 9:16)", self.0)
    }
}

impl std::error::Error for ParseAspectRatioError {}

impl FromStr for AspectRatio {
    type Err = ParseAspectRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            other => Err(ParseAspectRatioError(other.to_string())),
        }
    }
}

/// Encoded input image as picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationRequest {
    pub source_image: Option<SourceImage>,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    pub fn new(source_image: SourceImage, aspect_ratio: AspectRatio) -> Self {
        Self {
            source_image: Some(source_image),
            prompt: String::new(),
            aspect_ratio,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// The prompt sent to the provider; blank input falls back to [`DEFAULT_PROMPT`].
    pub fn effective_prompt(&self) -> &str {
        let trimmed = self.prompt.trim();
        if trimmed.is_empty() {
            DEFAULT_PROMPT
        } else {
            trimmed
        }
    }
}

/// What the provider is asked to create for one accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub image: SourceImage,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub sample_count: u8,
}

/// Provider-issued operation state. Only ever built from provider responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub name: String,
    pub done: bool,
    pub asset_uri: Option<String>,
    pub error: Option<ProviderFault>,
}

impl JobHandle {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            asset_uri: None,
            error: None,
        }
    }
}

/// A failed provider call or an error payload on a finished operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFault {
    /// HTTP status, or the numeric code of an error payload.
    pub code: Option<u16>,
    /// Symbolic status such as `PERMISSION_DENIED`.
    pub status: Option<String>,
    pub message: String,
}

const AUTH_STATUSES: &[&str] = &["UNAUTHENTICATED", "PERMISSION_DENIED"];
const AUTH_MESSAGE_PATTERNS: &[&str] = &["requested entity was not found", "api key not valid"];

impl ProviderFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            status: None,
            message: message.into(),
        }
    }

    /// Structured signals win; the message match is a last resort.
    pub fn is_authorization_failure(&self) -> bool {
        if matches!(self.code, Some(401 | 403)) {
            return true;
        }
        if let Some(status) = self.status.as_deref() {
            if AUTH_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(status)) {
                return true;
            }
        }
        let message = self.message.to_ascii_lowercase();
        AUTH_MESSAGE_PATTERNS
            .iter()
            .any(|pattern| message.contains(pattern))
    }
}

impl fmt::Display for ProviderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.status.as_deref()) {
            (Some(code), Some(status)) => write!(f, "{code} {status}: {}", self.message),
            (Some(code), None) => write!(f, "{code}: {}", self.message),
            (None, Some(status)) => write!(f, "{status}: {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoResult {
    pub asset_url: Url,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    MissingInput,
    JobActive,
    MissingAuthorization,
    Unauthorized(ProviderFault),
    Provider(ProviderFault),
    NoAssetProduced,
    Storage { message: String },
    Abandoned,
}

impl JobFailure {
    /// Classifies a provider fault into authorization or generic failure.
    pub fn from_fault(fault: ProviderFault) -> Self {
        if fault.is_authorization_failure() {
            JobFailure::Unauthorized(fault)
        } else {
            JobFailure::Provider(fault)
        }
    }

    pub fn needs_authorization(&self) -> bool {
        matches!(
            self,
            JobFailure::MissingAuthorization | JobFailure::Unauthorized(_)
        )
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailure::MissingInput => write!(f, "no source image supplied"),
            JobFailure::JobActive => write!(f, "a generation job is already running"),
            JobFailure::MissingAuthorization => write!(f, "no credential selected"),
            JobFailure::Unauthorized(fault) => write!(f, "credential rejected: {fault}"),
            JobFailure::Provider(fault) => write!(f, "provider error: {fault}"),
            JobFailure::NoAssetProduced => write!(f, "operation finished without a video"),
            JobFailure::Storage { message } => write!(f, "could not store video: {message}"),
            JobFailure::Abandoned => write!(f, "job monitor stopped before the job finished"),
        }
    }
}

impl std::error::Error for JobFailure {}
