use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Parley.
///
/// Each subsystem defines its own error variant. Every variant maps to a
/// stable machine code and an HTTP status so callers always receive a
/// structured failure; internal plumbing continues to use `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ParleyError {
    // ── Input validation ────────────────────────────────────────────────
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    // ── Request envelope (size, deadline) ───────────────────────────────
    #[error("request: {0}")]
    Request(#[from] RequestError),

    // ── Storage backend ─────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Dialogue / speech upstreams ─────────────────────────────────────
    #[error("upstream: {0}")]
    Upstream(#[from] UpstreamError),

    // ── Config ──────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParleyError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Request(e) => e.code(),
            Self::Storage(e) => e.code(),
            Self::Upstream(e) => e.code(),
            Self::Config(_) => "CONFIG_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Request(e) => e.http_status(),
            Self::Storage(_) => 503,
            Self::Upstream(e) => e.http_status(),
            Self::Config(_) | Self::Other(_) => 500,
        }
    }

    /// Message safe to show to an end user.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Request(e) => e.to_string(),
            Self::Storage(_) => "Session storage is temporarily unavailable".to_string(),
            Self::Upstream(e) => match e.service {
                UpstreamService::Dialogue => "The dialogue service failed to respond".to_string(),
                UpstreamService::Speech => "The speech service failed to respond".to_string(),
            },
            Self::Config(_) | Self::Other(_) => "Internal error".to_string(),
        }
    }
}

// ─── Validation errors ───────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} is empty after sanitization")]
    Empty(&'static str),

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidSessionId(_) => "INVALID_SESSION_ID",
            Self::TooLong { .. } => "MESSAGE_TOO_LONG",
            Self::Empty(_) => "EMPTY_MESSAGE",
            Self::MalformedBody(_) => "MALFORMED_BODY",
        }
    }
}

// ─── Request envelope errors ─────────────────────────────────────────────────

/// Raised by the gateway layers before a handler sees the request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("request body exceeds {max} bytes")]
    BodyTooLarge { max: usize },

    #[error("request did not complete within {secs} seconds")]
    TimedOut { secs: u64 },
}

impl RequestError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BodyTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::TimedOut { .. } => "REQUEST_TIMEOUT",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::BodyTooLarge { .. } => 413,
            Self::TimedOut { .. } => 408,
        }
    }
}

// ─── Storage errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend {backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },

    #[error("backend {backend} rejected command: {message}")]
    Rejected { backend: String, message: String },

    #[error("corrupt record under {key}: {message}")]
    Corrupt { key: String, message: String },

    #[error("lock poisoned: {0}")]
    Lock(String),
}

impl StorageError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Corrupt { .. } => "STORAGE_CORRUPT",
            Self::Unavailable { .. } | Self::Rejected { .. } | Self::Lock(_) => {
                "STORAGE_UNAVAILABLE"
            }
        }
    }

    /// Whether another attempt against the same backend might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

// ─── Upstream errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum UpstreamService {
    Dialogue,
    Speech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// Connect or read timeout.
    Timeout,
    /// Transport-level failure before any status was received.
    Transport,
    /// Non-success HTTP status.
    Status,
    /// Success status but the body could not be interpreted.
    Malformed,
    /// Speech endpoint answered with something that is not audio.
    NonAudio,
}

#[derive(Debug, Error)]
#[error("{service} upstream failed ({}): {message}", status_label(.status))]
pub struct UpstreamError {
    pub service: UpstreamService,
    pub failure: UpstreamFailure,
    pub status: Option<u16>,
    pub message: String,
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "no status".to_string(), |s| s.to_string())
}

impl UpstreamError {
    pub fn new(
        service: UpstreamService,
        failure: UpstreamFailure,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            service,
            failure,
            status,
            message: message.into(),
        }
    }

    /// Classify a reqwest transport error.
    pub fn from_transport(service: UpstreamService, err: &reqwest::Error) -> Self {
        let failure = if err.is_timeout() {
            UpstreamFailure::Timeout
        } else {
            UpstreamFailure::Transport
        };
        Self::new(
            service,
            failure,
            err.status().map(|s| s.as_u16()),
            crate::utils::scrub::sanitize_api_error(&err.to_string()),
        )
    }

    pub fn code(&self) -> &'static str {
        match (self.service, self.failure) {
            (UpstreamService::Dialogue, UpstreamFailure::Timeout) => "DIALOGUE_TIMEOUT",
            (UpstreamService::Dialogue, UpstreamFailure::Malformed) => {
                "DIALOGUE_MALFORMED_RESPONSE"
            }
            (UpstreamService::Dialogue, _) => "DIALOGUE_UPSTREAM_ERROR",
            (UpstreamService::Speech, UpstreamFailure::Timeout) => "SPEECH_TIMEOUT",
            (UpstreamService::Speech, UpstreamFailure::NonAudio) => "SPEECH_NON_AUDIO",
            (UpstreamService::Speech, _) => "SPEECH_UPSTREAM_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self.failure {
            UpstreamFailure::Timeout => 504,
            UpstreamFailure::Status if self.status == Some(429) => 429,
            _ => 502,
        }
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ParleyError>;
