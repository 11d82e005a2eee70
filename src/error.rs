use thiserror::Error;

/// Failure of a single HTTP exchange with the vendor API.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether a retry has a realistic chance of succeeding. Retries happen
    /// regardless; this only feeds the retry log line.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Connect(_) | TransportError::Timeout(_) => true,
            TransportError::Status { status, .. } => *status >= 500 || *status == 429,
            TransportError::Decode(_) | TransportError::Other(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum SeedreamError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Generation error: {message}")]
    GenerationError {
        message: String,
        #[source]
        source: Option<TransportError>,
    },
}

impl SeedreamError {
    pub fn generation(message: impl Into<String>) -> Self {
        SeedreamError::GenerationError {
            message: message.into(),
            source: None,
        }
    }

    /// The transport failure behind a generation error, if there was one.
    pub fn transport_cause(&self) -> Option<&TransportError> {
        match self {
            SeedreamError::GenerationError { source, .. } => source.as_ref(),
            _ => None,
        }
    }
}

impl From<TransportError> for SeedreamError {
    fn from(err: TransportError) -> Self {
        SeedreamError::GenerationError {
            message: format!("image generation request failed: {}", err),
            source: Some(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeedreamError>;
