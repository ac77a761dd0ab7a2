use thiserror::Error;

/// Errors produced by the backend client.
///
/// One enum covers every operation: the backend applies a single response
/// contract, so login, alert submission and contact CRUD all fail the same
/// ways.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure: DNS, TLS, timeout, connection reset.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Server answered 2xx but the body was empty or unparseable.
    #[error("empty or malformed response body")]
    EmptyResponse,

    /// The configured base URL could not be parsed or joined.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Status code for `Http` errors, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reasons surfaced by the alert submission flow.
#[derive(Error, Debug)]
pub enum AlertError {
    /// Location permission has not been granted; the caller should run the
    /// platform permission prompt and retry.
    #[error("location permission not granted")]
    PermissionDenied,

    /// The resolver could not produce a position. Alerts are never sent
    /// without coordinates.
    #[error("location unavailable")]
    LocationUnavailable,

    #[error(transparent)]
    Api(#[from] ApiError),
}
