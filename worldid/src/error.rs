use thiserror::Error;

/// Status reported when the portal could not be reached at all.
pub const TRANSPORT_FAILURE_STATUS: u16 = 502;

#[derive(Debug, Error)]
pub enum WorldIdError {
    /// Transport failure or a non-2xx answer. `body` is the first 1000
    /// characters of the upstream body (or the transport error).
    #[error("World ID service error: {status}")]
    ServiceError { status: u16, body: String },

    #[error("World ID response was not valid JSON: {0}")]
    Malformed(String),

    #[error("World ID rejected the proof: {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected {
        code: Option<String>,
        detail: Option<String>,
        attribute: Option<String>,
    },

    #[error("World ID verification succeeded without a nullifier hash")]
    Incomplete,

    #[error("missing proof field: {0}")]
    MissingField(&'static str),

    #[error("developer portal API key not configured")]
    MissingApiKey,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl WorldIdError {
    /// HTTP status the caller should surface for this failure.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::ServiceError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
