pub mod http;
pub mod memory;

pub use http::HttpTransport;
pub use memory::InMemoryTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure classes a log transport can report.
///
/// The shipper branches on these explicitly: `InvalidSequenceToken` triggers
/// a refresh-and-retry cycle, `AlreadyExists` is success during
/// provisioning, and everything else is terminal for the current call.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid sequence token: {0}")]
    InvalidSequenceToken(String),

    #[error("request throttled: {0}")]
    Throttled(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("transient transport failure: {0}")]
    Transient(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Stable label for log fields and error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::AlreadyExists(_) => "already_exists",
            TransportError::InvalidSequenceToken(_) => "invalid_sequence_token",
            TransportError::Throttled(_) => "throttled",
            TransportError::AccessDenied(_) => "access_denied",
            TransportError::Transient(_) => "transient",
            TransportError::Other(_) => "other",
        }
    }
}

/// One record in a put batch: the wall-clock send time in epoch milliseconds
/// plus the full JSON serialization of an event. `timestamp_ms` is captured
/// at send, not at event creation; consumers must not assume the two agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputLogEvent {
    pub timestamp_ms: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescription {
    pub name: String,
    pub upload_sequence_token: Option<String>,
}

/// Capability handle onto an append-only log store with a two-level
/// group/stream namespace and per-stream write ordering tokens.
#[async_trait]
pub trait LogTransport: Send + Sync {
    async fn create_log_group(&self, group: &str) -> Result<(), TransportError>;

    async fn create_log_stream(&self, group: &str, stream: &str) -> Result<(), TransportError>;

    /// Streams in `group` whose name starts with `stream_prefix`.
    async fn describe_streams(
        &self,
        group: &str,
        stream_prefix: &str,
    ) -> Result<Vec<StreamDescription>, TransportError>;

    /// Append a batch to the stream. `sequence_token` must be the token from
    /// the previous successful write (or absent for a fresh stream); returns
    /// the token to use on the next write.
    async fn put_log_events(
        &self,
        group: &str,
        stream: &str,
        events: &[InputLogEvent],
        sequence_token: Option<&str>,
    ) -> Result<String, TransportError>;
}
