pub mod sequence;

pub use sequence::{SequenceTokenManager, StreamTarget, StreamWriteState};

use crate::event::Event;
use crate::transport::{InputLogEvent, LogTransport, TransportError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{error, info, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ShipError {
    #[error("failed to provision log group/stream: {0}")]
    StreamProvisioningFailed(TransportError),

    #[error("transport rejected batch: {0}")]
    TransportRejected(TransportError),

    #[error("gave up after {attempts} attempts with a stale sequence token")]
    RetriesExhausted { attempts: u32 },

    #[error("transport did not respond within {0:?}")]
    Timeout(Duration),

    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Delivers event batches to one log stream, holding the stream's exclusive
/// send permit across each attempt sequence.
///
/// Retry policy: a stale sequence token triggers a refresh and another
/// attempt, bounded at `max_attempts` total; every other transport failure
/// aborts immediately. Token state is mutated only after a
/// confirmed-successful write.
pub struct EventShipper {
    transport: Arc<dyn LogTransport>,
    tokens: SequenceTokenManager,
    max_attempts: u32,
    attempt_timeout: Duration,
}

impl EventShipper {
    pub fn new(transport: Arc<dyn LogTransport>, target: StreamTarget) -> Self {
        Self::with_limits(
            transport,
            target,
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_ATTEMPT_TIMEOUT,
        )
    }

    pub fn with_limits(
        transport: Arc<dyn LogTransport>,
        target: StreamTarget,
        max_attempts: u32,
        attempt_timeout: Duration,
    ) -> Self {
        let tokens = SequenceTokenManager::new(Arc::clone(&transport), target);
        Self {
            transport,
            tokens,
            max_attempts: max_attempts.max(1),
            attempt_timeout,
        }
    }

    pub fn target(&self) -> &StreamTarget {
        self.tokens.target()
    }

    /// Idempotently create the target group and stream and prime the token.
    pub async fn ensure_stream_exists(&self) -> Result<(), ShipError> {
        self.tokens
            .ensure_stream_exists()
            .await
            .map_err(ShipError::StreamProvisioningFailed)
    }

    pub async fn send_event(&self, event: &Event) -> Result<(), ShipError> {
        self.send(std::slice::from_ref(event)).await
    }

    /// Serialize `events` into one batch (input order preserved) and drive
    /// the send-with-retry protocol against the stream.
    pub async fn send(&self, events: &[Event]) -> Result<(), ShipError> {
        if events.is_empty() {
            return Ok(());
        }

        let records = encode_batch(events)?;
        let target = self.tokens.target();

        // Exclusive send permit, held across every attempt including the
        // token refreshes
        let mut state = self.tokens.acquire().await;

        let mut attempts = 0u32;
        loop {
            attempts += 1;

            let put = self.transport.put_log_events(
                &target.group,
                &target.stream,
                &records,
                state.current_token(),
            );
            let result = timeout(self.attempt_timeout, put)
                .await
                .map_err(|_| ShipError::Timeout(self.attempt_timeout))?;

            match result {
                Ok(next_token) => {
                    state.record_token(next_token);
                    info!(
                        log_group = %target.group,
                        log_stream = %target.stream,
                        events = events.len(),
                        attempts = attempts,
                        "Shipped event batch"
                    );
                    return Ok(());
                }

                Err(TransportError::InvalidSequenceToken(detail)) => {
                    if attempts >= self.max_attempts {
                        error!(
                            log_group = %target.group,
                            log_stream = %target.stream,
                            attempts = attempts,
                            "Sequence token still stale after final attempt"
                        );
                        return Err(ShipError::RetriesExhausted { attempts });
                    }

                    warn!(
                        log_group = %target.group,
                        log_stream = %target.stream,
                        attempt = attempts,
                        detail = %detail,
                        "Stale sequence token, refreshing"
                    );
                    timeout(self.attempt_timeout, self.tokens.refresh(&mut state))
                        .await
                        .map_err(|_| ShipError::Timeout(self.attempt_timeout))?
                        .map_err(ShipError::TransportRejected)?;
                }

                Err(e) => {
                    error!(
                        log_group = %target.group,
                        log_stream = %target.stream,
                        kind = e.kind(),
                        error = %e,
                        "Transport rejected batch"
                    );
                    return Err(ShipError::TransportRejected(e));
                }
            }
        }
    }
}

/// One transport record per event, input order preserved. The record
/// timestamp is wall-clock send time, independent of each event's
/// `timestamp_ns`.
fn encode_batch(events: &[Event]) -> Result<Vec<InputLogEvent>, ShipError> {
    let timestamp_ms = Utc::now().timestamp_millis();
    events
        .iter()
        .map(|event| {
            let message = serde_json::to_string(event)?;
            Ok(InputLogEvent {
                timestamp_ms,
                message,
            })
        })
        .collect()
}
