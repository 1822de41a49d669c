use crate::transport::{LogTransport, TransportError};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// The (group, stream) pair a shipper writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    pub group: String,
    pub stream: String,
}

/// Mutable write-ordering state for one (group, stream) pair.
///
/// `None` means no prior write has been observed and the token must be
/// omitted on the next put.
#[derive(Debug, Default)]
pub struct StreamWriteState {
    sequence_token: Option<String>,
}

impl StreamWriteState {
    pub fn current_token(&self) -> Option<&str> {
        self.sequence_token.as_deref()
    }

    /// Record the next-token from a confirmed-successful write.
    pub fn record_token(&mut self, token: String) {
        self.sequence_token = Some(token);
    }
}

/// Owns the sequence token for one stream and the exclusive send permit
/// guarding it.
///
/// The permit (the `Mutex` around [`StreamWriteState`]) must be held across
/// an entire send attempt sequence, not just the token update: at most one
/// write attempt may be in flight per stream at a time.
pub struct SequenceTokenManager {
    target: StreamTarget,
    transport: Arc<dyn LogTransport>,
    state: Mutex<StreamWriteState>,
}

impl SequenceTokenManager {
    pub fn new(transport: Arc<dyn LogTransport>, target: StreamTarget) -> Self {
        Self {
            target,
            transport,
            state: Mutex::new(StreamWriteState::default()),
        }
    }

    pub fn target(&self) -> &StreamTarget {
        &self.target
    }

    /// Acquire the exclusive send permit, blocking until it is free.
    pub async fn acquire(&self) -> MutexGuard<'_, StreamWriteState> {
        self.state.lock().await
    }

    /// Idempotently create the log group and stream, then prime the token.
    /// "Already exists" is success; any other failure surfaces to the caller.
    pub async fn ensure_stream_exists(&self) -> Result<(), TransportError> {
        match self.transport.create_log_group(&self.target.group).await {
            Ok(()) | Err(TransportError::AlreadyExists(_)) => {}
            Err(e) => return Err(e),
        }

        match self
            .transport
            .create_log_stream(&self.target.group, &self.target.stream)
            .await
        {
            Ok(()) | Err(TransportError::AlreadyExists(_)) => {}
            Err(e) => return Err(e),
        }

        let mut state = self.state.lock().await;
        self.refresh(&mut state).await
    }

    /// Re-read the stream's current upload token from the backend and
    /// overwrite local state unconditionally. A backend report of "no
    /// streams" clears the token; it is not an error.
    pub async fn refresh(&self, state: &mut StreamWriteState) -> Result<(), TransportError> {
        let streams = self
            .transport
            .describe_streams(&self.target.group, &self.target.stream)
            .await?;

        let token = streams
            .into_iter()
            .next()
            .and_then(|s| s.upload_sequence_token);

        debug!(
            log_group = %self.target.group,
            log_stream = %self.target.stream,
            has_token = token.is_some(),
            "Refreshed sequence token"
        );
        state.sequence_token = token;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{InputLogEvent, StreamDescription};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Transport stub with canned describe/create behavior.
    #[derive(Default)]
    struct StubTransport {
        streams: Vec<StreamDescription>,
        group_exists: bool,
        fail_stream_create: bool,
        describes: AtomicU32,
    }

    #[async_trait]
    impl LogTransport for StubTransport {
        async fn create_log_group(&self, group: &str) -> Result<(), TransportError> {
            if self.group_exists {
                Err(TransportError::AlreadyExists(group.to_string()))
            } else {
                Ok(())
            }
        }

        async fn create_log_stream(&self, _: &str, stream: &str) -> Result<(), TransportError> {
            if self.fail_stream_create {
                Err(TransportError::AccessDenied(format!(
                    "not allowed to create '{}'",
                    stream
                )))
            } else {
                Ok(())
            }
        }

        async fn describe_streams(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Vec<StreamDescription>, TransportError> {
            self.describes.fetch_add(1, Ordering::SeqCst);
            Ok(self.streams.clone())
        }

        async fn put_log_events(
            &self,
            _: &str,
            _: &str,
            _: &[InputLogEvent],
            _: Option<&str>,
        ) -> Result<String, TransportError> {
            Ok("unused".to_string())
        }
    }

    fn make_target() -> StreamTarget {
        StreamTarget {
            group: "/aws/news_feed_parser".to_string(),
            stream: "entity_extraction_stream".to_string(),
        }
    }

    #[tokio::test]
    async fn test_refresh_with_no_streams_clears_token() {
        let manager =
            SequenceTokenManager::new(Arc::new(StubTransport::default()), make_target());

        let mut state = manager.acquire().await;
        state.record_token("stale".to_string());
        manager.refresh(&mut state).await.unwrap();
        assert!(state.current_token().is_none());
    }

    #[tokio::test]
    async fn test_refresh_takes_first_stream_token() {
        let transport = StubTransport {
            streams: vec![
                StreamDescription {
                    name: "entity_extraction_stream".to_string(),
                    upload_sequence_token: Some("token-42".to_string()),
                },
                StreamDescription {
                    name: "entity_extraction_stream_old".to_string(),
                    upload_sequence_token: Some("token-7".to_string()),
                },
            ],
            ..Default::default()
        };
        let manager = SequenceTokenManager::new(Arc::new(transport), make_target());

        let mut state = manager.acquire().await;
        manager.refresh(&mut state).await.unwrap();
        assert_eq!(state.current_token(), Some("token-42"));
    }

    #[tokio::test]
    async fn test_ensure_treats_already_exists_as_success() {
        let transport = StubTransport {
            group_exists: true,
            ..Default::default()
        };
        let manager = SequenceTokenManager::new(Arc::new(transport), make_target());
        manager.ensure_stream_exists().await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_surfaces_other_provisioning_failures() {
        let transport = StubTransport {
            fail_stream_create: true,
            ..Default::default()
        };
        let manager = SequenceTokenManager::new(Arc::new(transport), make_target());

        let err = manager.ensure_stream_exists().await;
        assert!(matches!(err, Err(TransportError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_ensure_primes_token_from_backend() {
        let transport = StubTransport {
            streams: vec![StreamDescription {
                name: "entity_extraction_stream".to_string(),
                upload_sequence_token: Some("token-1".to_string()),
            }],
            ..Default::default()
        };
        let manager = SequenceTokenManager::new(Arc::new(transport), make_target());

        manager.ensure_stream_exists().await.unwrap();
        let state = manager.acquire().await;
        assert_eq!(state.current_token(), Some("token-1"));
    }
}
