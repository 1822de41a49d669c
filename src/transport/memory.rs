use crate::transport::{InputLogEvent, LogTransport, StreamDescription, TransportError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Process-local log store enforcing the same write-ordering protocol as the
/// remote backend: each successful put advances the stream's sequence token,
/// and a put carrying anything but the current token is rejected with
/// `InvalidSequenceToken`. Backs the demo harness and the protocol tests.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    groups: HashMap<String, LogGroup>,
}

#[derive(Debug, Default)]
struct LogGroup {
    streams: HashMap<String, LogStream>,
}

#[derive(Debug, Default)]
struct LogStream {
    events: Vec<InputLogEvent>,
    sequence_token: Option<String>,
    writes: u64,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages stored in a stream, in append order. Empty if the stream
    /// does not exist.
    pub async fn messages(&self, group: &str, stream: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .groups
            .get(group)
            .and_then(|g| g.streams.get(stream))
            .map(|s| s.events.iter().map(|e| e.message.clone()).collect())
            .unwrap_or_default()
    }

    pub async fn event_count(&self, group: &str, stream: &str) -> usize {
        let state = self.state.lock().await;
        state
            .groups
            .get(group)
            .and_then(|g| g.streams.get(stream))
            .map(|s| s.events.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl LogTransport for InMemoryTransport {
    async fn create_log_group(&self, group: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        if state.groups.contains_key(group) {
            return Err(TransportError::AlreadyExists(format!(
                "log group '{}' already exists",
                group
            )));
        }
        state.groups.insert(group.to_string(), LogGroup::default());
        Ok(())
    }

    async fn create_log_stream(&self, group: &str, stream: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        let log_group = state
            .groups
            .get_mut(group)
            .ok_or_else(|| TransportError::Other(format!("log group '{}' does not exist", group)))?;

        if log_group.streams.contains_key(stream) {
            return Err(TransportError::AlreadyExists(format!(
                "log stream '{}' already exists in '{}'",
                stream, group
            )));
        }
        log_group
            .streams
            .insert(stream.to_string(), LogStream::default());
        Ok(())
    }

    async fn describe_streams(
        &self,
        group: &str,
        stream_prefix: &str,
    ) -> Result<Vec<StreamDescription>, TransportError> {
        let state = self.state.lock().await;
        let log_group = state
            .groups
            .get(group)
            .ok_or_else(|| TransportError::Other(format!("log group '{}' does not exist", group)))?;

        let mut descriptions: Vec<StreamDescription> = log_group
            .streams
            .iter()
            .filter(|(name, _)| name.starts_with(stream_prefix))
            .map(|(name, stream)| StreamDescription {
                name: name.clone(),
                upload_sequence_token: stream.sequence_token.clone(),
            })
            .collect();
        descriptions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(descriptions)
    }

    async fn put_log_events(
        &self,
        group: &str,
        stream: &str,
        events: &[InputLogEvent],
        sequence_token: Option<&str>,
    ) -> Result<String, TransportError> {
        let mut state = self.state.lock().await;
        let log_stream = state
            .groups
            .get_mut(group)
            .and_then(|g| g.streams.get_mut(stream))
            .ok_or_else(|| {
                TransportError::Other(format!(
                    "log stream '{}' does not exist in '{}'",
                    stream, group
                ))
            })?;

        if sequence_token != log_stream.sequence_token.as_deref() {
            return Err(TransportError::InvalidSequenceToken(format!(
                "expected {:?}, got {:?}",
                log_stream.sequence_token, sequence_token
            )));
        }

        log_stream.events.extend_from_slice(events);
        log_stream.writes += 1;
        let next_token = format!("{:020}", log_stream.writes);
        log_stream.sequence_token = Some(next_token.clone());
        Ok(next_token)
    }
}
