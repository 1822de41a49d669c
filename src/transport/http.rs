use crate::transport::{InputLogEvent, LogTransport, StreamDescription, TransportError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TARGET_PREFIX: &str = "Logs_20140328";

/// HTTP adapter for a CloudWatch-Logs-compatible JSON endpoint.
///
/// Speaks the `X-Amz-Target` wire protocol against a configured base URL and
/// maps the service's `__type` exception names onto [`TransportError`].
/// Request signing is not handled here; point it at a local emulator or a
/// signing proxy.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        if endpoint.trim().is_empty() {
            return Err(TransportError::Other(
                "log endpoint must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn call<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-amz-target", format!("{}.{}", TARGET_PREFIX, action))
            .header("content-type", "application/x-amz-json-1.1")
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Transient(format!("http request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Transient(format!("failed to read response: {}", e)))?;

        if !(200..300).contains(&status) {
            return Err(map_service_error(status, &body));
        }

        // Several actions return an empty body on success
        let body = if body.trim().is_empty() { "{}" } else { &body };
        serde_json::from_str(body)
            .map_err(|e| TransportError::Other(format!("malformed response body: {}", e)))
    }
}

#[async_trait]
impl LogTransport for HttpTransport {
    async fn create_log_group(&self, group: &str) -> Result<(), TransportError> {
        let _: Empty = self
            .call(
                "CreateLogGroup",
                &CreateLogGroupRequest {
                    log_group_name: group,
                },
            )
            .await?;
        Ok(())
    }

    async fn create_log_stream(&self, group: &str, stream: &str) -> Result<(), TransportError> {
        let _: Empty = self
            .call(
                "CreateLogStream",
                &CreateLogStreamRequest {
                    log_group_name: group,
                    log_stream_name: stream,
                },
            )
            .await?;
        Ok(())
    }

    async fn describe_streams(
        &self,
        group: &str,
        stream_prefix: &str,
    ) -> Result<Vec<StreamDescription>, TransportError> {
        let response: DescribeLogStreamsResponse = self
            .call(
                "DescribeLogStreams",
                &DescribeLogStreamsRequest {
                    log_group_name: group,
                    log_stream_name_prefix: stream_prefix,
                },
            )
            .await?;

        Ok(response
            .log_streams
            .into_iter()
            .map(|s| StreamDescription {
                name: s.log_stream_name,
                upload_sequence_token: s.upload_sequence_token,
            })
            .collect())
    }

    async fn put_log_events(
        &self,
        group: &str,
        stream: &str,
        events: &[InputLogEvent],
        sequence_token: Option<&str>,
    ) -> Result<String, TransportError> {
        let request = PutLogEventsRequest {
            log_group_name: group,
            log_stream_name: stream,
            log_events: events
                .iter()
                .map(|e| WireLogEvent {
                    timestamp: e.timestamp_ms,
                    message: &e.message,
                })
                .collect(),
            sequence_token,
        };

        let response: PutLogEventsResponse = self.call("PutLogEvents", &request).await?;
        response
            .next_sequence_token
            .ok_or_else(|| TransportError::Other("response missing nextSequenceToken".to_string()))
    }
}

/// Map an error response onto the transport taxonomy. The service names the
/// exception class in the `__type` field, optionally namespace-prefixed
/// (`com.amazonaws...#InvalidSequenceTokenException`).
fn map_service_error(status: u16, body: &str) -> TransportError {
    let parsed: ServiceErrorBody = serde_json::from_str(body).unwrap_or_default();
    let exception = parsed
        .error_type
        .rsplit('#')
        .next()
        .unwrap_or("")
        .to_string();
    let detail = if parsed.message.is_empty() {
        format!("status {}: {}", status, body.trim())
    } else {
        parsed.message
    };

    match exception.as_str() {
        "ResourceAlreadyExistsException" => TransportError::AlreadyExists(detail),
        "InvalidSequenceTokenException" => TransportError::InvalidSequenceToken(detail),
        "ThrottlingException" => TransportError::Throttled(detail),
        "AccessDeniedException" => TransportError::AccessDenied(detail),
        _ if status == 429 => TransportError::Throttled(detail),
        _ if status == 403 => TransportError::AccessDenied(detail),
        _ if status >= 500 => TransportError::Transient(detail),
        _ if exception.is_empty() => TransportError::Other(detail),
        _ => TransportError::Other(format!("{}: {}", exception, detail)),
    }
}

// ===== Wire Types =====

#[derive(Debug, Deserialize)]
struct Empty {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateLogGroupRequest<'a> {
    log_group_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateLogStreamRequest<'a> {
    log_group_name: &'a str,
    log_stream_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DescribeLogStreamsRequest<'a> {
    log_group_name: &'a str,
    log_stream_name_prefix: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeLogStreamsResponse {
    #[serde(default)]
    log_streams: Vec<WireLogStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLogStream {
    log_stream_name: String,
    upload_sequence_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PutLogEventsRequest<'a> {
    log_group_name: &'a str,
    log_stream_name: &'a str,
    log_events: Vec<WireLogEvent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireLogEvent<'a> {
    timestamp: i64,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutLogEventsResponse {
    next_sequence_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(default, alias = "Message")]
    message: String,
}
