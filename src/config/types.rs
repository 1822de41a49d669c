use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

/// Static service identity stamped into every event's resource attributes
/// and instrumentation scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    #[serde(default = "default_service_version")]
    pub version: String,

    /// Overrides the detected hostname for host.name when set
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_scope_name")]
    pub scope_name: String,

    #[serde(default = "default_scope_version")]
    pub scope_version: String,
}

/// Parser/model tags attached to each event's attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_parser_version")]
    pub parser_version: String,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default = "default_model_version")]
    pub model_version: String,

    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_group")]
    pub log_group: String,

    #[serde(default = "default_log_stream")]
    pub log_stream: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// CloudWatch-compatible HTTP endpoint. When unset the demo harness
    /// falls back to the in-memory transport.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-attempt deadline for transport calls
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Total put attempts per send (stale-token retries included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
            host: None,
            scope_name: default_scope_name(),
            scope_version: default_scope_version(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            parser_version: default_parser_version(),
            model_name: default_model_name(),
            model_version: default_model_version(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            log_group: default_log_group(),
            log_stream: default_log_stream(),
            region: default_region(),
            endpoint: None,
            request_timeout: default_request_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_service_name() -> String {
    "news_feed_parser".to_string()
}

fn default_service_version() -> String {
    "0.5.0".to_string()
}

fn default_scope_name() -> String {
    "com.example.news_parser.ner".to_string()
}

fn default_scope_version() -> String {
    "1.0.0".to_string()
}

fn default_parser_version() -> String {
    "v1.2.0".to_string()
}

fn default_model_name() -> String {
    "advanced_ner".to_string()
}

fn default_model_version() -> String {
    "5.0.0".to_string()
}

fn default_confidence_threshold() -> f64 {
    0.70
}

fn default_log_group() -> String {
    "/aws/news_feed_parser".to_string()
}

fn default_log_stream() -> String {
    "entity_extraction_stream".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_attempts() -> u32 {
    3
}
