use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One extracted entity: a span of text classified with a type tag and a
/// confidence score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    /// Classification tag, e.g. PERSON / ORGANIZATION / LOCATION
    #[serde(rename = "type")]
    pub entity_type: String,

    pub value: String,

    pub confidence: f64,
}

impl EntityMention {
    pub fn new(entity_type: impl Into<String>, value: impl Into<String>, confidence: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            value: value.into(),
            confidence,
        }
    }
}

/// Attribute values are either text or numeric; serialized as bare JSON
/// strings/numbers (no tagging), per the consumer contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBody {
    /// Entities accepted at/above the confidence threshold, caller order
    pub entities: Vec<EntityMention>,

    /// Entities below the threshold; the caller partitions, we don't re-check
    pub low_confidence_entities: Vec<EntityMention>,

    pub article_url: String,

    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Static service identity (service.name, service.version, host.name)
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationScope {
    pub name: String,
    pub version: String,
}

/// One structured entity-extraction event, immutable once built.
///
/// The JSON serialization of this struct is the wire payload stored in the
/// log stream; key names and nesting are a contract with downstream
/// consumers and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Nanosecond epoch time captured when the event was built
    pub timestamp_ns: i64,

    pub severity_text: String,

    pub severity_number: i32,

    /// Fixed event-type identifier, e.g. "news_feed.entity_extracted"
    pub name: String,

    pub body: EventBody,

    /// Per-event attributes: trace/span ids plus parser/model version tags
    pub attributes: HashMap<String, AttributeValue>,

    pub resource: ResourceInfo,

    pub instrumentation_scope: InstrumentationScope,
}
