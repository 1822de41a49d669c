use crate::config::Config;
use crate::event::types::{
    AttributeValue, EntityMention, Event, EventBody, InstrumentationScope, ResourceInfo,
};
use crate::trace::TraceContextSource;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

const EVENT_NAME: &str = "news_feed.entity_extracted";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("malformed entity at index {index}: {reason}")]
    MalformedEntity { index: usize, reason: String },

    #[error("severity text must not be empty")]
    EmptySeverity,
}

/// Builds immutable [`Event`] records from extracted entities.
///
/// Service identity, instrumentation scope, and model/parser tags come from
/// config at construction time; the trace context source is invoked exactly
/// once per build. Builders are pure apart from timestamp capture, so any
/// number of workers may share one behind an `Arc` without locking.
pub struct EventBuilder {
    parser_version: String,
    model_name: String,
    model_version: String,
    confidence_threshold: f64,
    resource_attributes: HashMap<String, String>,
    scope: InstrumentationScope,
    trace_source: Arc<dyn TraceContextSource>,
}

impl EventBuilder {
    pub fn new(config: &Config, trace_source: Arc<dyn TraceContextSource>) -> Self {
        let host = config
            .service
            .host
            .clone()
            .unwrap_or_else(detect_hostname);

        let mut resource_attributes = HashMap::new();
        resource_attributes.insert("service.name".to_string(), config.service.name.clone());
        resource_attributes.insert("service.version".to_string(), config.service.version.clone());
        resource_attributes.insert("host.name".to_string(), host);

        Self {
            parser_version: config.extraction.parser_version.clone(),
            model_name: config.extraction.model_name.clone(),
            model_version: config.extraction.model_version.clone(),
            confidence_threshold: config.extraction.confidence_threshold,
            resource_attributes,
            scope: InstrumentationScope {
                name: config.service.scope_name.clone(),
                version: config.service.scope_version.clone(),
            },
            trace_source,
        }
    }

    /// Build an event with the default INFO/9 severity.
    pub fn build(
        &self,
        entities: Vec<EntityMention>,
        low_confidence_entities: Vec<EntityMention>,
        article_url: &str,
    ) -> Result<Event, BuildError> {
        self.build_with_severity(entities, low_confidence_entities, article_url, "INFO", 9)
    }

    /// Build an event with caller-supplied severity.
    ///
    /// The entity lists are taken as the caller partitioned them; order and
    /// count are preserved and entries are not re-checked against the
    /// confidence threshold. Each mention must still be well-formed:
    /// non-empty type and value, finite confidence in `[0, 1]`.
    pub fn build_with_severity(
        &self,
        entities: Vec<EntityMention>,
        low_confidence_entities: Vec<EntityMention>,
        article_url: &str,
        severity_text: &str,
        severity_number: i32,
    ) -> Result<Event, BuildError> {
        if severity_text.is_empty() {
            return Err(BuildError::EmptySeverity);
        }
        validate_mentions(&entities, "entities")?;
        validate_mentions(&low_confidence_entities, "low_confidence_entities")?;

        let trace_context = self.trace_source.current();

        let mut attributes = HashMap::new();
        attributes.insert(
            "news_feed.parser.version".to_string(),
            AttributeValue::from(self.parser_version.clone()),
        );
        attributes.insert(
            "ner_model.name".to_string(),
            AttributeValue::from(self.model_name.clone()),
        );
        attributes.insert(
            "ner_model.version".to_string(),
            AttributeValue::from(self.model_version.clone()),
        );
        attributes.insert(
            "ner_model.confidence_threshold".to_string(),
            AttributeValue::from(self.confidence_threshold),
        );
        attributes.insert(
            "trace_id".to_string(),
            AttributeValue::from(trace_context.trace_id),
        );
        attributes.insert(
            "span_id".to_string(),
            AttributeValue::from(trace_context.span_id),
        );

        Ok(Event {
            timestamp_ns: now_nanos(),
            severity_text: severity_text.to_string(),
            severity_number,
            name: EVENT_NAME.to_string(),
            body: EventBody {
                entities,
                low_confidence_entities,
                article_url: article_url.to_string(),
                confidence_threshold: self.confidence_threshold,
            },
            attributes,
            resource: ResourceInfo {
                attributes: self.resource_attributes.clone(),
            },
            instrumentation_scope: self.scope.clone(),
        })
    }
}

fn now_nanos() -> i64 {
    // timestamp_nanos_opt is None past 2262; saturate rather than panic
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

fn detect_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn validate_mentions(mentions: &[EntityMention], list_name: &str) -> Result<(), BuildError> {
    for (index, mention) in mentions.iter().enumerate() {
        if mention.entity_type.is_empty() {
            return Err(BuildError::MalformedEntity {
                index,
                reason: format!("empty type in {}", list_name),
            });
        }
        if mention.value.is_empty() {
            return Err(BuildError::MalformedEntity {
                index,
                reason: format!("empty value in {}", list_name),
            });
        }
        if !mention.confidence.is_finite() || !(0.0..=1.0).contains(&mention.confidence) {
            return Err(BuildError::MalformedEntity {
                index,
                reason: format!(
                    "confidence {} out of range in {}",
                    mention.confidence, list_name
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::RandomTraceSource;

    fn make_builder() -> EventBuilder {
        EventBuilder::new(&Config::default(), Arc::new(RandomTraceSource))
    }

    #[test]
    fn test_build_defaults_to_info() {
        let builder = make_builder();
        let event = builder
            .build(
                vec![EntityMention::new("PERSON", "Ada Lovelace", 0.93)],
                vec![],
                "https://example.com/article",
            )
            .unwrap();

        assert_eq!(event.severity_text, "INFO");
        assert_eq!(event.severity_number, 9);
        assert_eq!(event.name, "news_feed.entity_extracted");
        assert_eq!(event.body.confidence_threshold, 0.70);
        assert!(event.timestamp_ns > 0);
    }

    #[test]
    fn test_build_with_severity_override() {
        let builder = make_builder();
        let event = builder
            .build_with_severity(vec![], vec![], "https://example.com", "ERROR", 17)
            .unwrap();

        assert_eq!(event.severity_text, "ERROR");
        assert_eq!(event.severity_number, 17);
    }

    #[test]
    fn test_rejects_empty_severity() {
        let builder = make_builder();
        let err = builder.build_with_severity(vec![], vec![], "https://example.com", "", 9);
        assert!(matches!(err, Err(BuildError::EmptySeverity)));
    }

    #[test]
    fn test_rejects_empty_entity_type() {
        let builder = make_builder();
        let err = builder.build(
            vec![EntityMention::new("", "Acme Corp", 0.8)],
            vec![],
            "https://example.com",
        );
        assert!(matches!(
            err,
            Err(BuildError::MalformedEntity { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_confidence_in_low_list() {
        let builder = make_builder();
        let err = builder.build(
            vec![EntityMention::new("PERSON", "Ada", 0.9)],
            vec![
                EntityMention::new("LOCATION", "Paris", 0.3),
                EntityMention::new("LOCATION", "London", 1.5),
            ],
            "https://example.com",
        );
        match err {
            Err(BuildError::MalformedEntity { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("low_confidence_entities"));
            }
            other => panic!("expected MalformedEntity, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_nan_confidence() {
        let builder = make_builder();
        let err = builder.build(
            vec![EntityMention::new("PERSON", "Ada", f64::NAN)],
            vec![],
            "https://example.com",
        );
        assert!(matches!(err, Err(BuildError::MalformedEntity { .. })));
    }

    #[test]
    fn test_does_not_repartition_by_threshold() {
        // The caller's partition is trusted even when it contradicts the
        // threshold; 0.1 stays in the accepted list.
        let builder = make_builder();
        let event = builder
            .build(
                vec![EntityMention::new("ORGANIZATION", "Acme", 0.1)],
                vec![EntityMention::new("PERSON", "Ada", 0.99)],
                "https://example.com",
            )
            .unwrap();

        assert_eq!(event.body.entities.len(), 1);
        assert_eq!(event.body.entities[0].confidence, 0.1);
        assert_eq!(event.body.low_confidence_entities[0].confidence, 0.99);
    }
}
