use nerlog::config::Config;
use nerlog::event::{AttributeValue, EntityMention, Event, EventBuilder};
use nerlog::trace::RandomTraceSource;
use regex::Regex;
use std::sync::Arc;

fn make_builder() -> EventBuilder {
    EventBuilder::new(&Config::default(), Arc::new(RandomTraceSource))
}

fn sample_event() -> Event {
    make_builder()
        .build(
            vec![
                EntityMention::new("PERSON", "Ada Lovelace", 0.93),
                EntityMention::new("ORGANIZATION", "Acme Corp", 0.88),
                EntityMention::new("LOCATION", "London", 0.91),
            ],
            vec![
                EntityMention::new("PERSON", "A. Nonymous", 0.42),
                EntityMention::new("LOCATION", "Springfield", 0.35),
            ],
            "https://example.com/articles/42",
        )
        .unwrap()
}

#[test]
fn test_entity_lists_preserve_order_and_count() {
    let event = sample_event();

    assert_eq!(event.body.entities.len(), 3);
    assert_eq!(event.body.entities[0].value, "Ada Lovelace");
    assert_eq!(event.body.entities[1].value, "Acme Corp");
    assert_eq!(event.body.entities[2].value, "London");

    assert_eq!(event.body.low_confidence_entities.len(), 2);
    assert_eq!(event.body.low_confidence_entities[0].value, "A. Nonymous");
    assert_eq!(event.body.low_confidence_entities[1].value, "Springfield");
}

#[test]
fn test_trace_and_span_ids_are_lowercase_hex() {
    let event = sample_event();

    let trace_id = match &event.attributes["trace_id"] {
        AttributeValue::Text(s) => s,
        other => panic!("trace_id should be text, got {:?}", other),
    };
    let span_id = match &event.attributes["span_id"] {
        AttributeValue::Text(s) => s,
        other => panic!("span_id should be text, got {:?}", other),
    };

    assert!(Regex::new(r"^[0-9a-f]{32}$").unwrap().is_match(trace_id));
    assert!(Regex::new(r"^[0-9a-f]{16}$").unwrap().is_match(span_id));
}

#[test]
fn test_json_round_trip_yields_equal_event() {
    let event = sample_event();

    let json = serde_json::to_string(&event).unwrap();
    let decoded: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn test_wire_key_names_match_consumer_contract() {
    let event = sample_event();
    let json = serde_json::to_value(&event).unwrap();

    // Top-level shape
    assert!(json["timestamp_ns"].is_i64());
    assert_eq!(json["severity_text"], "INFO");
    assert_eq!(json["severity_number"], 9);
    assert_eq!(json["name"], "news_feed.entity_extracted");

    // Entity mentions use "type", not the Rust field name
    assert_eq!(json["body"]["entities"][0]["type"], "PERSON");
    assert_eq!(json["body"]["entities"][0]["value"], "Ada Lovelace");
    assert_eq!(json["body"]["article_url"], "https://example.com/articles/42");
    assert_eq!(json["body"]["confidence_threshold"], 0.70);

    // Attributes carry strings and bare numbers side by side
    assert_eq!(json["attributes"]["news_feed.parser.version"], "v1.2.0");
    assert_eq!(json["attributes"]["ner_model.name"], "advanced_ner");
    assert_eq!(json["attributes"]["ner_model.version"], "5.0.0");
    assert_eq!(json["attributes"]["ner_model.confidence_threshold"], 0.70);

    // Nested resource + scope blocks
    assert_eq!(json["resource"]["attributes"]["service.name"], "news_feed_parser");
    assert_eq!(json["resource"]["attributes"]["service.version"], "0.5.0");
    assert!(json["resource"]["attributes"]["host.name"].is_string());
    assert_eq!(json["instrumentation_scope"]["name"], "com.example.news_parser.ner");
    assert_eq!(json["instrumentation_scope"]["version"], "1.0.0");
}

#[test]
fn test_attribute_values_serialize_untagged() {
    let text = serde_json::to_value(AttributeValue::from("hello")).unwrap();
    assert_eq!(text, serde_json::json!("hello"));

    let number = serde_json::to_value(AttributeValue::from(0.5)).unwrap();
    assert_eq!(number, serde_json::json!(0.5));
}

#[test]
fn test_config_overrides_flow_into_events() {
    let mut config = Config::default();
    config.service.name = "custom_service".to_string();
    config.service.host = Some("worker-7".to_string());
    config.extraction.confidence_threshold = 0.85;
    config.extraction.model_version = "6.1.0".to_string();

    let builder = EventBuilder::new(&config, Arc::new(RandomTraceSource));
    let event = builder.build(vec![], vec![], "https://example.com").unwrap();

    assert_eq!(event.resource.attributes["service.name"], "custom_service");
    assert_eq!(event.resource.attributes["host.name"], "worker-7");
    assert_eq!(event.body.confidence_threshold, 0.85);
    assert_eq!(
        event.attributes["ner_model.version"],
        AttributeValue::from("6.1.0")
    );
    assert_eq!(
        event.attributes["ner_model.confidence_threshold"],
        AttributeValue::from(0.85)
    );
}
