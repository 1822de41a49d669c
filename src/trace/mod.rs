use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TraceContextError {
    #[error("trace_id must be 32 lowercase hex characters, got '{0}'")]
    InvalidTraceId(String),

    #[error("span_id must be 16 lowercase hex characters, got '{0}'")]
    InvalidSpanId(String),
}

/// Identifiers tying an event to the trace/span that produced it.
///
/// Uses the W3C hex encoding: 32 lowercase hex characters for the trace id,
/// 16 for the span id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
}

impl TraceContext {
    /// Build a context from externally supplied ids, validating their shape.
    pub fn new(trace_id: String, span_id: String) -> Result<Self, TraceContextError> {
        let trace_re = Regex::new(r"^[0-9a-f]{32}$").unwrap();
        let span_re = Regex::new(r"^[0-9a-f]{16}$").unwrap();

        if !trace_re.is_match(&trace_id) {
            return Err(TraceContextError::InvalidTraceId(trace_id));
        }
        if !span_re.is_match(&span_id) {
            return Err(TraceContextError::InvalidSpanId(span_id));
        }

        Ok(Self { trace_id, span_id })
    }
}

/// Source of the trace context embedded in each built event.
///
/// The event builder calls `current()` exactly once per event.
pub trait TraceContextSource: Send + Sync {
    fn current(&self) -> TraceContext;
}

/// Generates a fresh random context per call.
///
/// Stands in for a real tracer when no span is active; ids are well-formed
/// by construction.
#[derive(Debug, Default)]
pub struct RandomTraceSource;

impl TraceContextSource for RandomTraceSource {
    fn current(&self) -> TraceContext {
        let trace_id = Uuid::new_v4().simple().to_string();
        let span_id = Uuid::new_v4().simple().to_string()[..16].to_string();
        TraceContext { trace_id, span_id }
    }
}
