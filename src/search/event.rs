use std::fmt::Display;

use serde_json::{Map, Value};

/// Event type assumed for a `data:` line that has no preceding `event:` line.
pub const DEFAULT_EVENT_TYPE: &str = "progress";

/// Named points of the server side search pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    QueryExpansionStart,
    Thinking,
    QueryExpansionDone,
    Embedding,
    Searching,
    Enriching,
    Complete,
    Error,
    /// Anything the server sends that this client doesn't know about.
    Other(String),
}

/// Labels of the progress steps, indexed by [`Stage::progress_index`].
pub const PROGRESS_STEPS: [&str; 4] = ["understanding", "embedding", "searching", "loading"];

impl Stage {
    pub fn from_wire(name: &str) -> Self {
        match name {
            "query_expansion_start" => Stage::QueryExpansionStart,
            "thinking" => Stage::Thinking,
            "query_expansion_done" => Stage::QueryExpansionDone,
            "embedding" => Stage::Embedding,
            "searching" => Stage::Searching,
            "enriching" => Stage::Enriching,
            "complete" => Stage::Complete,
            "error" => Stage::Error,
            other => Stage::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Stage::QueryExpansionStart => "query_expansion_start",
            Stage::Thinking => "thinking",
            Stage::QueryExpansionDone => "query_expansion_done",
            Stage::Embedding => "embedding",
            Stage::Searching => "searching",
            Stage::Enriching => "enriching",
            Stage::Complete => "complete",
            Stage::Error => "error",
            Stage::Other(name) => name,
        }
    }

    /// True while the server is still working out what the query means.
    pub fn is_thinking(&self) -> bool {
        matches!(self, Stage::QueryExpansionStart | Stage::Thinking)
    }

    /// Position in [`PROGRESS_STEPS`].
    ///
    /// The query expansion stages all share step 0, unknown stages too.
    /// Terminal stages are one past the last step.
    pub fn progress_index(&self) -> usize {
        match self {
            Stage::QueryExpansionStart
            | Stage::Thinking
            | Stage::QueryExpansionDone
            | Stage::Other(_) => 0,
            Stage::Embedding => 1,
            Stage::Searching => 2,
            Stage::Enriching => 3,
            Stage::Complete | Stage::Error => PROGRESS_STEPS.len(),
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded `data:` record of the search stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// Value of the last `event:` line, or [`DEFAULT_EVENT_TYPE`].
    pub event_type: String,
    pub stage: Stage,
    /// The raw JSON object, `stage` included.
    pub payload: Map<String, Value>,
}

impl StreamEvent {
    /// Build an event from a parsed `data:` object.
    ///
    /// A missing, null or empty `stage` is filled in from the event type.
    pub fn from_payload(event_type: &str, mut payload: Map<String, Value>) -> Self {
        let stage = match payload.get("stage").and_then(Value::as_str) {
            Some(stage) if !stage.is_empty() => stage.to_string(),
            _ => {
                payload.insert("stage".to_string(), Value::from(event_type));
                event_type.to_string()
            }
        };

        StreamEvent {
            event_type: event_type.to_string(),
            stage: Stage::from_wire(&stage),
            payload,
        }
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.str_field("message")
    }

    pub fn thinking_text(&self) -> Option<&str> {
        self.str_field("thinking_text")
    }

    pub fn is_delta(&self) -> bool {
        self.payload
            .get("is_delta")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn expanded_query(&self) -> Option<&str> {
        self.str_field("expanded_query")
    }

    /// Raw result records, exactly as sent.
    pub fn results(&self) -> Option<&Vec<Value>> {
        self.payload.get("results").and_then(Value::as_array)
    }

    pub fn total(&self) -> Option<u64> {
        self.payload.get("total").and_then(Value::as_u64)
    }

    pub fn error(&self) -> Option<&str> {
        self.str_field("error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_stage_roundtrips_wire_names() {
        for name in [
            "query_expansion_start",
            "thinking",
            "query_expansion_done",
            "embedding",
            "searching",
            "enriching",
            "complete",
            "error",
            "reranking",
        ] {
            assert_eq!(Stage::from_wire(name).as_str(), name);
        }
    }

    #[test]
    fn test_progress_index() {
        assert_eq!(Stage::Thinking.progress_index(), 0);
        assert_eq!(Stage::QueryExpansionStart.progress_index(), 0);
        assert_eq!(Stage::QueryExpansionDone.progress_index(), 0);
        assert_eq!(Stage::Embedding.progress_index(), 1);
        assert_eq!(Stage::Enriching.progress_index(), 3);
        assert_eq!(Stage::Other("x".to_string()).progress_index(), 0);
        assert_eq!(Stage::Complete.progress_index(), PROGRESS_STEPS.len());
    }

    #[test]
    fn test_stage_taken_from_event_type() {
        let event = StreamEvent::from_payload("embedding", object(json!({"message": "hi"})));
        assert_eq!(event.stage, Stage::Embedding);
        assert_eq!(event.payload["stage"], json!("embedding"));
        assert_eq!(event.message(), Some("hi"));
    }

    #[test]
    fn test_explicit_stage_wins() {
        let event = StreamEvent::from_payload(
            "progress",
            object(json!({"stage": "thinking", "thinking_text": "嗯", "is_delta": true})),
        );
        assert_eq!(event.stage, Stage::Thinking);
        assert_eq!(event.event_type, "progress");
        assert!(event.is_delta());
        assert_eq!(event.thinking_text(), Some("嗯"));
    }
}
