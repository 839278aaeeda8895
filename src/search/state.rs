use crate::memes::{normalize_values, Meme};

use super::event::{Stage, StreamEvent};

/// Progress of one search, as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub stage: Stage,
    pub message: String,
    /// Every thinking delta received so far, concatenated.
    pub thinking_text: String,
    pub expanded_query: Option<String>,
    pub results: Option<Vec<Meme>>,
    pub error: Option<String>,
}

/// What applying one event did to the state.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Nothing changed.
    Ignored,
    /// A thinking delta was appended.
    Thought,
    /// Stage, message or expanded query moved.
    Progressed,
    Completed(Vec<Meme>),
    Failed(String),
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            stage: Stage::QueryExpansionStart,
            message: String::new(),
            thinking_text: String::new(),
            expanded_query: None,
            results: None,
            error: None,
        }
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.results.is_some() || self.error.is_some()
    }

    pub fn apply(&mut self, event: &StreamEvent) -> Transition {
        if self.is_finished() {
            return Transition::Ignored;
        }

        match &event.stage {
            Stage::Thinking => match event.thinking_text() {
                Some(delta) if event.is_delta() && !delta.is_empty() => {
                    self.stage = Stage::Thinking;
                    self.thinking_text.push_str(delta);
                    Transition::Thought
                }
                _ => Transition::Ignored,
            },
            Stage::Complete => {
                let results = event
                    .results()
                    .map(|values| normalize_values(values))
                    .unwrap_or_default();
                log::debug!(
                    "search complete with {} results ({} total)",
                    results.len(),
                    event.total().unwrap_or(results.len() as u64)
                );

                self.stage = Stage::Complete;
                self.results = Some(results.clone());
                Transition::Completed(results)
            }
            Stage::Error => {
                let error = event
                    .error()
                    .filter(|e| !e.is_empty())
                    .or_else(|| event.message().filter(|m| !m.is_empty()))
                    .unwrap_or("search failed")
                    .to_string();

                self.stage = Stage::Error;
                self.error = Some(error.clone());
                Transition::Failed(error)
            }
            stage => {
                self.stage = stage.clone();
                if let Some(message) = event.message().filter(|m| !m.is_empty()) {
                    self.message = message.to_string();
                }
                if let Some(expanded) = event.expanded_query().filter(|q| !q.is_empty()) {
                    self.expanded_query = Some(expanded.to_string());
                }
                Transition::Progressed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn event(value: Value) -> StreamEvent {
        match value {
            Value::Object(map) => StreamEvent::from_payload("progress", map),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_initial_state() {
        let state = SearchState::new();
        assert_eq!(state.stage, Stage::QueryExpansionStart);
        assert!(state.message.is_empty());
        assert!(state.thinking_text.is_empty());
        assert!(!state.is_finished());
    }

    #[test]
    fn test_deltas_accumulate() {
        let mut state = SearchState::new();
        state.apply(&event(json!({"stage": "thinking", "thinking_text": "A", "is_delta": true})));
        state.apply(&event(json!({"stage": "thinking", "thinking_text": "B", "is_delta": true})));
        assert_eq!(state.thinking_text, "AB");
    }

    #[test]
    fn test_non_delta_thinking_ignored() {
        let mut state = SearchState::new();
        let before = state.clone();

        let full = event(json!({"stage": "thinking", "thinking_text": "whole", "is_delta": false}));
        let empty = event(json!({"stage": "thinking", "thinking_text": "", "is_delta": true}));
        let missing = event(json!({"stage": "thinking", "is_delta": true}));

        assert_eq!(state.apply(&full), Transition::Ignored);
        assert_eq!(state.apply(&empty), Transition::Ignored);
        assert_eq!(state.apply(&missing), Transition::Ignored);
        assert_eq!(state, before);
    }

    #[test]
    fn test_progress_keeps_previous_values_when_empty() {
        let mut state = SearchState::new();
        state.apply(&event(json!({
            "stage": "query_expansion_done",
            "message": "理解完成",
            "expanded_query": "开心的狗",
        })));
        state.apply(&event(json!({"stage": "embedding", "message": "", "expanded_query": ""})));

        assert_eq!(state.stage, Stage::Embedding);
        assert_eq!(state.message, "理解完成");
        assert_eq!(state.expanded_query.as_deref(), Some("开心的狗"));
    }

    #[test]
    fn test_complete_without_results_is_success() {
        let mut state = SearchState::new();
        let transition = state.apply(&event(json!({"stage": "complete", "total": 0})));
        assert_eq!(transition, Transition::Completed(vec![]));
        assert_eq!(state.results, Some(vec![]));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_error_message() {
        let mut state = SearchState::new();
        let transition = state.apply(&event(json!({"stage": "error", "error": "qdrant down"})));
        assert_eq!(transition, Transition::Failed("qdrant down".to_string()));

        let mut state = SearchState::new();
        let transition = state.apply(&event(json!({"stage": "error"})));
        assert_eq!(transition, Transition::Failed("search failed".to_string()));
    }

    #[test]
    fn test_no_resurrection_after_terminal() {
        let mut state = SearchState::new();
        state.apply(&event(json!({"stage": "complete", "results": []})));
        let finished = state.clone();

        assert_eq!(
            state.apply(&event(json!({"stage": "searching", "message": "again"}))),
            Transition::Ignored
        );
        assert_eq!(
            state.apply(&event(json!({"stage": "error", "error": "late"}))),
            Transition::Ignored
        );
        assert_eq!(state, finished);
    }
}
