use alloc::{string::String, vec::Vec};
use serde::{Deserialize, Serialize};

/// The mutable record of one quiz attempt. Owned exclusively by the quiz
/// engine; everything else sees read-only snapshots.
///
/// The serialized field names are the wire format of the persisted slot,
/// so an existing saved session keeps loading across releases.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SessionState {
    /// Zero-based index into the question store. Stays on the last valid
    /// index once the session completes.
    #[serde(rename = "currentQuestionIndex")]
    pub position: usize,
    /// Count of correct entries in `answers`. Maintained by recomputation,
    /// never mutated independently.
    pub score: u32,
    /// One slot per question; `None` until the question is answered. The
    /// length is fixed at creation and never changes.
    pub answers: Vec<Option<String>>,
    /// Set once the position has advanced past the last question.
    #[serde(rename = "isComplete")]
    pub completed: bool,
}

impl SessionState {
    /// Initial state for a question store with `count` questions.
    pub fn fresh(count: usize) -> Self {
        Self { position: 0, score: 0, answers: alloc::vec![None; count], completed: false }
    }

    /// Number of questions that have a submitted answer.
    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::SessionState;

    #[test]
    fn fresh_state_is_empty() {
        let state = SessionState::fresh(5);
        assert_eq!(state.position, 0);
        assert_eq!(state.score, 0);
        assert_eq!(state.answers, alloc::vec![None; 5]);
        assert_eq!(state.answered(), 0);
        assert!(!state.completed);
    }

    #[test]
    fn slot_wire_format_is_stable() {
        let mut state = SessionState::fresh(2);
        state.position = 1;
        state.score = 1;
        state.answers[0] = Some("B".into());
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"currentQuestionIndex":1,"score":1,"answers":["B",null],"isComplete":false}"#);
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
