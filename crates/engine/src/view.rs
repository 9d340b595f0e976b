use serde::Serialize;

/// Render-ready projection of the engine state. This is the only shape the
/// HTTP layer ever sees; the session state itself stays inside the engine.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Total number of questions in the store.
    pub total: usize,
    pub score: u32,
    /// How many questions have a submitted answer.
    pub answered: usize,
    pub completed: bool,
    /// The active question; absent once the session completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Present only while a reveal cycle is showing its result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reveal: Option<RevealView>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// Display label from the question record.
    pub id: u32,
    /// One-based position in the display sequence.
    pub number: usize,
    pub question: String,
    /// All choices in this session's shuffled order for the question.
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// The previously submitted answer for this question, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealView {
    /// Whether the submitted answer matched the correct one.
    pub correct: bool,
    pub correct_answer: String,
    /// True during the initial overlay phase of the reveal.
    pub overlay: bool,
}
