use alloc::{string::String, vec::Vec};
use core::num::NonZeroU32;
use serde::{Deserialize, Serialize};

/// A single multiple-choice question as supplied by the question file.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Question {
    /// Display label for the question. Not an index; the display order is
    /// the file's sequence order.
    pub id: NonZeroU32,
    /// Question to be displayed on the card.
    pub question: String,
    /// The one correct answer, compared by exact string equality.
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    /// Distractors to be mixed in with the correct answer.
    #[serde(rename = "incorrectAnswers")]
    pub incorrect_answers: Vec<String>,
    /// Optional illustrative media reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Question;

    #[test]
    fn question_deserializes_from_quiz_file_shape() {
        let json = r#"{
            "id": 3,
            "question": "What does a red buoy mark?",
            "correctAnswer": "The starboard side of the channel",
            "incorrectAnswers": ["The port side of the channel", "An anchorage"],
            "image": "/images/buoy.png"
        }"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.id.get(), 3);
        assert_eq!(question.correct_answer, "The starboard side of the channel");
        assert_eq!(question.incorrect_answers.len(), 2);
        assert_eq!(question.image.as_deref(), Some("/images/buoy.png"));
    }

    #[test]
    fn image_is_optional() {
        let json = r#"{"id":1,"question":"?","correctAnswer":"A","incorrectAnswers":[]}"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert!(question.image.is_none());
    }
}
