pub mod corpus;
pub mod normalize;
pub mod protocol;
pub mod store;

pub use corpus::CorpusLoader;
pub use protocol::QuizSession;
pub use store::{InMemorySessionStore, RedisSessionStore, SessionState, SessionStore};

/// One question from the corpus together with its reference answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

impl QuestionAnswer {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Keyboard buttons shown under every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    NewQuestion,
    GiveUp,
    MyScore,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::NewQuestion, Button::GiveUp, Button::MyScore];

    pub fn label(self) -> &'static str {
        match self {
            Button::NewQuestion => "Новый вопрос",
            Button::GiveUp => "Сдаться",
            Button::MyScore => "Мой счёт",
        }
    }

    /// Exact match against a button label, ignoring surrounding whitespace.
    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|button| button.label() == text)
    }
}

/// Inbound message as seen by the quiz protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    NewQuestion,
    GiveUp,
    MyScore,
    Attempt(String),
}

impl QuizEvent {
    pub fn from_text(text: &str) -> Self {
        match Button::from_label(text) {
            Some(Button::NewQuestion) => QuizEvent::NewQuestion,
            Some(Button::GiveUp) => QuizEvent::GiveUp,
            Some(Button::MyScore) => QuizEvent::MyScore,
            None => QuizEvent::Attempt(text.trim().to_string()),
        }
    }
}

/// Button rows used by both front ends: new question and give up on top,
/// score below.
pub fn keyboard_rows() -> Vec<Vec<Button>> {
    vec![
        vec![Button::NewQuestion, Button::GiveUp],
        vec![Button::MyScore],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_are_recognized_after_trimming() {
        assert_eq!(QuizEvent::from_text("  Новый вопрос\n"), QuizEvent::NewQuestion);
        assert_eq!(QuizEvent::from_text("Сдаться"), QuizEvent::GiveUp);
        assert_eq!(QuizEvent::from_text("Мой счёт "), QuizEvent::MyScore);
    }

    #[test]
    fn other_text_is_an_attempt() {
        assert_eq!(
            QuizEvent::from_text("  новый вопрос "),
            QuizEvent::Attempt("новый вопрос".to_string())
        );
        assert_eq!(
            QuizEvent::from_text(" Париж "),
            QuizEvent::Attempt("Париж".to_string())
        );
    }

    #[test]
    fn keyboard_contains_every_button_once() {
        let rows = keyboard_rows();
        let flat: Vec<Button> = rows.into_iter().flatten().collect();
        assert_eq!(flat.len(), Button::ALL.len());
        for button in Button::ALL {
            assert!(flat.contains(&button));
        }
    }
}
