//! Quiz session state machine shared by every front end.
//!
//! A user is either idle (nothing stored) or awaiting an answer (question and
//! answer stored under the user's key). Each inbound event produces exactly
//! one reply.

use crate::error::{CorpusError, QuizError};
use crate::quiz::normalize::answers_match;
use crate::quiz::store::{session_fields, SessionState, SessionStore, ANSWER_FIELD, QUESTION_FIELD};
use crate::quiz::{CorpusLoader, QuizEvent};

pub const DEFAULT_KEY_PREFIX: &str = "user:";

pub const CORRECT_REPLY: &str =
    "Правильно! Поздравляю! Для следующего вопроса нажми «Новый вопрос».";
pub const INCORRECT_REPLY: &str = "Неправильно… Попробуешь ещё раз?";
pub const NO_QUESTION_REPLY: &str = "Сначала запроси вопрос кнопкой «Новый вопрос».";
pub const NOTHING_TO_GIVE_UP_REPLY: &str = "Нет активного вопроса. Нажми «Новый вопрос».";
pub const NO_QUESTIONS_REPLY: &str = "Вопросы закончились. Попробуй ещё раз позже.";
pub const SCORE_UNAVAILABLE_REPLY: &str = "Подсчёт очков пока не ведётся.";

pub fn reveal_reply(answer: &str) -> String {
    format!("Правильный ответ: {answer}")
}

pub struct QuizSession<S> {
    store: S,
    corpus: CorpusLoader,
    key_prefix: String,
}

impl<S: SessionStore> QuizSession<S> {
    pub fn new(store: S, corpus: CorpusLoader) -> Self {
        Self {
            store,
            corpus,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Namespaces the store keys; defaults to `"user:"`.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session_key(&self, user_id: &str) -> String {
        format!("{}{}", self.key_prefix, user_id)
    }

    pub async fn handle_text(&self, user_id: &str, text: &str) -> Result<String, QuizError> {
        self.handle_event(user_id, QuizEvent::from_text(text)).await
    }

    pub async fn handle_event(&self, user_id: &str, event: QuizEvent) -> Result<String, QuizError> {
        let key = self.session_key(user_id);
        log::debug!("{key}: {event:?}");

        match event {
            QuizEvent::NewQuestion => self.new_question(&key).await,
            QuizEvent::GiveUp => self.give_up(&key).await,
            QuizEvent::Attempt(text) => self.attempt(&key, &text).await,
            QuizEvent::MyScore => Ok(SCORE_UNAVAILABLE_REPLY.to_string()),
        }
    }

    async fn load_state(&self, key: &str) -> Result<SessionState, QuizError> {
        Ok(SessionState::from_fields(self.store.get_all(key).await?))
    }

    async fn clear(&self, key: &str) -> Result<(), QuizError> {
        self.store
            .delete_fields(key, &[QUESTION_FIELD, ANSWER_FIELD])
            .await?;
        Ok(())
    }

    /// Draws a question and stores it. `None` means the corpus is empty and
    /// nothing was written.
    async fn pose_question(&self, key: &str) -> Result<Option<String>, QuizError> {
        let pair = match self.corpus.draw() {
            Ok(pair) => pair,
            Err(CorpusError::Exhausted) => {
                log::warn!("No questions found in {}", self.corpus.dir().display());
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        self.store.set_fields(key, &session_fields(&pair)).await?;
        Ok(Some(pair.question))
    }

    async fn new_question(&self, key: &str) -> Result<String, QuizError> {
        Ok(self
            .pose_question(key)
            .await?
            .unwrap_or_else(|| NO_QUESTIONS_REPLY.to_string()))
    }

    async fn give_up(&self, key: &str) -> Result<String, QuizError> {
        let state = self.load_state(key).await?;
        let Some(answer) = state.answer else {
            return Ok(NOTHING_TO_GIVE_UP_REPLY.to_string());
        };

        self.clear(key).await?;
        let next = self
            .pose_question(key)
            .await?
            .unwrap_or_else(|| NO_QUESTIONS_REPLY.to_string());
        Ok(format!("{}\n\n{}", reveal_reply(&answer), next))
    }

    async fn attempt(&self, key: &str, text: &str) -> Result<String, QuizError> {
        let state = self.load_state(key).await?;
        let Some(answer) = state.answer else {
            return Ok(NO_QUESTION_REPLY.to_string());
        };

        if answers_match(&answer, text) {
            self.clear(key).await?;
            Ok(CORRECT_REPLY.to_string())
        } else {
            Ok(INCORRECT_REPLY.to_string())
        }
    }
}
