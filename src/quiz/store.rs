use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::error::StoreError;
use crate::quiz::QuestionAnswer;

pub const QUESTION_FIELD: &str = "question";
pub const ANSWER_FIELD: &str = "answer";

/// Per-key string field mapping (a Redis hash).
///
/// Every method is a single round trip, so several fields written or deleted
/// in one call land together.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// All fields stored under `key`; empty when the key doesn't exist.
    async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Upserts the given fields, leaving other fields untouched.
    async fn set_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), StoreError>;

    /// Removes the named fields. Missing fields are ignored.
    async fn delete_fields(&self, key: &str, fields: &[&str]) -> Result<(), StoreError>;
}

/// The current question of one user, as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl SessionState {
    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        Self {
            question: fields.remove(QUESTION_FIELD),
            answer: fields.remove(ANSWER_FIELD).filter(|answer| !answer.is_empty()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.answer.is_some()
    }
}

pub fn session_fields(pair: &QuestionAnswer) -> [(&str, &str); 2] {
    [
        (QUESTION_FIELD, pair.question.as_str()),
        (ANSWER_FIELD, pair.answer.as_str()),
    ]
}

pub struct RedisSessionStore {
    connection: MultiplexedConnection,
}

impl RedisSessionStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut connection = self.connection.clone();
        let fields: HashMap<String, String> = connection.hgetall(key).await?;
        Ok(fields)
    }

    async fn set_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        connection.hset_multiple::<_, _, _, ()>(key, fields).await?;
        Ok(())
    }

    async fn delete_fields(&self, key: &str, fields: &[&str]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        connection.hdel::<_, _, ()>(key, fields).await?;
        Ok(())
    }
}

/// Process-local store for tests and Redis-less runs.
///
/// Counts write calls so callers can check whether an exchange touched the
/// store.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    hashes: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
    writes: Arc<Mutex<usize>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set_fields`/`delete_fields` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|writes| *writes).unwrap_or_default()
    }

    fn record_write(&self) -> Result<(), StoreError> {
        let mut writes = self
            .writes
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        *writes += 1;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let guard = self
            .hashes
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(guard.get(key).cloned().unwrap_or_default())
    }

    async fn set_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), StoreError> {
        self.record_write()?;
        let mut guard = self
            .hashes
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        let hash = guard.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn delete_fields(&self, key: &str, fields: &[&str]) -> Result<(), StoreError> {
        self.record_write()?;
        let mut guard = self
            .hashes
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        if let Some(hash) = guard.get_mut(key) {
            for field in fields {
                hash.remove(*field);
            }
            // Redis drops a hash once its last field is gone
            if hash.is_empty() {
                guard.remove(key);
            }
        }
        Ok(())
    }
}
