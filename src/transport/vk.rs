//! VK community bot over the Bots Long Poll API.

use std::sync::Arc;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::VkError;
use crate::quiz::{keyboard_rows, Button, QuizSession, SessionStore};

pub const KEY_PREFIX: &str = "user:";

const API_URL: &str = "https://api.vk.com/method";
const API_VERSION: &str = "5.199";
const LONG_POLL_WAIT_SECS: &str = "25";

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    response: Option<T>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_code: i64,
    error_msg: String,
}

/// VK sends `ts` as a string in some responses and as a number in others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Text(String),
    Number(u64),
}

impl Timestamp {
    fn into_string(self) -> String {
        match self {
            Timestamp::Text(ts) => ts,
            Timestamp::Number(ts) => ts.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LongPollServer {
    pub key: String,
    pub server: String,
    #[serde(deserialize_with = "timestamp_string")]
    pub ts: String,
}

fn timestamp_string<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Timestamp::deserialize(deserializer).map(Timestamp::into_string)
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    ts: Option<Timestamp>,
    #[serde(default)]
    updates: Vec<PollUpdate>,
    failed: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PollUpdate {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MessageNew {
    message: IncomingMessage,
}

/// A text message sent to the community by a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    pub from_id: i64,
    #[serde(default)]
    pub text: String,
}

/// Outcome of one long poll request.
#[derive(Debug, PartialEq, Eq)]
enum PollOutcome {
    Messages { ts: String, messages: Vec<IncomingMessage> },
    /// History got out of date; continue from the given `ts`.
    NewTs(String),
    /// Key expired or history lost; ask for a new server.
    Reconnect,
}

fn parse_poll(body: serde_json::Value) -> Result<PollOutcome, VkError> {
    let response: PollResponse = serde_json::from_value(body.clone())
        .map_err(|_| VkError::UnexpectedResponse(body.to_string()))?;

    match (response.failed, response.ts) {
        (Some(1), Some(ts)) => Ok(PollOutcome::NewTs(ts.into_string())),
        (Some(2 | 3), _) => Ok(PollOutcome::Reconnect),
        (None, Some(ts)) => {
            let messages = response
                .updates
                .into_iter()
                .filter(|update| update.kind == "message_new")
                .filter_map(|update| serde_json::from_value::<MessageNew>(update.object).ok())
                .map(|event| event.message)
                // negative ids belong to communities
                .filter(|message| message.from_id > 0)
                .collect();
            Ok(PollOutcome::Messages {
                ts: ts.into_string(),
                messages,
            })
        }
        _ => Err(VkError::UnexpectedResponse(body.to_string())),
    }
}

fn unwrap_envelope<T>(envelope: ApiEnvelope<T>) -> Result<T, VkError> {
    if let Some(error) = envelope.error {
        return Err(VkError::Api {
            code: error.error_code,
            message: error.error_msg,
        });
    }
    envelope
        .response
        .ok_or_else(|| VkError::UnexpectedResponse("response without payload".to_string()))
}

fn button_color(button: Button) -> &'static str {
    match button {
        Button::NewQuestion => "primary",
        Button::GiveUp => "negative",
        Button::MyScore => "secondary",
    }
}

/// Keyboard JSON attached to every outgoing message.
pub fn keyboard_json() -> String {
    let buttons: Vec<Vec<serde_json::Value>> = keyboard_rows()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|button| {
                    json!({
                        "action": { "type": "text", "label": button.label() },
                        "color": button_color(button),
                    })
                })
                .collect()
        })
        .collect();
    json!({ "one_time": false, "buttons": buttons }).to_string()
}

pub struct VkClient {
    http: reqwest::Client,
    token: String,
    group_id: u64,
}

impl VkClient {
    pub fn new(token: String, group_id: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            group_id,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, VkError> {
        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", self.token.clone()));
        form.push(("v", API_VERSION.to_string()));

        let envelope: ApiEnvelope<T> = self
            .http
            .post(format!("{API_URL}/{method}"))
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        unwrap_envelope(envelope)
    }

    pub async fn long_poll_server(&self) -> Result<LongPollServer, VkError> {
        self.call(
            "groups.getLongPollServer",
            &[("group_id", self.group_id.to_string())],
        )
        .await
    }

    async fn poll(&self, server: &LongPollServer, ts: &str) -> Result<PollOutcome, VkError> {
        let body: serde_json::Value = self
            .http
            .get(&server.server)
            .query(&[
                ("act", "a_check"),
                ("key", server.key.as_str()),
                ("ts", ts),
                ("wait", LONG_POLL_WAIT_SECS),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_poll(body)
    }

    pub async fn send_message(&self, user_id: i64, text: &str) -> Result<(), VkError> {
        let random_id = rand::thread_rng().gen_range(1..1_000_000_000_i64);
        let _message_id: serde_json::Value = self
            .call(
                "messages.send",
                &[
                    ("user_id", user_id.to_string()),
                    ("message", text.to_string()),
                    ("random_id", random_id.to_string()),
                    ("keyboard", keyboard_json()),
                ],
            )
            .await?;
        Ok(())
    }
}

/// Listens for new messages and answers each one through the quiz session.
///
/// Failed quiz events are logged and skipped; failures of the long poll itself
/// end the loop.
pub async fn run<S: SessionStore>(client: VkClient, quiz: Arc<QuizSession<S>>) -> Result<(), VkError> {
    let mut server = client.long_poll_server().await?;
    let mut ts = server.ts.clone();
    log::info!("Connected to VK long poll server");

    loop {
        match client.poll(&server, &ts).await? {
            PollOutcome::Messages { ts: next, messages } => {
                ts = next;
                for message in messages {
                    handle_message(&client, &quiz, message).await;
                }
            }
            PollOutcome::NewTs(next) => {
                log::warn!("Long poll history is outdated, continuing from ts {next}");
                ts = next;
            }
            PollOutcome::Reconnect => {
                log::warn!("Long poll key expired, requesting a new server");
                server = client.long_poll_server().await?;
                ts = server.ts.clone();
            }
        }
    }
}

async fn handle_message<S: SessionStore>(
    client: &VkClient,
    quiz: &QuizSession<S>,
    message: IncomingMessage,
) {
    let text = message.text.trim();
    if text.is_empty() {
        return;
    }

    let reply = match quiz.handle_text(&message.from_id.to_string(), text).await {
        Ok(reply) => reply,
        Err(err) => {
            log::error!("Failed to handle message from {}: {err}", message.from_id);
            return;
        }
    };
    if let Err(err) = client.send_message(message.from_id, &reply).await {
        log::error!("Failed to send reply to {}: {err}", message.from_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_new_messages() {
        let body = json!({
            "ts": "42",
            "updates": [
                {
                    "type": "message_new",
                    "object": { "message": { "from_id": 7, "text": "Сдаться", "peer_id": 7 } }
                },
                { "type": "message_typing_state", "object": { "from_id": 7 } },
                {
                    "type": "message_new",
                    "object": { "message": { "from_id": -5, "text": "от сообщества" } }
                }
            ]
        });
        assert_eq!(
            parse_poll(body).unwrap(),
            PollOutcome::Messages {
                ts: "42".to_string(),
                messages: vec![IncomingMessage {
                    from_id: 7,
                    text: "Сдаться".to_string(),
                }],
            }
        );
    }

    #[test]
    fn parses_failures() {
        assert_eq!(
            parse_poll(json!({ "failed": 1, "ts": 100 })).unwrap(),
            PollOutcome::NewTs("100".to_string())
        );
        assert_eq!(
            parse_poll(json!({ "failed": 2 })).unwrap(),
            PollOutcome::Reconnect
        );
        assert_eq!(
            parse_poll(json!({ "failed": 3 })).unwrap(),
            PollOutcome::Reconnect
        );
        assert!(matches!(
            parse_poll(json!({ "something": "else" })),
            Err(VkError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn api_errors_are_surfaced() {
        let envelope: ApiEnvelope<LongPollServer> = serde_json::from_value(json!({
            "error": { "error_code": 5, "error_msg": "User authorization failed" }
        }))
        .unwrap();
        assert!(matches!(
            unwrap_envelope(envelope),
            Err(VkError::Api { code: 5, .. })
        ));

        let envelope: ApiEnvelope<LongPollServer> = serde_json::from_value(json!({
            "response": { "key": "k", "server": "https://lp.vk.com/wh1", "ts": 10 }
        }))
        .unwrap();
        assert_eq!(unwrap_envelope(envelope).unwrap().ts, "10");
    }

    #[test]
    fn keyboard_lists_quiz_buttons() {
        let keyboard: serde_json::Value = serde_json::from_str(&keyboard_json()).unwrap();
        assert_eq!(keyboard["one_time"], json!(false));
        let rows = keyboard["buttons"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0]["action"]["label"], json!("Новый вопрос"));
        assert_eq!(rows[0][1]["action"]["label"], json!("Сдаться"));
        assert_eq!(rows[0][1]["color"], json!("negative"));
        assert_eq!(rows[1][0]["action"]["label"], json!("Мой счёт"));
    }
}
