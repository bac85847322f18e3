use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
    utils::command::BotCommands,
};

use crate::quiz::protocol::DEFAULT_KEY_PREFIX;
use crate::quiz::{keyboard_rows, QuizSession, SessionStore};
use crate::transport::HandlerResult;

pub const KEY_PREFIX: &str = DEFAULT_KEY_PREFIX;

const GREETING_TEXT: &str =
    "Здравствуйте! Я бот для викторин. Нажмите «Новый вопрос», чтобы начать.";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Поддерживаемые команды:")]
pub enum Command {
    #[command(description = "начать викторину")]
    Start,
    #[command(description = "показать эту справку")]
    Help,
}

pub fn quiz_keyboard() -> KeyboardMarkup {
    let rows = keyboard_rows()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|button| KeyboardButton::new(button.label()))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    KeyboardMarkup::new(rows)
}

/// Sessions belong to the sender, so members of a group chat each get their
/// own question. Messages without a sender fall back to the chat id.
pub fn sender_id(msg: &Message) -> String {
    match msg.from() {
        Some(user) => user.id.0.to_string(),
        None => msg.chat.id.0.to_string(),
    }
}

/// Runs long polling until Ctrl-C.
pub async fn run<S: SessionStore + 'static>(bot: Bot, quiz: Arc<QuizSession<S>>) {
    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_message::<S>));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![quiz])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> HandlerResult {
    let text = match cmd {
        Command::Start => GREETING_TEXT.to_string(),
        Command::Help => Command::descriptions().to_string(),
    };
    bot.send_message(msg.chat.id, text)
        .reply_markup(quiz_keyboard())
        .await?;
    Ok(())
}

async fn handle_message<S: SessionStore + 'static>(
    bot: Bot,
    msg: Message,
    quiz: Arc<QuizSession<S>>,
) -> HandlerResult {
    let Some(text) = msg.text().map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(());
    };

    let reply = quiz.handle_text(&sender_id(&msg), text).await?;
    bot.send_message(msg.chat.id, reply)
        .reply_markup(quiz_keyboard())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::quiz::{Button, CorpusLoader, InMemorySessionStore};

    fn group_message(sender: u64, text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": { "id": -1001, "type": "supergroup", "title": "Викторина" },
            "from": { "id": sender, "is_bot": false, "first_name": "Анна" },
            "text": text,
        }))
        .unwrap()
    }

    #[test]
    fn keyboard_has_quiz_buttons() {
        let keyboard = quiz_keyboard();
        let labels: Vec<Vec<&str>> = keyboard
            .keyboard
            .iter()
            .map(|row| row.iter().map(|button| button.text.as_str()).collect())
            .collect();
        assert_eq!(
            labels,
            vec![
                vec![Button::NewQuestion.label(), Button::GiveUp.label()],
                vec![Button::MyScore.label()],
            ]
        );
    }

    #[test]
    fn commands_parse() {
        assert!(matches!(
            Command::parse("/start", "quiz_bot"),
            Ok(Command::Start)
        ));
        assert!(matches!(Command::parse("/help", "quiz_bot"), Ok(Command::Help)));
        assert!(Command::parse("Новый вопрос", "quiz_bot").is_err());
    }

    #[test]
    fn group_members_get_separate_sessions() {
        let first = group_message(42, "Париж");
        let second = group_message(43, "Париж");
        assert_eq!(first.chat.id, second.chat.id);
        assert_eq!(sender_id(&first), "42");
        assert_eq!(sender_id(&second), "43");
    }

    #[test]
    fn session_keys_use_the_user_prefix() {
        let quiz = QuizSession::new(InMemorySessionStore::new(), CorpusLoader::new("unused"))
            .with_key_prefix(KEY_PREFIX);
        let msg = group_message(42, "Сдаться");
        assert_eq!(quiz.session_key(&sender_id(&msg)), "user:42");
    }
}
