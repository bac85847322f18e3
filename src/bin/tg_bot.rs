use std::sync::Arc;

use quiz_bot::config::{self, Config};
use quiz_bot::quiz::{QuizSession, RedisSessionStore};
use quiz_bot::transport::telegram;
use teloxide::Bot;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    pretty_env_logger::init();
    log::info!("Starting Telegram quiz bot...");

    let token = config::telegram_token()?;
    let corpus = quiz_bot::check_corpus(&config)?;

    log::info!("Connecting to Redis at {}", config.redis_url);
    let store = RedisSessionStore::connect(&config.redis_url).await?;

    let quiz = Arc::new(QuizSession::new(store, corpus).with_key_prefix(telegram::KEY_PREFIX));
    telegram::run(Bot::new(token), quiz).await;
    Ok(())
}
