use std::sync::Arc;

use quiz_bot::config::{self, Config};
use quiz_bot::quiz::{QuizSession, RedisSessionStore};
use quiz_bot::transport::vk::{self, VkClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    pretty_env_logger::init();
    log::info!("Starting VK quiz bot...");

    let (token, group_id) = config::vk_credentials()?;
    let corpus = quiz_bot::check_corpus(&config)?;

    log::info!("Connecting to Redis at {}", config.redis_url);
    let store = RedisSessionStore::connect(&config.redis_url).await?;

    let quiz = Arc::new(QuizSession::new(store, corpus).with_key_prefix(vk::KEY_PREFIX));
    vk::run(VkClient::new(token, group_id), quiz).await?;
    Ok(())
}
