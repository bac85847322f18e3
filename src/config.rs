use std::path::PathBuf;

use encoding_rs::Encoding;

use crate::error::ConfigError;

pub const DEFAULT_QUIZ_DIR: &str = "quiz-questions";
pub const DEFAULT_ENCODING: &str = "koi8-r";
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Settings shared by both bots. Tokens are looked up separately since each
/// binary only needs its own.
#[derive(Debug, Clone)]
pub struct Config {
    pub quiz_dir: PathBuf,
    pub encoding: &'static Encoding,
    pub redis_url: String,
}

impl Config {
    /// Reads `.env` (if any) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let quiz_dir = std::env::var("QUIZ_DIR").unwrap_or_else(|_| DEFAULT_QUIZ_DIR.to_string());
        let encoding_label =
            std::env::var("QUIZ_ENCODING").unwrap_or_else(|_| DEFAULT_ENCODING.to_string());
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());

        Ok(Self {
            quiz_dir: PathBuf::from(quiz_dir),
            encoding: resolve_encoding(&encoding_label)?,
            redis_url,
        })
    }
}

pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, ConfigError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ConfigError::UnknownEncoding(label.to_string()))
}

/// Returns a required, non-empty environment variable.
pub fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

pub fn telegram_token() -> Result<String, ConfigError> {
    required("TG_BOT_TOKEN")
}

/// VK community token and group id.
pub fn vk_credentials() -> Result<(String, u64), ConfigError> {
    let token = required("VK_BOT_TOKEN")?;
    let group_id = required("VK_GROUP_ID")?;
    let group_id = group_id
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid {
            name: "VK_GROUP_ID",
            value: group_id.clone(),
        })?;
    Ok((token, group_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_labels() {
        assert_eq!(resolve_encoding("koi8-r").unwrap(), encoding_rs::KOI8_R);
        assert_eq!(resolve_encoding(" KOI8-R ").unwrap(), encoding_rs::KOI8_R);
        assert_eq!(resolve_encoding("utf-8").unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn rejects_unknown_label() {
        assert!(matches!(
            resolve_encoding("klingon"),
            Err(ConfigError::UnknownEncoding(_))
        ));
    }
}
