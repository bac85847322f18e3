pub mod config;
pub mod error;
pub mod quiz;
pub mod transport;

use crate::config::Config;
use crate::error::CorpusError;
use crate::quiz::CorpusLoader;

/// Builds the corpus loader from config and scans it once, so a missing
/// directory stops the bot before it starts polling.
pub fn check_corpus(config: &Config) -> Result<CorpusLoader, CorpusError> {
    let corpus = CorpusLoader::new(&config.quiz_dir).with_encoding(config.encoding);
    let count = corpus.load_all()?.len();
    if count == 0 {
        log::warn!("No questions found in {}", config.quiz_dir.display());
    } else {
        log::info!("Loaded {count} questions from {}", config.quiz_dir.display());
    }
    Ok(corpus)
}
