use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use encoding_rs::Encoding;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::error::CorpusError;
use crate::quiz::QuestionAnswer;

const QUESTION_FILE_EXTENSION: &str = "txt";
const ANSWER_MARKER: &str = "Ответ:";

// Not anchored: headings like "Тур 1. Вопрос 3:" carry the marker mid-line.
fn question_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Вопрос \d+:").expect("question marker pattern is valid"))
}

// Any capitalized "Label:" line, e.g. "Комментарий:", "Источник:", "Автор:".
fn label_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[А-ЯЁ][^:]+:").expect("label pattern is valid"))
}

/// Reads question files from a directory.
///
/// Nothing is cached: every [`CorpusLoader::draw`] rescans the directory, so
/// files can be added or edited while the bot is running.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    dir: PathBuf,
    encoding: &'static Encoding,
}

impl CorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            encoding: encoding_rs::KOI8_R,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads every pair from every `*.txt` file directly inside the directory.
    ///
    /// Files are visited in sorted order. A file that can't be read or decoded
    /// is skipped; a missing directory is an error.
    pub fn load_all(&self) -> Result<Vec<QuestionAnswer>, CorpusError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| CorpusError::Read {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CorpusError::Read {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(QUESTION_FILE_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut pairs = Vec::new();
        for path in paths {
            match self.load_file(&path) {
                Ok(found) => {
                    log::debug!("{}: {} questions", path.display(), found.len());
                    pairs.extend(found);
                }
                Err(err) => log::warn!("Skipping question file: {err}"),
            }
        }
        Ok(pairs)
    }

    pub fn load_file(&self, path: &Path) -> Result<Vec<QuestionAnswer>, CorpusError> {
        let bytes = fs::read(path).map_err(|source| CorpusError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = self
            .encoding
            .decode_without_bom_handling_and_without_replacement(&bytes)
            // Single-byte encodings accept any input, so NUL is what gives binary files away
            .filter(|text| !text.contains('\0'))
            .ok_or_else(|| CorpusError::Decode {
                path: path.to_path_buf(),
            })?;
        Ok(parse_questions(&text))
    }

    /// Picks one pair uniformly at random from a fresh scan.
    pub fn draw(&self) -> Result<QuestionAnswer, CorpusError> {
        let pairs = self.load_all()?;
        pairs
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(CorpusError::Exhausted)
    }
}

enum ScanState {
    Outside,
    Question(Vec<String>),
    Answer {
        question: Vec<String>,
        answer: Vec<String>,
    },
}

/// Extracts question/answer pairs from the text of one file.
///
/// A block starts at a "Вопрос N:" marker, which may sit mid-line, and its
/// answer at the next line starting with "Ответ:". The answer runs until the next capitalized label
/// line, the next question, or the end of the text. A question that never
/// gets an answer is dropped.
pub fn parse_questions(text: &str) -> Vec<QuestionAnswer> {
    let mut pairs = Vec::new();
    let mut state = ScanState::Outside;

    for line in text.lines() {
        if let Some(marker) = question_marker().find(line) {
            if let ScanState::Answer { question, answer } = state {
                pairs.push(finish(&question, &answer));
            }
            state = ScanState::Question(vec![line[marker.end()..].to_string()]);
            continue;
        }

        state = match state {
            ScanState::Outside => ScanState::Outside,
            ScanState::Question(question) => match line.strip_prefix(ANSWER_MARKER) {
                Some(rest) => ScanState::Answer {
                    question,
                    answer: vec![rest.to_string()],
                },
                None => {
                    let mut question = question;
                    question.push(line.to_string());
                    ScanState::Question(question)
                }
            },
            ScanState::Answer {
                question,
                mut answer,
            } => {
                if label_line().is_match(line) {
                    pairs.push(finish(&question, &answer));
                    ScanState::Outside
                } else {
                    answer.push(line.to_string());
                    ScanState::Answer { question, answer }
                }
            }
        };
    }

    if let ScanState::Answer { question, answer } = state {
        pairs.push(finish(&question, &answer));
    }
    pairs
}

fn finish(question: &[String], answer: &[String]) -> QuestionAnswer {
    QuestionAnswer::new(collapse_whitespace(question), collapse_whitespace(answer))
}

fn collapse_whitespace(lines: &[String]) -> String {
    lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
