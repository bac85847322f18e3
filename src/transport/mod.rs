//! Chat platform front ends. Each one only turns platform messages into text
//! for [`crate::quiz::QuizSession`] and sends the reply back with the quiz
//! keyboard.

pub mod telegram;
pub mod vk;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
