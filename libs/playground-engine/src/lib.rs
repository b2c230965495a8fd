//! Outbound integrations of the playground: the remote sandbox client,
//! the AI assistant and the language detector.

pub mod assistant;
pub mod clock;
pub mod detector;
pub mod executor;

#[cfg(test)]
mod test_utils;

pub use assistant::{Assistant, AssistantError, ChatModel, OpenAiChat};
pub use clock::{Sleeper, TokioSleeper};
pub use detector::LanguageDetector;
pub use executor::{ExecutionClient, ExecutionError, ExecutionOutcome, PollPolicy};
