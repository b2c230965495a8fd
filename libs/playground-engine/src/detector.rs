// Language detection backed by the chat model.
// Only a small fixed set is offered to the model; anything else it answers
// falls back to the default language.

use crate::assistant::{AssistantError, ChatMessage, ChatModel, ChatRequest};
use playground_common::languages::Language;
use std::sync::Arc;
use tracing::debug;

pub const DETECTABLE: [Language; 5] = [
    Language::Python,
    Language::JavaScript,
    Language::Java,
    Language::Cpp,
    Language::C,
];

pub const DEFAULT_LANGUAGE: Language = Language::Python;

#[derive(Clone)]
pub struct LanguageDetector {
    model: Arc<dyn ChatModel>,
}

/// Map a raw model answer onto the detectable set
pub fn interpret_answer(answer: Option<&str>) -> Language {
    let answer = answer.map(|a| a.trim().to_lowercase()).unwrap_or_default();
    DETECTABLE
        .iter()
        .copied()
        .find(|language| language.as_str() == answer)
        .unwrap_or(DEFAULT_LANGUAGE)
}

impl LanguageDetector {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn detect(&self, code: &str) -> Result<Language, AssistantError> {
        if code.trim().is_empty() {
            return Ok(DEFAULT_LANGUAGE);
        }

        let choices: Vec<&str> = DETECTABLE.iter().map(|l| l.as_str()).collect();
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(format!(
                    "You are a programming language detection expert. Analyze the provided code and identify which programming language it is written in. You must respond with ONLY ONE of these exact values: {}. Do not include any explanation or additional text.",
                    choices.join(", ")
                )),
                ChatMessage::user(format!(
                    "Detect the programming language of this code:\n\n{}",
                    code
                )),
            ],
            temperature: 0.1,
            max_tokens: 10,
        };

        let answer = self.model.complete(request).await?;
        let language = interpret_answer(answer.as_deref());
        debug!(answer = ?answer, detected = %language, "Language detected");
        Ok(language)
    }
}
