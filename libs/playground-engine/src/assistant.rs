/// AI Assistant - Explain, Answer Questions About, and Rewrite Code
///
/// The assistant talks to a chat-completion model through the `ChatModel`
/// trait; `OpenAiChat` is the production implementation against an
/// OpenAI-compatible REST API.

use async_trait::async_trait;
use playground_common::config::OpenAiConfig;
use playground_common::languages::Language;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub const NO_RESPONSE: &str = "No response generated";
pub const NO_EXPLANATION: &str = "No explanation generated";

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("OpenAI API key not configured")]
    Configuration,
    #[error("LLM request failed with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Malformed LLM response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Content of the first choice, `None` when the model returned nothing
    async fn complete(&self, request: ChatRequest) -> Result<Option<String>, AssistantError>;
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiChat {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, request: ChatRequest) -> Result<Option<String>, AssistantError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AssistantError::Configuration)?;
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));

        let body = CompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %self.config.model, messages = request.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            warn!(status = %status, "Chat completion rejected");
            return Err(AssistantError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Decode(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content))
    }
}

/// Extract bare code from a markdown reply
///
/// Returns the body of the first fenced block, ignoring any prose around it
/// and the language tag on the opening fence. Unfenced replies come back
/// trimmed.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let mut lines = trimmed.lines();

    let Some(opening) = lines.by_ref().find(|line| is_fence(line)) else {
        return trimmed.to_string();
    };

    // Whole block on one line: ```code```
    let after_marker = opening.trim_start().trim_start_matches('`');
    if let Some(inline) = after_marker.trim_end().strip_suffix("```") {
        return inline.trim().to_string();
    }

    let body: Vec<&str> = lines.take_while(|line| !is_fence(line)).collect();
    body.join("\n").trim_end().to_string()
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn non_blank(reply: Option<String>) -> Option<String> {
    reply.filter(|r| !r.trim().is_empty())
}

#[derive(Clone)]
pub struct Assistant {
    model: Arc<dyn ChatModel>,
}

impl Assistant {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Free-form question about the given code
    pub async fn ask(
        &self,
        code: &str,
        language: Language,
        question: &str,
    ) -> Result<String, AssistantError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(
                    "You are an expert programming assistant. Help users understand, debug, and improve their code. Be concise and clear.",
                ),
                ChatMessage::user(format!(
                    "Language: {}\n\nCode:\n{}\n\nQuestion: {}",
                    language, code, question
                )),
            ],
            temperature: 0.7,
            max_tokens: 1000,
        };

        let reply = self.model.complete(request).await?;
        Ok(non_blank(reply).unwrap_or_else(|| NO_RESPONSE.to_string()))
    }

    pub async fn explain(&self, code: &str, language: Language) -> Result<String, AssistantError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(
                    "You are a code explanation expert. Explain code clearly and concisely.",
                ),
                ChatMessage::user(format!("Explain this {} code:\n\n{}", language, code)),
            ],
            temperature: 0.7,
            max_tokens: 800,
        };

        let reply = self.model.complete(request).await?;
        Ok(non_blank(reply).unwrap_or_else(|| NO_EXPLANATION.to_string()))
    }

    /// Rewrite the code according to an instruction and return bare source
    ///
    /// An empty reply leaves the code unchanged.
    pub async fn edit(
        &self,
        code: &str,
        language: Language,
        instruction: &str,
    ) -> Result<String, AssistantError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(
                    "You are an expert programmer. Modify the user's code as instructed. Respond with only the complete modified code, without explanations.",
                ),
                ChatMessage::user(format!(
                    "Language: {}\n\nCode:\n{}\n\nInstruction: {}",
                    language, code, instruction
                )),
            ],
            temperature: 0.2,
            max_tokens: 2000,
        };

        match non_blank(self.model.complete(request).await?) {
            Some(reply) => Ok(strip_code_fences(&reply)),
            None => Ok(code.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_utils::{MockResponse, MockServer};
    use serde_json::json;
    use std::sync::Mutex;

    /// Chat model that replays canned replies and records requests
    pub(crate) struct ScriptedModel {
        replies: Mutex<Vec<Option<String>>>,
        pub(crate) requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        pub(crate) fn new(replies: Vec<Option<&str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies.into_iter().rev().map(|r| r.map(str::to_string)).collect(),
                ),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, request: ChatRequest) -> Result<Option<String>, AssistantError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.replies.lock().unwrap().pop().flatten())
        }
    }

    #[test]
    fn test_strip_fences_with_language_tag() {
        let reply = "```python\nprint('hi')\n```";
        assert_eq!(strip_code_fences(reply), "print('hi')");
    }

    #[test]
    fn test_strip_fences_after_leading_prose() {
        let reply = "Here you go:\n```python\nprint(2)\n```";
        assert_eq!(strip_code_fences(reply), "print(2)");
    }

    #[test]
    fn test_strip_fences_before_trailing_prose() {
        let reply = "```python\nprint(2)\n```\nThis now prints 2.";
        assert_eq!(strip_code_fences(reply), "print(2)");
    }

    #[test]
    fn test_strip_fences_keeps_first_block_indentation() {
        let reply = "Sure.\n```rust\nfn main() {\n    run();\n}\n```\nAlso:\n```\nother\n```";
        assert_eq!(strip_code_fences(reply), "fn main() {\n    run();\n}");
    }

    #[test]
    fn test_unclosed_fence_takes_rest_of_reply() {
        assert_eq!(strip_code_fences("```js\nlet a = 1;\n"), "let a = 1;");
    }

    #[test]
    fn test_strip_fences_without_tag_and_trailing_space() {
        let reply = "\n```\nfn main() {}\n```\n\n";
        assert_eq!(strip_code_fences(reply), "fn main() {}");
    }

    #[test]
    fn test_unfenced_text_kept() {
        assert_eq!(strip_code_fences("  x = 1\n"), "x = 1");
    }

    #[test]
    fn test_inline_fence() {
        assert_eq!(strip_code_fences("```x = 1```"), "x = 1");
    }

    #[tokio::test]
    async fn test_ask_builds_prompt_and_falls_back() {
        let model = Arc::new(ScriptedModel::new(vec![Some("Use a loop."), None]));
        let assistant = Assistant::new(model.clone());

        let answer = assistant
            .ask("print(1)", Language::Python, "How do I repeat this?")
            .await
            .unwrap();
        assert_eq!(answer, "Use a loop.");

        let fallback = assistant.ask("", Language::Python, "?").await.unwrap();
        assert_eq!(fallback, NO_RESPONSE);

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, 1000);
        assert!(requests[0].messages[1].content.contains("Language: python"));
        assert!(requests[0].messages[1].content.contains("Question: How do I repeat this?"));
    }

    #[tokio::test]
    async fn test_explain_falls_back_on_blank_reply() {
        let model = Arc::new(ScriptedModel::new(vec![Some("   ")]));
        let assistant = Assistant::new(model.clone());
        let text = assistant.explain("int x;", Language::C).await.unwrap();
        assert_eq!(text, NO_EXPLANATION);
        assert_eq!(model.requests.lock().unwrap()[0].max_tokens, 800);
    }

    #[tokio::test]
    async fn test_edit_strips_fences_and_keeps_code_on_empty() {
        let model = Arc::new(ScriptedModel::new(vec![
            Some("```js\nconsole.log(2);\n```"),
            None,
        ]));
        let assistant = Assistant::new(model);

        let edited = assistant
            .edit("console.log(1);", Language::JavaScript, "print 2")
            .await
            .unwrap();
        assert_eq!(edited, "console.log(2);");

        let unchanged = assistant
            .edit("console.log(1);", Language::JavaScript, "print 2")
            .await
            .unwrap();
        assert_eq!(unchanged, "console.log(1);");
    }

    #[tokio::test]
    async fn test_openai_chat_requires_key() {
        let chat = OpenAiChat::new(OpenAiConfig::default());
        let err = chat
            .complete(ChatRequest {
                messages: vec![ChatMessage::user("hi")],
                temperature: 0.1,
                max_tokens: 10,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Configuration));
    }

    #[tokio::test]
    async fn test_openai_chat_request_and_reply() {
        let server = MockServer::start(vec![(
            "POST",
            "/v1/chat/completions",
            vec![MockResponse::json(200, json!({
                "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
            }))],
        )])
        .await;
        let chat = OpenAiChat::new(OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            api_base: format!("{}/v1", server.address()),
            model: "gpt-4o-mini".to_string(),
        });

        let reply = chat
            .complete(ChatRequest {
                messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
                temperature: 0.7,
                max_tokens: 1000,
            })
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some("hello"));

        let request = &server.requests()[0];
        assert_eq!(request.header("authorization").as_deref(), Some("Bearer sk-test"));
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[tokio::test]
    async fn test_openai_chat_error_status() {
        let server = MockServer::start(vec![(
            "POST",
            "/chat/completions",
            vec![MockResponse::text(429, "rate limited")],
        )])
        .await;
        let chat = OpenAiChat::new(OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            api_base: server.address(),
            model: "gpt-4o-mini".to_string(),
        });

        let err = chat
            .complete(ChatRequest {
                messages: vec![ChatMessage::user("hi")],
                temperature: 0.7,
                max_tokens: 10,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Http { status: 429, ref body } if body == "rate limited"));
    }

    #[tokio::test]
    async fn test_openai_chat_empty_choices() {
        let server = MockServer::start(vec![(
            "POST",
            "/chat/completions",
            vec![MockResponse::json(200, json!({ "choices": [] }))],
        )])
        .await;
        let chat = OpenAiChat::new(OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            api_base: server.address(),
            model: "gpt-4o-mini".to_string(),
        });
        let reply = chat
            .complete(ChatRequest {
                messages: vec![ChatMessage::user("hi")],
                temperature: 0.7,
                max_tokens: 10,
            })
            .await
            .unwrap();
        assert!(reply.is_none());
    }
}
