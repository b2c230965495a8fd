/// Execution Client - Remote Sandbox Submit/Poll Protocol
///
/// **Core Responsibility:**
/// Turn a (code, language, stdin) triple into a normalized ExecutionResult,
/// hiding the sandbox's two-phase protocol and its auth header conventions.
///
/// **Protocol:**
/// 1. `POST {base}/submissions?wait=false` with source, numeric language id
///    and stdin; the response carries an opaque token
/// 2. Poll `GET {base}/submissions/{token}?fields=...`, sleeping before each
///    attempt, until the status id reaches the terminal threshold (>= 3) or
///    the attempt budget runs out
/// 3. Normalize the last poll into an ExecutionResult
///
/// **Failure Rules:**
/// - Missing base URL or unknown language: fail before any network call
/// - Non-2xx on submit: error carries the response body verbatim
/// - Non-2xx on poll: aborts the whole run, earlier polls are discarded
/// - Budget exhausted while still running: NOT an error, the last poll is
///   returned and `ExecutionOutcome::terminal` is false

use crate::clock::{Sleeper, TokioSleeper};
use playground_common::config::{AuthMode, Judge0Config};
use playground_common::error::UnsupportedLanguage;
use playground_common::languages::LanguageTable;
use playground_common::types::{ExecutionRequest, ExecutionResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Url};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub const MAX_POLL_ATTEMPTS: u32 = 30;
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Status ids below this value mean queued or processing
pub const TERMINAL_STATUS_THRESHOLD: u32 = 3;

const SUBMISSION_FIELDS: &str = "stdout,stderr,status,time,memory,compile_output";

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Judge0 API host not configured")]
    Configuration,
    #[error("Judge0 API host is not a valid URL: {0}")]
    InvalidBaseUrl(String),
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),
    #[error("Submission failed: {0}")]
    SubmitFailed(String),
    #[error("Failed to get submission result")]
    PollFailed,
    #[error("Sandbox request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Malformed sandbox response: {0}")]
    Decode(String),
}

/// Bounded-wait policy for the poll phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_POLL_ATTEMPTS,
            interval: POLL_INTERVAL,
        }
    }
}

/// Normalized result plus how the poll phase ended
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    pub result: ExecutionResult,
    pub status_id: u32,
    pub attempts: u32,
    /// False when the budget ran out before the run finished
    pub terminal: bool,
}

#[derive(Debug, Serialize)]
struct SubmissionPayload<'a> {
    source_code: &'a str,
    language_id: u32,
    stdin: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmissionToken {
    token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionStatus {
    #[serde(default, deserialize_with = "nullable")]
    pub id: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        self.id >= TERMINAL_STATUS_THRESHOLD
    }
}

/// Fields of one poll response; every field may be absent or null
#[derive(Debug, Clone, Default, Deserialize)]
struct SubmissionSnapshot {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    compile_output: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    status: SubmissionStatus,
    #[serde(default, deserialize_with = "lenient_number")]
    time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    memory: Option<u64>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The sandbox reports `time` as a decimal string; accept numbers too
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    Ok(match Option::<Raw<T>>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

impl From<SubmissionSnapshot> for ExecutionResult {
    fn from(snapshot: SubmissionSnapshot) -> Self {
        let error = non_empty(snapshot.stderr)
            .or_else(|| non_empty(snapshot.compile_output))
            .unwrap_or_default();

        ExecutionResult {
            output: snapshot.stdout.unwrap_or_default(),
            error,
            status: snapshot.status.description,
            time: snapshot.time,
            memory: snapshot.memory,
        }
    }
}

/// Poll URL for a token; the token is escaped as a single path segment
fn submission_url(base_url: &str, token: &str) -> Result<Url, ExecutionError> {
    let invalid = || ExecutionError::InvalidBaseUrl(base_url.to_string());
    let mut url = Url::parse(base_url).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .push("submissions")
        .push(token);
    url.set_query(Some(&format!("fields={}", SUBMISSION_FIELDS)));
    Ok(url)
}

/// Client for a Judge0-compatible sandbox
///
/// Holds no per-run state; concurrent `execute` calls are independent.
#[derive(Clone)]
pub struct ExecutionClient {
    http: reqwest::Client,
    config: Judge0Config,
    auth: AuthMode,
    table: &'static LanguageTable,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
}

impl ExecutionClient {
    pub fn new(config: Judge0Config) -> Self {
        let auth = config.auth_mode();
        debug!(auth = auth.name(), "Sandbox auth mode resolved");
        Self {
            http: reqwest::Client::new(),
            config,
            auth,
            table: LanguageTable::global(),
            sleeper: Arc::new(TokioSleeper),
            policy: PollPolicy::default(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Auth mode fixed when the client was built
    pub fn auth_mode(&self) -> &AuthMode {
        &self.auth
    }

    /// Run code remotely and return the normalized result
    pub async fn execute(
        &self,
        code: &str,
        language: &str,
        stdin: Option<&str>,
    ) -> Result<ExecutionResult, ExecutionError> {
        Ok(self.execute_detailed(code, language, stdin).await?.result)
    }

    /// Like `execute`, but also reports whether the run actually finished
    #[instrument(skip_all, fields(language = %language))]
    pub async fn execute_detailed(
        &self,
        code: &str,
        language: &str,
        stdin: Option<&str>,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let base_url = self.config.base_url().ok_or(ExecutionError::Configuration)?;
        let language = self.table.resolve(language)?;

        let request = ExecutionRequest {
            source_code: code.to_string(),
            language,
            stdin: stdin.unwrap_or_default().to_string(),
        };

        let token = self.submit(base_url, &request).await?;
        self.poll(base_url, &token).await
    }

    fn prepare(&self, builder: RequestBuilder) -> RequestBuilder {
        self.auth
            .headers()
            .into_iter()
            .fold(builder.header(CONTENT_TYPE, "application/json"), |b, (name, value)| {
                b.header(name, value)
            })
    }

    async fn submit(
        &self,
        base_url: &str,
        request: &ExecutionRequest,
    ) -> Result<String, ExecutionError> {
        let language = request.language;
        let payload = SubmissionPayload {
            source_code: &request.source_code,
            language_id: language.judge0_id(),
            stdin: &request.stdin,
        };

        info!(
            language = %language,
            language_id = payload.language_id,
            source_size = request.source_code.len(),
            stdin_size = request.stdin.len(),
            "Submitting code"
        );

        let url = format!("{}/submissions?wait=false", base_url);
        let response = self
            .prepare(self.http.post(&url))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            warn!(status = %status, "Submission rejected");
            return Err(ExecutionError::SubmitFailed(body));
        }

        let submitted: SubmissionToken = response
            .json()
            .await
            .map_err(|e| ExecutionError::Decode(e.to_string()))?;

        debug!(token = %submitted.token, "Submission accepted");
        Ok(submitted.token)
    }

    async fn fetch(
        &self,
        base_url: &str,
        token: &str,
    ) -> Result<SubmissionSnapshot, ExecutionError> {
        let url = submission_url(base_url, token)?;
        let response = self.prepare(self.http.get(url)).send().await?;

        if !response.status().is_success() {
            warn!(token = %token, status = %response.status(), "Poll rejected");
            return Err(ExecutionError::PollFailed);
        }

        response
            .json()
            .await
            .map_err(|e| ExecutionError::Decode(e.to_string()))
    }

    async fn poll(
        &self,
        base_url: &str,
        token: &str,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let mut last = SubmissionSnapshot::default();
        let mut attempts = 0;

        while attempts < self.policy.max_attempts {
            self.sleeper.sleep(self.policy.interval).await;
            attempts += 1;

            last = self.fetch(base_url, token).await?;
            debug!(
                token = %token,
                attempt = attempts,
                status_id = last.status.id,
                "Polled submission"
            );

            if last.status.is_terminal() {
                break;
            }
        }

        let status_id = last.status.id;
        let terminal = last.status.is_terminal();
        if terminal {
            info!(token = %token, status = %last.status.description, attempts, "Execution finished");
        } else {
            warn!(
                token = %token,
                status_id,
                attempts,
                "Poll budget exhausted before a terminal status"
            );
        }

        Ok(ExecutionOutcome {
            result: last.into(),
            status_id,
            attempts,
            terminal,
        })
    }
}
