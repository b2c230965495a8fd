// Application configuration
// Everything is read from the environment; empty values count as unset.

use std::env;

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

pub const RAPIDAPI_KEY_HEADER: &str = "X-RapidAPI-Key";
pub const RAPIDAPI_HOST_HEADER: &str = "X-RapidAPI-Host";
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// How requests to the sandbox are authenticated
///
/// The same vendor is deployed either behind a marketplace gateway (key plus
/// host header) or self-hosted with a single token header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    None,
    RapidApi { key: String, host: String },
    Token { key: String },
}

impl AuthMode {
    pub fn resolve(api_key: Option<&str>, host_header: Option<&str>) -> Self {
        match (api_key, host_header) {
            (Some(key), Some(host)) => AuthMode::RapidApi {
                key: key.to_string(),
                host: host.to_string(),
            },
            (Some(key), None) => AuthMode::Token {
                key: key.to_string(),
            },
            (None, _) => AuthMode::None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::RapidApi { .. } => "rapidapi",
            AuthMode::Token { .. } => "token",
        }
    }

    /// Header pairs to attach to every sandbox request
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            AuthMode::None => Vec::new(),
            AuthMode::RapidApi { key, host } => vec![
                (RAPIDAPI_KEY_HEADER, key.clone()),
                (RAPIDAPI_HOST_HEADER, host.clone()),
            ],
            AuthMode::Token { key } => vec![(AUTH_TOKEN_HEADER, key.clone())],
        }
    }
}

/// Remote sandbox (Judge0-compatible) settings
#[derive(Debug, Clone, Default)]
pub struct Judge0Config {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub host_header: Option<String>,
}

impl Judge0Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: non_empty(Some(base_url.into())),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = non_empty(Some(api_key.into()));
        self
    }

    pub fn with_host_header(mut self, host_header: impl Into<String>) -> Self {
        self.host_header = non_empty(Some(host_header.into()));
        self
    }

    /// Base URL without trailing slashes
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    pub fn auth_mode(&self) -> AuthMode {
        AuthMode::resolve(self.api_key.as_deref(), self.host_header.as_deref())
    }
}

/// Chat-completion API settings
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub judge0: Judge0Config,
    pub openai: OpenAiConfig,
    pub redis_url: Option<String>,
    pub bind_addr: String,
    /// `PLAYGROUND_LOG_FORMAT=json` switches the server to JSON log lines
    pub json_logs: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_empty(lookup(name));

        Self {
            judge0: Judge0Config {
                base_url: var("JUDGE0_API_HOST"),
                api_key: var("JUDGE0_API_KEY"),
                host_header: var("JUDGE0_API_HOST_HEADER"),
            },
            openai: OpenAiConfig {
                api_key: var("OPENAI_API_KEY"),
                api_base: var("OPENAI_API_BASE")
                    .map(|base| base.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
                model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
            redis_url: var("REDIS_URL"),
            bind_addr: var("PLAYGROUND_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            json_logs: var("PLAYGROUND_LOG_FORMAT")
                .map(|format| format.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
