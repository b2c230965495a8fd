use crate::languages::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One run request, built fresh per execution and never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub language: Language,
    pub stdin: String,
}

/// Normalized outcome of a remote run
///
/// Always well-formed: text fields default to empty strings even when the
/// sandbox omitted them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub output: String,
    pub error: String,
    pub status: String,
    pub time: Option<f64>,
    pub memory: Option<u64>,
}

/// Identity handed to us by the auth layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: Uuid,
    pub user_id: UserId,
    pub folder_id: Option<Uuid>,
    pub title: String,
    pub language: Language,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

/// History entry for a finished run; anonymous runs have no owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub user_id: Option<UserId>,
    pub language: Language,
    pub code: String,
    pub output: String,
    pub error: Option<String>,
    pub execution_time: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_defaults_are_empty() {
        let result = ExecutionResult::default();
        assert_eq!(result.output, "");
        assert_eq!(result.error, "");
        assert_eq!(result.status, "");
        assert!(result.time.is_none());
        assert!(result.memory.is_none());
    }

    #[test]
    fn test_result_wire_shape() {
        let result = ExecutionResult {
            output: "hi\n".to_string(),
            error: String::new(),
            status: "Accepted".to_string(),
            time: Some(0.01),
            memory: Some(3456),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["output"], "hi\n");
        assert_eq!(value["status"], "Accepted");
        assert_eq!(value["memory"], 3456);
    }

    #[test]
    fn test_user_id_is_transparent() {
        let json = serde_json::to_string(&UserId::new("user-1")).unwrap();
        assert_eq!(json, "\"user-1\"");
    }
}
