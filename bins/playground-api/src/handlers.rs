// HTTP route handlers for the playground API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use playground_common::languages::{Language, LanguageTable};
use playground_common::library::NewExecution;
use playground_common::types::{ExecutionRecord, ExecutionResult, Folder, Snippet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

fn resolve_language(key: &str) -> Result<Language, ApiError> {
    Ok(LanguageTable::global().resolve(key)?)
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    pub language: String,
    #[serde(default, alias = "input")]
    pub stdin: Option<String>,
}

/// POST /execute - Run code in the remote sandbox
pub async fn execute_code(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let started = Instant::now();
    let language_label = if LanguageTable::global().contains(&payload.language) {
        payload.language.clone()
    } else {
        "unsupported".to_string()
    };
    let outcome = state
        .executor
        .execute_detailed(&payload.code, &payload.language, payload.stdin.as_deref())
        .await;

    let outcome_label = metrics::outcome_label(&outcome, |o| o.terminal);
    metrics::EXECUTIONS_TOTAL
        .with_label_values(&[language_label.as_str(), outcome_label])
        .inc();
    let outcome = outcome?;
    metrics::EXECUTION_SECONDS
        .with_label_values(&[language_label.as_str()])
        .observe(started.elapsed().as_secs_f64());

    info!(
        language = %payload.language,
        status = %outcome.result.status,
        attempts = outcome.attempts,
        terminal = outcome.terminal,
        "Execution returned"
    );

    // The language was validated by the executor, so this always resolves
    if let Ok(language) = resolve_language(&payload.language) {
        let result = &outcome.result;
        let entry = NewExecution {
            language,
            code: payload.code,
            output: result.output.clone(),
            error: (!result.error.is_empty()).then(|| result.error.clone()),
            execution_time: result.time,
        };
        if let Err(e) = state.library.save_execution(user.user(), entry).await {
            // Non-fatal - the caller still gets the result
            warn!(error = %e, "Failed to record execution");
        }
    }

    Ok(Json(outcome.result))
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub id: u32,
    pub starter_code: Option<&'static str>,
}

/// GET /languages - Supported languages in picker order
pub async fn list_languages() -> Json<Vec<LanguageInfo>> {
    let languages = LanguageTable::global()
        .languages()
        .iter()
        .map(|language| LanguageInfo {
            key: language.as_str(),
            name: language.display_name(),
            id: language.judge0_id(),
            starter_code: language.starter_code(),
        })
        .collect();
    Json(languages)
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub language: Language,
}

/// POST /detect-language - Best-guess language for a piece of code
pub async fn detect_language(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    let language = state.detector.detect(&payload.code).await?;
    Ok(Json(DetectResponse { language }))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub code: String,
    pub language: String,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub code: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub code: String,
    pub language: String,
    pub instruction: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub code: String,
}

fn record_assistant_call<T, E>(kind: &str, result: &Result<T, E>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    metrics::ASSISTANT_REQUESTS_TOTAL
        .with_label_values(&[kind, outcome])
        .inc();
}

/// POST /assistant/ask
pub async fn ask_assistant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    if payload.question.trim().is_empty() {
        return Err(ApiError::Validation("Question cannot be empty".to_string()));
    }
    let language = resolve_language(&payload.language)?;
    let answer = state
        .assistant
        .ask(&payload.code, language, &payload.question)
        .await;
    record_assistant_call("ask", &answer);
    Ok(Json(AnswerResponse { answer: answer? }))
}

/// POST /assistant/explain
pub async fn explain_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExplainRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    if payload.code.trim().is_empty() {
        return Err(ApiError::Validation("Code cannot be empty".to_string()));
    }
    let language = resolve_language(&payload.language)?;
    let answer = state.assistant.explain(&payload.code, language).await;
    record_assistant_call("explain", &answer);
    Ok(Json(AnswerResponse { answer: answer? }))
}

/// POST /assistant/edit
pub async fn edit_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EditRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    if payload.instruction.trim().is_empty() {
        return Err(ApiError::Validation("Instruction cannot be empty".to_string()));
    }
    let language = resolve_language(&payload.language)?;
    let code = state
        .assistant
        .edit(&payload.code, language, &payload.instruction)
        .await;
    record_assistant_call("edit", &code);
    Ok(Json(EditResponse { code: code? }))
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameFolderRequest {
    pub name: String,
}

/// GET /folders
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<Folder>>, ApiError> {
    Ok(Json(state.library.list_folders(user.user()).await?))
}

/// POST /folders
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<CreateFolderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let folder = state
        .library
        .create_folder(user.user(), &payload.name, payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// PATCH /folders/:id
pub async fn rename_folder(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(folder_id): Path<Uuid>,
    Json(payload): Json<RenameFolderRequest>,
) -> Result<Json<Folder>, ApiError> {
    let folder = state
        .library
        .rename_folder(user.user(), folder_id, &payload.name)
        .await?;
    Ok(Json(folder))
}

/// DELETE /folders/:id - Also removes the snippets inside
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(folder_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.library.delete_folder(user.user(), folder_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SnippetQuery {
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SaveSnippetRequest {
    pub title: String,
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct MoveSnippetRequest {
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

/// GET /snippets?folder_id=
pub async fn list_snippets(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<SnippetQuery>,
) -> Result<Json<Vec<Snippet>>, ApiError> {
    Ok(Json(
        state.library.list_snippets(user.user(), query.folder_id).await?,
    ))
}

/// POST /snippets
pub async fn save_snippet(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<SaveSnippetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let language = resolve_language(&payload.language)?;
    let snippet = state
        .library
        .save_snippet(
            user.user(),
            &payload.title,
            language,
            &payload.code,
            payload.folder_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(snippet)))
}

/// DELETE /snippets/:id
pub async fn delete_snippet(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(snippet_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.library.delete_snippet(user.user(), snippet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /snippets/:id/folder - `folder_id: null` moves it out of any folder
pub async fn move_snippet(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(snippet_id): Path<Uuid>,
    Json(payload): Json<MoveSnippetRequest>,
) -> Result<Json<Snippet>, ApiError> {
    let snippet = state
        .library
        .move_snippet(user.user(), snippet_id, payload.folder_id)
        .await?;
    Ok(Json(snippet))
}

/// GET /executions - Last 50 runs
pub async fn list_executions(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<ExecutionRecord>>, ApiError> {
    Ok(Json(state.library.list_executions(user.user()).await?))
}

/// GET /executions/recent - Last 10 runs
pub async fn recent_executions(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<ExecutionRecord>>, ApiError> {
    Ok(Json(state.library.recent_executions(user.user()).await?))
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus scrape endpoint
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
