// CLI commands for the playground
use anyhow::{bail, Context, Result};
use playground_common::config::Config;
use playground_common::languages::{Language, LanguageTable};
use playground_common::types::ExecutionResult;
use playground_engine::{Assistant, ExecutionClient, LanguageDetector, OpenAiChat};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn resolve_language(key: &str) -> Result<Language> {
    Ok(LanguageTable::global().resolve(key)?)
}

fn assistant(config: &Config) -> Assistant {
    Assistant::new(Arc::new(OpenAiChat::new(config.openai.clone())))
}

/// Human-readable rendering of a sandbox result
pub fn format_result(result: &ExecutionResult) -> String {
    let mut out = String::new();
    if !result.output.is_empty() {
        out.push_str(&result.output);
        if !result.output.ends_with('\n') {
            out.push('\n');
        }
    }
    if !result.error.is_empty() {
        out.push_str("--- error ---\n");
        out.push_str(&result.error);
        if !result.error.ends_with('\n') {
            out.push('\n');
        }
    }

    let mut footer = format!("[{}]", result.status);
    if let Some(time) = result.time {
        footer.push_str(&format!(" {:.3}s", time));
    }
    if let Some(memory) = result.memory {
        footer.push_str(&format!(" {} KB", memory));
    }
    out.push_str(&footer);
    out
}

/// Submit a file to the sandbox and print the result
pub async fn run(language: &str, file: &Path, stdin: Option<&Path>, json: bool) -> Result<()> {
    let config = Config::from_env();
    let code = read_source(file)?;
    let input = stdin.map(read_source).transpose()?;

    let client = ExecutionClient::new(config.judge0);
    let outcome = client
        .execute_detailed(&code, language, input.as_deref())
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    } else {
        println!("{}", format_result(&outcome.result));
    }
    if !outcome.terminal {
        eprintln!(
            "⚠️  Still running after {} polls - result may be incomplete",
            outcome.attempts
        );
    }

    Ok(())
}

/// List all supported languages
pub fn list_languages() {
    let table = LanguageTable::global();

    println!("{:<14} {:<26} {:<6}", "Key", "Name", "Id");
    println!("{}", "─".repeat(48));

    for language in table.languages() {
        println!(
            "{:<14} {:<26} {:<6}",
            language.as_str(),
            language.display_name(),
            language.judge0_id()
        );
    }

    println!("\nTotal: {} language(s)", table.len());
}

pub async fn detect(file: &Path) -> Result<()> {
    let config = Config::from_env();
    let code = read_source(file)?;

    let detector = LanguageDetector::new(Arc::new(OpenAiChat::new(config.openai)));
    let language = detector.detect(&code).await?;
    println!("{}", language);

    Ok(())
}

pub async fn ask(language: &str, file: &Path, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        bail!("Question cannot be empty");
    }
    let language = resolve_language(language)?;
    let code = read_source(file)?;

    let answer = assistant(&Config::from_env())
        .ask(&code, language, question)
        .await?;
    println!("{}", answer);

    Ok(())
}

pub async fn explain(language: &str, file: &Path) -> Result<()> {
    let language = resolve_language(language)?;
    let code = read_source(file)?;
    if code.trim().is_empty() {
        bail!("Code cannot be empty");
    }

    let explanation = assistant(&Config::from_env())
        .explain(&code, language)
        .await?;
    println!("{}", explanation);

    Ok(())
}
