use std::env;
use std::fs;
use std::path::Path;

use secrecy::ExposeSecret;
use skyline_core::config::{resolve_config_path, AppConfig, LoadOptions};
use skyline_core::ApplicationError;
use toml::Value;

use crate::commands::CommandResult;

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            let error = ApplicationError::Configuration(error.to_string());
            return CommandResult::from_error("config", &error);
        }
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "llm.enabled",
        &config.llm.enabled.to_string(),
        source("llm.enabled", &["SKYLINE_LLM_ENABLED"]),
    ));
    lines.push(render_line(
        "llm.provider",
        &format!("{:?}", config.llm.provider),
        source("llm.provider", &["SKYLINE_LLM_PROVIDER"]),
    ));
    lines.push(render_line(
        "llm.model",
        &config.llm.model,
        source("llm.model", &["SKYLINE_LLM_MODEL"]),
    ));
    lines.push(render_line(
        "llm.base_url",
        config.llm.effective_base_url(),
        source("llm.base_url", &["SKYLINE_LLM_BASE_URL"]),
    ));

    let llm_api_key = match &config.llm.api_key {
        Some(key) => redact_token(key.expose_secret()),
        None => "<unset>".to_string(),
    };
    lines.push(render_line(
        "llm.api_key",
        &llm_api_key,
        source("llm.api_key", &["SKYLINE_LLM_API_KEY", "HUGGINGFACE_API_KEY"]),
    ));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        source("llm.timeout_secs", &["SKYLINE_LLM_TIMEOUT_SECS"]),
    ));
    lines.push(render_line(
        "llm.max_tokens",
        &config.llm.max_tokens.to_string(),
        source("llm.max_tokens", &["SKYLINE_LLM_MAX_TOKENS"]),
    ));
    lines.push(render_line(
        "llm.temperature",
        &config.llm.temperature.to_string(),
        source("llm.temperature", &["SKYLINE_LLM_TEMPERATURE"]),
    ));

    let records_path = config
        .records
        .path
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "records.path",
        &records_path,
        source("records.path", &["SKYLINE_RECORDS_PATH"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["SKYLINE_LOGGING_LEVEL", "SKYLINE_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["SKYLINE_LOGGING_FORMAT", "SKYLINE_LOG_FORMAT"]),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a recognizable prefix such as `hf_` or `sk-` and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.find(['-', '_']) {
        Some(index) if index <= 4 => format!("{}***", &trimmed[..=index]),
        _ => "<redacted>".to_string(),
    }
}
