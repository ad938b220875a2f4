use anyhow::Result;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::util::parse_bool_str;

const DEFAULT_LOG_PATH: &str = "/tmp/portx-console.log";
const DEBUG_PAYLOAD_ENV: &str = "PORTX_DEBUG_PAYLOAD";
const LOG_PATH_ENV: &str = "PORTX_LOG_PATH";
const REDACTED_KEYS: [&str; 4] = ["password", "code_verifier", "auth_code", "access_token"];

/// Install the global tracing subscriber.
///
/// The TUI owns stdout/stderr while it runs, so when stderr is a terminal
/// events go to a log file instead.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    if let Some(path) = resolve_log_path() {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init()
                    .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
                return Ok(());
            }
            Err(error) => {
                eprintln!("cannot open log file '{path}': {error}; logging to stderr");
            }
        }
    }

    builder
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(|v| parse_bool_str(&v))
        .unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let redacted = redact_payload(payload);
    let formatted_payload = serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(url = request_url, payload = %formatted_payload, "auth request payload");
}

pub fn redact_payload(payload: &Value) -> Value {
    match payload {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    if REDACTED_KEYS.contains(&key.as_str()) {
                        (key.clone(), Value::String("<redacted>".to_string()))
                    } else {
                        (key.clone(), redact_payload(value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_payload).collect()),
        other => other.clone(),
    }
}

fn resolve_log_path() -> Option<String> {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(DEFAULT_LOG_PATH.to_string())
            } else {
                None
            }
        })
}
