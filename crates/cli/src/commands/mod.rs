pub mod config;
pub mod distribute;
pub mod merge;
pub mod price;
pub mod quote;

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tarifa_core::config::{AppConfig, LoadOptions};
use tarifa_core::{ApplicationError, InterfaceError, QuotationError, QuotationRuntime};

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_DOMAIN: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<T: Serialize> {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
}

impl CommandResult {
    /// Success carrying a structured payload under `result`.
    pub fn with_result<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        result: Option<T>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            result,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome::<()> {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            result: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn config_failure(command: &str, message: impl Into<String>) -> Self {
        Self::failure(command, "config_validation", message, EXIT_CONFIG)
    }

    pub fn input_failure(command: &str, error: &anyhow::Error) -> Self {
        Self::failure(command, "input", format!("{error:#}"), EXIT_INPUT)
    }

    /// Domain failures go through the interface mapping so the class is the error kind.
    pub fn domain_failure(command: &str, error: QuotationError) -> Self {
        let interface = ApplicationError::from(error).into_interface(correlation_id(command));
        tracing::warn!(
            event_name = "cli.command.failed",
            command,
            correlation_id = interface.correlation_id(),
            hint = interface.user_message(),
            "{interface}"
        );
        match interface {
            InterfaceError::BadRequest { kind, message, .. } => {
                Self::failure(command, &kind, message, EXIT_DOMAIN)
            }
            InterfaceError::Internal { message, .. } => {
                Self::failure(command, "internal", message, EXIT_DOMAIN)
            }
        }
    }
}

fn correlation_id(command: &str) -> String {
    format!("cli-{command}-{}", std::process::id())
}

fn serialize_payload<T: Serialize>(payload: CommandOutcome<T>) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads configuration and the runtime it describes, or the failure to report.
pub(crate) fn load_runtime(
    command: &str,
    options: &LoadOptions,
) -> Result<QuotationRuntime, CommandResult> {
    let config = AppConfig::load(options.clone())
        .map_err(|error| CommandResult::config_failure(command, error.to_string()))?;
    QuotationRuntime::from_config(&config)
        .map_err(|error| CommandResult::config_failure(command, error.to_string()))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read `{}`", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("could not parse `{}`", path.display()))
}

/// Optional JSON document; absent paths yield the type's default.
pub(crate) fn read_optional_json<T: DeserializeOwned + Default>(
    path: Option<&Path>,
) -> anyhow::Result<T> {
    match path {
        Some(path) => read_json(path),
        None => Ok(T::default()),
    }
}
