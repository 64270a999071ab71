use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tarifa_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILES};
use toml::Value;

use crate::commands::CommandResult;

const COMMAND: &str = "config";

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

/// Effective configuration with the layer each value came from.
pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure(COMMAND, error.to_string()),
    };

    let file_path = detect_config_path(options.config_path.as_deref());
    let file_doc = load_config_file_doc(file_path.as_deref());
    let sources = Sources { options, file_doc: file_doc.as_ref(), file_path: file_path.as_deref() };

    let registry_path = config
        .registry
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<builtin>".to_string());

    let entries = vec![
        ConfigEntry {
            key: "commission.commissionable",
            value: config.commission.commissionable.to_string(),
            source: sources.field(
                "commission.commissionable",
                &["TARIFA_COMMISSION_COMMISSIONABLE"],
                options.overrides.commissionable.is_some(),
            ),
        },
        ConfigEntry {
            key: "commission.non_commissionable",
            value: config.commission.non_commissionable.to_string(),
            source: sources.field(
                "commission.non_commissionable",
                &["TARIFA_COMMISSION_NON_COMMISSIONABLE"],
                options.overrides.non_commissionable.is_some(),
            ),
        },
        ConfigEntry {
            key: "registry.path",
            value: registry_path,
            source: sources.field(
                "registry.path",
                &["TARIFA_REGISTRY_PATH"],
                options.overrides.registry_path.is_some(),
            ),
        },
        ConfigEntry {
            key: "logging.level",
            value: config.logging.level.clone(),
            source: sources.field(
                "logging.level",
                &["TARIFA_LOGGING_LEVEL", "TARIFA_LOG_LEVEL"],
                options.overrides.log_level.is_some(),
            ),
        },
        ConfigEntry {
            key: "logging.format",
            value: format!("{:?}", config.logging.format).to_lowercase(),
            source: sources.field(
                "logging.format",
                &["TARIFA_LOGGING_FORMAT", "TARIFA_LOG_FORMAT"],
                options.overrides.log_format.is_some(),
            ),
        },
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    lines.extend(entries.iter().map(render_line));

    CommandResult::with_result(COMMAND, lines.join("\n"), Some(entries))
}

struct Sources<'a> {
    options: &'a LoadOptions,
    file_doc: Option<&'a Value>,
    file_path: Option<&'a Path>,
}

impl Sources<'_> {
    fn field(&self, key_path: &str, env_keys: &[&str], overridden: bool) -> String {
        if overridden {
            return "flag".to_string();
        }

        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.file_doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .file_path
                    .or(self.options.config_path.as_deref())
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
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

fn render_line(entry: &ConfigEntry) -> String {
    format!("- {} = {} (source: {})", entry.key, entry.value, entry.source)
}
