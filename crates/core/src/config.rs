use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::line_item::CommissionFactors;
use crate::tariff::registry::{RegionRegistry, RegistryError};

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["tarifa.toml", "config/tarifa.toml"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub commission: CommissionConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

/// Markup factors applied by the line-item builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommissionConfig {
    pub commissionable: Decimal,
    pub non_commissionable: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Region registry TOML; the built-in tables are used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub commissionable: Option<Decimal>,
    pub non_commissionable: Option<Decimal>,
    pub registry_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let factors = CommissionFactors::default();
        Self {
            commission: CommissionConfig {
                commissionable: factors.commissionable,
                non_commissionable: factors.non_commissionable,
            },
            registry: RegistryConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn commission_factors(&self) -> CommissionFactors {
        CommissionFactors {
            commissionable: self.commission.commissionable,
            non_commissionable: self.commission.non_commissionable,
        }
    }

    /// The configured registry file, or the built-in tables.
    pub fn load_registry(&self) -> Result<RegionRegistry, RegistryError> {
        match &self.registry.path {
            Some(path) => RegionRegistry::load(path),
            None => Ok(RegionRegistry::builtin()),
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(commission) = patch.commission {
            if let Some(commissionable) = commission.commissionable {
                self.commission.commissionable = commissionable;
            }
            if let Some(non_commissionable) = commission.non_commissionable {
                self.commission.non_commissionable = non_commissionable;
            }
        }

        if let Some(registry) = patch.registry {
            if let Some(path) = registry.path {
                self.registry.path = Some(path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TARIFA_COMMISSION_COMMISSIONABLE") {
            self.commission.commissionable =
                parse_decimal("TARIFA_COMMISSION_COMMISSIONABLE", &value)?;
        }
        if let Some(value) = read_env("TARIFA_COMMISSION_NON_COMMISSIONABLE") {
            self.commission.non_commissionable =
                parse_decimal("TARIFA_COMMISSION_NON_COMMISSIONABLE", &value)?;
        }

        if let Some(value) = read_env("TARIFA_REGISTRY_PATH") {
            self.registry.path = Some(PathBuf::from(value));
        }

        let log_level = read_env("TARIFA_LOGGING_LEVEL").or_else(|| read_env("TARIFA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TARIFA_LOGGING_FORMAT").or_else(|| read_env("TARIFA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(commissionable) = overrides.commissionable {
            self.commission.commissionable = commissionable;
        }
        if let Some(non_commissionable) = overrides.non_commissionable {
            self.commission.non_commissionable = non_commissionable;
        }
        if let Some(registry_path) = overrides.registry_path {
            self.registry.path = Some(registry_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_commission(&self.commission)?;
        validate_registry(&self.registry)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_commission(commission: &CommissionConfig) -> Result<(), ConfigError> {
    if commission.commissionable < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "commission.commissionable must be >= 0".to_string(),
        ));
    }
    if commission.non_commissionable < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "commission.non_commissionable must be >= 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_registry(registry: &RegistryConfig) -> Result<(), ConfigError> {
    if let Some(path) = &registry.path {
        if !path.exists() {
            return Err(ConfigError::Validation(format!(
                "registry.path `{}` does not exist",
                path.display()
            )));
        }
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    commission: Option<CommissionPatch>,
    registry: Option<RegistryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CommissionPatch {
    commissionable: Option<Decimal>,
    non_commissionable: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
