use thiserror::Error;

use crate::config::ConfigError;
use crate::tariff::registry::RegistryError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QuotationError {
    #[error("invalid input for `{field}` (`{value}`): {reason}")]
    InvalidInput { field: String, value: String, reason: String },
    #[error("unsupported coverage mode `{code}`")]
    UnsupportedCoverage { code: String },
    #[error("region `{region}` is not part of the distribution")]
    NotFound { region: String },
    #[error(
        "inconsistent override for `{region}`: total {total} does not equal urbano {urban} + rural {rural}"
    )]
    InconsistentOverride { region: String, total: u32, urban: u32, rural: u32 },
}

impl QuotationError {
    pub fn invalid(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput { field: field.into(), value: value.to_string(), reason: reason.into() }
    }

    /// Stable machine-readable class used by callers that surface errors as payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::UnsupportedCoverage { .. } => "unsupported_coverage",
            Self::NotFound { .. } => "not_found",
            Self::InconsistentOverride { .. } => "inconsistent_override",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Quotation(#[from] QuotationError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { kind: String, message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The quotation could not be calculated. Check inputs and try again."
            }
            Self::Internal { .. } => "The quotation engine is misconfigured.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => {
                *id = correlation_id;
            }
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Quotation(error) => Self::BadRequest {
                kind: error.kind().to_owned(),
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Registry(error) => Self::Internal {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Configuration(error) => Self::Internal {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
        }
    }
}
