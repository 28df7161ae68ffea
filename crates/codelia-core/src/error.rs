use std::path::PathBuf;

use codelia_llm::ProviderError;
use thiserror::Error;

use crate::settings::ConfigError;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Settings error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read prompt {path}: {source}")]
    Prompt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How an error is reported to an HTTP client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    Unauthorized,
    Internal,
}

impl AnalysisError {
    pub fn validation(message: impl Into<String>) -> Self {
        AnalysisError::Validation(message.into())
    }

    /// Caller mistakes are bad requests, a missing key is unauthorized and
    /// everything else is internal.
    pub fn status_class(&self) -> StatusClass {
        match self {
            AnalysisError::Validation(_) => StatusClass::BadRequest,
            AnalysisError::Provider(ProviderError::MissingCredential(_)) => {
                StatusClass::Unauthorized
            }
            AnalysisError::Provider(
                ProviderError::Configuration(_) | ProviderError::UnsupportedProvider(_),
            ) => StatusClass::BadRequest,
            AnalysisError::Provider(_) | AnalysisError::Config(_) | AnalysisError::Prompt { .. } => {
                StatusClass::Internal
            }
        }
    }
}
