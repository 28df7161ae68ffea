//! # codelia-core
//!
//! The evaluate/improve workflow plus the settings and prompt stores it
//! reads on every call.

mod error;
mod prompts;
mod service;
pub mod settings;

pub use error::{AnalysisError, StatusClass};
pub use prompts::{PromptId, PromptStore, PROMPTS_ENV_VAR};
pub use service::{AnalysisService, ImproveOutcome, RequirementAnalyzer};
pub use settings::{ConfigError, ProviderSettings, Settings, SettingsStore, SettingsUpdate};
