use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::AnalysisError;

/// Environment variable pointing at a directory of prompt overrides
pub const PROMPTS_ENV_VAR: &str = "CODELIA_PROMPTS_DIR";

const DEFAULT_SCORING_PROMPT: &str = include_str!("../prompts/scoring_criteria.md");
const DEFAULT_QUALITY_PROMPT: &str = include_str!("../prompts/quality.md");

/// The system prompts the workflow uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptId {
    /// Rubric asking for per-rule JSON scores
    Scoring,
    /// Rewrite guide with project placeholders
    Quality,
}

impl PromptId {
    pub fn file_name(&self) -> &'static str {
        match self {
            PromptId::Scoring => "scoring_criteria.md",
            PromptId::Quality => "quality.md",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            PromptId::Scoring => DEFAULT_SCORING_PROMPT,
            PromptId::Quality => DEFAULT_QUALITY_PROMPT,
        }
    }
}

/// Resolves prompt templates: files in the override directory win over the
/// compiled-in defaults.
#[derive(Debug, Clone, Default)]
pub struct PromptStore {
    override_dir: Option<PathBuf>,
}

impl PromptStore {
    /// Built-in prompts only
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    /// Honour `$CODELIA_PROMPTS_DIR` when set
    pub fn from_env() -> Self {
        match std::env::var_os(PROMPTS_ENV_VAR) {
            Some(dir) if !dir.is_empty() => Self::with_dir(dir),
            _ => Self::builtin(),
        }
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    pub fn load(&self, id: PromptId) -> Result<String, AnalysisError> {
        let Some(dir) = &self.override_dir else {
            return Ok(id.builtin().to_string());
        };

        let path = dir.join(id.file_name());
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), "Loaded prompt override");
                Ok(text)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(id.builtin().to_string()),
            Err(source) => Err(AnalysisError::Prompt { path, source }),
        }
    }
}
