use codelia_llm::{LlmProvider, ProviderError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{PatternData, ProjectContext, RequirementPrompts};

/// A rewritten requirement next to its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovedRequirement {
    pub original: String,
    pub improved: String,
    pub pattern_data: PatternData,
}

/// Rewrites requirements following the quality rules prompt
pub struct RequirementImprover<'a> {
    provider: &'a dyn LlmProvider,
    system_prompt: String,
}

impl<'a> RequirementImprover<'a> {
    /// `quality_template` may contain project placeholders, filled from `project`
    pub fn new(
        provider: &'a dyn LlmProvider,
        quality_template: &str,
        project: &ProjectContext,
    ) -> Self {
        Self {
            provider,
            system_prompt: RequirementPrompts::render_quality_prompt(quality_template, project),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Ask the provider for a rewrite. Failures are returned, not degraded.
    pub async fn improve(
        &self,
        requirement: &str,
        pattern: &PatternData,
    ) -> Result<ImprovedRequirement, ProviderError> {
        let message = RequirementPrompts::build_improvement_message(requirement, pattern);

        debug!(
            provider = self.provider.name(),
            pattern = pattern.pattern(),
            "Requesting requirement rewrite"
        );

        let improved = self.provider.generate(&self.system_prompt, &message).await?;

        info!(
            provider = self.provider.name(),
            improved_len = improved.len(),
            "Rewrite completed"
        );

        Ok(ImprovedRequirement {
            original: requirement.to_string(),
            improved: improved.trim().to_string(),
            pattern_data: pattern.clone(),
        })
    }
}
