use codelia_llm::{LlmProvider, ProviderError};
use tracing::{debug, info, warn};

use crate::parser::{parse_scores, ScoreParseError};
use crate::{Evaluation, RequirementPrompts, ScoreReport};

/// Scores requirements with an LLM provider
pub struct RequirementEvaluator<'a> {
    provider: &'a dyn LlmProvider,
    scoring_prompt: &'a str,
}

impl<'a> RequirementEvaluator<'a> {
    pub fn new(provider: &'a dyn LlmProvider, scoring_prompt: &'a str) -> Self {
        Self {
            provider,
            scoring_prompt,
        }
    }

    /// Score a requirement, degrading to a zero report when the provider
    /// call or the parse fails.
    pub async fn evaluate(&self, requirement: &str) -> Evaluation {
        match self.try_evaluate(requirement).await {
            Ok(report) => Evaluation::Scored { report },
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Evaluation degraded");
                if let EvaluationError::Parse(parse) = &e {
                    debug!(raw_response = parse.raw_response(), "Unparseable score response");
                }
                Evaluation::degraded(e.to_string())
            }
        }
    }

    /// Score a requirement, surfacing every failure
    pub async fn try_evaluate(&self, requirement: &str) -> Result<ScoreReport, EvaluationError> {
        let message =
            RequirementPrompts::build_evaluation_message(requirement, self.provider.kind());

        debug!(
            provider = self.provider.name(),
            requirement_len = requirement.len(),
            "Running requirement evaluation"
        );

        let response = self.provider.generate(self.scoring_prompt, &message).await?;
        let report = ScoreReport::aggregate(parse_scores(&response)?);

        info!(
            provider = self.provider.name(),
            total = report.total,
            percentage = report.percentage,
            rules = report.scores.len(),
            "Evaluation completed"
        );
        Ok(report)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ScoreParseError),
}
