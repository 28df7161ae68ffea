use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use codelia_llm::{create_provider, LlmProvider};
use codelia_logging::{preview, LogEvent, Logger, ScoreTarget};
use codelia_scoring::{
    compare, top_improvements, ComparisonReport, Evaluation, Explanation, ImprovedRequirement,
    PatternData, ProjectContext, RequirementEvaluator, RequirementImprover, TOP_IMPROVEMENTS,
};

use crate::error::AnalysisError;
use crate::prompts::{PromptId, PromptStore};
use crate::settings::SettingsStore;

/// Everything produced by one improve run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImproveOutcome {
    pub original_scores: Evaluation,
    pub improved_result: ImprovedRequirement,
    pub improved_scores: Evaluation,
    pub comparison: ComparisonReport,
    pub explanations: Vec<Explanation>,
}

fn validated(text: &str) -> Result<&str, AnalysisError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::validation("No text provided"));
    }
    Ok(trimmed)
}

/// Runs evaluate and improve against one provider
pub struct RequirementAnalyzer<'a> {
    provider: &'a dyn LlmProvider,
    scoring_prompt: String,
    quality_template: String,
    project: ProjectContext,
    logger: Arc<Logger>,
}

impl<'a> RequirementAnalyzer<'a> {
    pub fn new(
        provider: &'a dyn LlmProvider,
        scoring_prompt: String,
        quality_template: String,
        project: ProjectContext,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            provider,
            scoring_prompt,
            quality_template,
            project,
            logger,
        }
    }

    /// Score one requirement. Provider and parse failures degrade.
    pub async fn evaluate(&self, text: &str) -> Result<Evaluation, AnalysisError> {
        let text = validated(text)?;
        Ok(self.score(text, ScoreTarget::Original).await)
    }

    /// Score, rewrite, re-score and compare.
    ///
    /// Only a failed rewrite is fatal; scoring failures on either side
    /// degrade to zero reports.
    pub async fn improve(
        &self,
        text: &str,
        pattern: &PatternData,
    ) -> Result<ImproveOutcome, AnalysisError> {
        let text = validated(text)?;
        let started = Instant::now();

        let original_scores = self.score(text, ScoreTarget::Original).await;

        self.logger.log(&LogEvent::RewriteStarted {
            provider: self.provider.name().to_string(),
            pattern: pattern.pattern().to_string(),
        });
        let rewrite_started = Instant::now();
        let improver = RequirementImprover::new(self.provider, &self.quality_template, &self.project);
        let improved_result = improver.improve(text, pattern).await?;
        self.logger.log(&LogEvent::RewriteCompleted {
            improved_preview: preview(&improved_result.improved, 100),
            duration_secs: rewrite_started.elapsed().as_secs_f64(),
        });

        let improved_scores = self
            .score(&improved_result.improved, ScoreTarget::Improved)
            .await;

        let comparison = compare(original_scores.report(), improved_scores.report());
        let explanations = top_improvements(
            original_scores.report(),
            improved_scores.report(),
            TOP_IMPROVEMENTS,
        );

        self.logger.log(&LogEvent::ComparisonCompleted {
            total_improvement: comparison.total_improvement,
            top_rules: explanations.iter().map(|e| e.rule_id.clone()).collect(),
            duration_secs: started.elapsed().as_secs_f64(),
        });

        Ok(ImproveOutcome {
            original_scores,
            improved_result,
            improved_scores,
            comparison,
            explanations,
        })
    }

    async fn score(&self, text: &str, target: ScoreTarget) -> Evaluation {
        self.logger.log(&LogEvent::EvaluationStarted {
            target,
            provider: self.provider.name().to_string(),
            requirement_preview: preview(text, 100),
        });

        let evaluation = RequirementEvaluator::new(self.provider, &self.scoring_prompt)
            .evaluate(text)
            .await;

        match &evaluation {
            Evaluation::Scored { report } => self.logger.log(&LogEvent::EvaluationCompleted {
                target,
                total: report.total,
                max: report.max,
                percentage: report.percentage,
            }),
            Evaluation::Degraded { reason, .. } => {
                self.logger.log(&LogEvent::EvaluationDegraded {
                    target,
                    reason: reason.clone(),
                })
            }
        }
        evaluation
    }
}

/// Entry point used by the CLI and the HTTP API.
///
/// Settings and prompts are reloaded and the provider rebuilt on every call,
/// so edits take effect without a restart.
pub struct AnalysisService {
    settings: SettingsStore,
    prompts: PromptStore,
    logger: Arc<Logger>,
}

impl AnalysisService {
    pub fn new(settings: SettingsStore, prompts: PromptStore, logger: Arc<Logger>) -> Self {
        Self {
            settings,
            prompts,
            logger,
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn prompts(&self) -> &PromptStore {
        &self.prompts
    }

    pub async fn evaluate(&self, text: &str) -> Result<Evaluation, AnalysisError> {
        validated(text)?;
        let (provider, project) = self.load_provider()?;
        let analyzer = self.analyzer(&provider, project)?;
        analyzer.evaluate(text).await
    }

    pub async fn improve(
        &self,
        text: &str,
        pattern: &PatternData,
    ) -> Result<ImproveOutcome, AnalysisError> {
        validated(text)?;
        let (provider, project) = self.load_provider()?;
        let analyzer = self.analyzer(&provider, project)?;
        let outcome = analyzer.improve(text, pattern).await?;

        info!(
            total_improvement = outcome.comparison.total_improvement,
            explanations = outcome.explanations.len(),
            "Improve completed"
        );
        Ok(outcome)
    }

    fn load_provider(&self) -> Result<(codelia_llm::Provider, ProjectContext), AnalysisError> {
        let settings = self.settings.load()?;
        let config = settings.provider_config()?;
        debug!(provider = %config.provider, "Building provider from settings");
        let provider = create_provider(&config)?;
        Ok((provider, settings.project))
    }

    fn analyzer<'p>(
        &self,
        provider: &'p dyn LlmProvider,
        project: ProjectContext,
    ) -> Result<RequirementAnalyzer<'p>, AnalysisError> {
        Ok(RequirementAnalyzer::new(
            provider,
            self.prompts.load(PromptId::Scoring)?,
            self.prompts.load(PromptId::Quality)?,
            project,
            self.logger.clone(),
        ))
    }
}
