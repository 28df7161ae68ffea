//! # codelia-scoring
//!
//! Turns model output into requirement scores.
//!
//! - [`parse_scores`] - tolerant extraction of the score document
//! - [`ScoreReport`] - totals and category subtotals over the fixed rule set
//! - [`compare`] / [`top_improvements`] - what changed after a rewrite
//! - [`RequirementEvaluator`] / [`RequirementImprover`] - provider-backed scoring and rewriting

mod compare;
pub mod evaluator;
mod improver;
pub mod parser;
mod prompts;
mod report;
pub mod rules;

pub use compare::{
    compare, top_improvements, ComparisonReport, Explanation, RuleChange, TOP_IMPROVEMENTS,
};
pub use evaluator::{EvaluationError, RequirementEvaluator};
pub use improver::{ImprovedRequirement, RequirementImprover};
pub use parser::{parse_scores, ScoreParseError};
pub use prompts::{PatternData, ProjectContext, RequirementPrompts, DEFAULT_PATTERN};
pub use report::{CategoryScore, Evaluation, RuleScore, ScoreReport};
pub use rules::{category, Category, CATEGORIES, MAX_RULE_SCORE, MAX_TOTAL_SCORE, RULE_COUNT, RULE_IDS};
