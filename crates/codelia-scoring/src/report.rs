use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::{CATEGORIES, MAX_TOTAL_SCORE, RULE_IDS};

/// Score for a single rule, keyed by rule code in [`ScoreReport::scores`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleScore {
    /// 0 to 5
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: u32,
    pub max: u32,
    pub rule_ids: Vec<String>,
}

/// Aggregated score of one requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub total: u32,
    pub max: u32,
    /// `total / max * 100`, one decimal
    pub percentage: f64,
    pub scores: BTreeMap<String, RuleScore>,
    pub categories: BTreeMap<String, CategoryScore>,
}

impl ScoreReport {
    /// Aggregate per-rule scores into totals and category subtotals.
    ///
    /// Only the 63 canonical rules count toward the total; a rule the model
    /// did not return counts as 0. Category subtotals sum whatever members
    /// are present.
    pub fn aggregate(scores: BTreeMap<String, RuleScore>) -> Self {
        let total = RULE_IDS
            .iter()
            .filter_map(|id| scores.get(*id))
            .map(|s| s.score)
            .sum::<u32>();

        let categories = CATEGORIES
            .iter()
            .map(|category| {
                let score = category
                    .rules
                    .iter()
                    .filter_map(|id| scores.get(*id))
                    .map(|s| s.score)
                    .sum();
                (
                    category.name.to_string(),
                    CategoryScore {
                        score,
                        max: category.max_score(),
                        rule_ids: category.rules.iter().map(|r| r.to_string()).collect(),
                    },
                )
            })
            .collect();

        Self {
            total,
            max: MAX_TOTAL_SCORE,
            percentage: percentage_of(total),
            scores,
            categories,
        }
    }

    /// The report used when scoring failed: nothing scored, no categories
    pub fn zero() -> Self {
        Self {
            total: 0,
            max: MAX_TOTAL_SCORE,
            percentage: 0.0,
            scores: BTreeMap::new(),
            categories: BTreeMap::new(),
        }
    }

    /// Score of a rule, 0 when the model did not return it
    pub fn score_of(&self, rule_id: &str) -> u32 {
        self.scores.get(rule_id).map(|s| s.score).unwrap_or(0)
    }

    pub fn has_scores(&self) -> bool {
        !self.scores.is_empty()
    }
}

/// `total / max * 100` to one decimal, exact halves rounded to even
/// (`1.25` -> `1.2`, `3.75` -> `3.8`).
fn percentage_of(total: u32) -> f64 {
    // Work in tenths of a percent so the half test is exact.
    let numerator = u64::from(total) * 1000;
    let denominator = u64::from(MAX_TOTAL_SCORE);
    let mut tenths = numerator / denominator;
    let remainder = numerator % denominator;

    if remainder * 2 > denominator || (remainder * 2 == denominator && tenths % 2 == 1) {
        tenths += 1;
    }
    tenths as f64 / 10.0
}

/// Outcome of scoring a requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Evaluation {
    /// The model answered and its output parsed
    Scored {
        #[serde(flatten)]
        report: ScoreReport,
    },
    /// The call or the parse failed; the report is all zeros
    Degraded {
        #[serde(flatten)]
        report: ScoreReport,
        reason: String,
    },
}

impl Evaluation {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Evaluation::Degraded {
            report: ScoreReport::zero(),
            reason: reason.into(),
        }
    }

    pub fn report(&self) -> &ScoreReport {
        match self {
            Evaluation::Scored { report } | Evaluation::Degraded { report, .. } => report,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Evaluation::Degraded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(entries: &[(&str, u32)]) -> BTreeMap<String, RuleScore> {
        entries
            .iter()
            .map(|(id, score)| {
                (
                    id.to_string(),
                    RuleScore {
                        score: *score,
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_scores() {
        let report = ScoreReport::aggregate(BTreeMap::new());
        assert_eq!(report.total, 0);
        assert_eq!(report.max, 320);
        assert_eq!(report.percentage, 0.0);
        assert_eq!(report.categories.len(), 17);
        assert!(report.categories.values().all(|c| c.score == 0));
    }

    #[test]
    fn test_total_and_percentage() {
        let report = ScoreReport::aggregate(scored(&[("P1", 5), ("R42", 3)]));
        assert_eq!(report.total, 8);
        assert_eq!(report.percentage, 2.5);
        assert_eq!(report.categories["Pattern Rules (P1-P7)"].score, 5);
        assert_eq!(report.categories["Pattern Rules (P1-P7)"].max, 35);
        assert_eq!(report.categories["Modularity"].score, 3);
    }

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        // 1 / 320 = 0.3125%
        let report = ScoreReport::aggregate(scored(&[("C1", 1)]));
        assert_eq!(report.percentage, 0.3);

        let all: Vec<(&str, u32)> = RULE_IDS.iter().map(|id| (*id, 5)).collect();
        let full = ScoreReport::aggregate(scored(&all));
        assert_eq!(full.total, 315);
        assert_eq!(full.max, 320);
        assert_eq!(full.percentage, 98.4);
    }

    #[test]
    fn test_percentage_halves_round_to_even() {
        // 4 / 320 = 1.25%
        let report = ScoreReport::aggregate(scored(&[("P1", 4)]));
        assert_eq!(report.percentage, 1.2);

        // 12 / 320 = 3.75%
        let report = ScoreReport::aggregate(scored(&[("P1", 5), ("P2", 5), ("P3", 2)]));
        assert_eq!(report.total, 12);
        assert_eq!(report.percentage, 3.8);

        // 20 / 320 = 6.25%
        let twenty: Vec<(&str, u32)> = RULE_IDS[..4].iter().map(|id| (*id, 5)).collect();
        assert_eq!(ScoreReport::aggregate(scored(&twenty)).percentage, 6.2);
    }

    #[test]
    fn test_r36_counts_for_category_only() {
        let report = ScoreReport::aggregate(scored(&[("R36", 4), ("R37", 1)]));
        assert_eq!(report.total, 1);
        assert_eq!(report.categories["Uniformity of Language"].score, 5);
        assert_eq!(report.categories["Uniformity of Language"].max, 25);
    }

    #[test]
    fn test_categories_are_additive_and_order_independent() {
        let forward = ScoreReport::aggregate(scored(&[("R1", 2), ("R9", 3), ("C10", 4)]));
        let reverse = ScoreReport::aggregate(scored(&[("C10", 4), ("R9", 3), ("R1", 2)]));
        assert_eq!(forward, reverse);

        let category_sum: u32 = forward.categories.values().map(|c| c.score).sum();
        assert_eq!(category_sum, forward.total);
        assert_eq!(forward.categories["Accuracy"].score, 5);
    }

    #[test]
    fn test_degraded_serialization() {
        let evaluation = Evaluation::degraded("Claude API call failed: timeout");
        let value = serde_json::to_value(&evaluation).unwrap();

        assert_eq!(value["status"], "degraded");
        assert_eq!(value["total"], 0);
        assert_eq!(value["max"], 320);
        assert_eq!(value["reason"], "Claude API call failed: timeout");
        assert!(value["categories"].as_object().unwrap().is_empty());

        let back: Evaluation = serde_json::from_value(value).unwrap();
        assert!(back.is_degraded());
    }

    #[test]
    fn test_scored_serialization_is_flat() {
        let evaluation = Evaluation::Scored {
            report: ScoreReport::aggregate(scored(&[("P2", 3)])),
        };
        let value = serde_json::to_value(&evaluation).unwrap();
        assert_eq!(value["status"], "scored");
        assert_eq!(value["scores"]["P2"]["score"], 3);
        assert!(value.get("reason").is_none());
    }
}
