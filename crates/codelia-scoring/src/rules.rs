//! The fixed rule set requirements are scored against.

/// Highest score a single rule can receive
pub const MAX_RULE_SCORE: u32 = 5;

/// Maximum total score reported with every evaluation.
///
/// Fixed at 320 although only 63 rules count toward the total, so a perfect
/// report reaches 315 (98.4%).
pub const MAX_TOTAL_SCORE: u32 = 320;

/// Number of canonical rule codes
pub const RULE_COUNT: usize = 63;

/// The canonical rule codes used for totals and comparisons.
///
/// R36 is not part of this list even though the "Uniformity of Language"
/// category names it.
pub static RULE_IDS: [&str; RULE_COUNT] = [
    // Pattern rules
    "P1", "P2", "P3", "P4", "P5", "P6", "P7",
    // Characteristics of individual requirements
    "C1", "C2", "C3", "C4", "C5", "C6", "C7", "C8", "C9",
    // Characteristics of requirement sets
    "C10", "C11", "C12", "C13", "C14", "C15",
    // Writing rules
    "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9",
    "R10", "R11",
    "R12", "R13", "R14", "R15", "R16", "R17",
    "R18", "R19", "R20", "R21", "R22", "R23",
    "R24", "R25",
    "R26",
    "R27", "R28",
    "R29", "R30",
    "R31",
    "R32",
    "R33",
    "R34", "R35",
    "R37", "R38", "R39", "R40",
    "R41", "R42",
];

/// A named group of rules scored together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub rules: &'static [&'static str],
}

impl Category {
    pub fn max_score(&self) -> u32 {
        self.rules.len() as u32 * MAX_RULE_SCORE
    }
}

/// The 17 reporting categories, in display order
pub static CATEGORIES: [Category; 17] = [
    Category {
        name: "Pattern Rules (P1-P7)",
        rules: &["P1", "P2", "P3", "P4", "P5", "P6", "P7"],
    },
    Category {
        name: "Individual Characteristics (C1-C9)",
        rules: &["C1", "C2", "C3", "C4", "C5", "C6", "C7", "C8", "C9"],
    },
    Category {
        name: "Set Characteristics (C10-C15)",
        rules: &["C10", "C11", "C12", "C13", "C14", "C15"],
    },
    Category {
        name: "Accuracy",
        rules: &["R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9"],
    },
    Category {
        name: "Concision",
        rules: &["R10", "R11"],
    },
    Category {
        name: "Non-Ambiguity",
        rules: &["R12", "R13", "R14", "R15", "R16", "R17"],
    },
    Category {
        name: "Singularity",
        rules: &["R18", "R19", "R20", "R21", "R22", "R23"],
    },
    Category {
        name: "Completeness",
        rules: &["R24", "R25"],
    },
    Category {
        name: "Realism",
        rules: &["R26"],
    },
    Category {
        name: "Conditions",
        rules: &["R27", "R28"],
    },
    Category {
        name: "Uniqueness",
        rules: &["R29", "R30"],
    },
    Category {
        name: "Abstraction",
        rules: &["R31"],
    },
    Category {
        name: "Quantification (R32)",
        rules: &["R32"],
    },
    Category {
        name: "Tolerance",
        rules: &["R33"],
    },
    Category {
        name: "Quantification (R34-R35)",
        rules: &["R34", "R35"],
    },
    Category {
        name: "Uniformity of Language",
        rules: &["R36", "R37", "R38", "R39", "R40"],
    },
    Category {
        name: "Modularity",
        rules: &["R41", "R42"],
    },
];

/// Look up a category by name
pub fn category(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Whether `id` is one of the canonical rule codes
pub fn is_canonical_rule(id: &str) -> bool {
    RULE_IDS.contains(&id)
}

/// Whether `id` looks like a rule code (`P`, `C` or `R` followed by digits)
pub fn is_rule_code(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some('P' | 'C' | 'R'))
        && !chars.as_str().is_empty()
        && chars.all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rule_ids_are_unique_and_skip_r36() {
        let unique: HashSet<_> = RULE_IDS.iter().collect();
        assert_eq!(unique.len(), RULE_COUNT);
        assert_eq!(RULE_COUNT, 63);
        assert!(!is_canonical_rule("R36"));
        assert!(is_canonical_rule("R35") && is_canonical_rule("R37"));
        assert_eq!(RULE_IDS.len() as u32 * MAX_RULE_SCORE, 315);
    }

    #[test]
    fn test_categories_cover_every_canonical_rule() {
        let covered: HashSet<&str> = CATEGORIES
            .iter()
            .flat_map(|c| c.rules.iter().copied())
            .collect();
        for rule in RULE_IDS {
            assert!(covered.contains(rule), "{} is not in any category", rule);
        }
        // The only non-canonical member is R36.
        let extra: Vec<_> = covered.iter().filter(|r| !is_canonical_rule(r)).collect();
        assert_eq!(extra, vec![&"R36"]);
    }

    #[test]
    fn test_category_max_scores() {
        assert_eq!(category("Accuracy").unwrap().max_score(), 45);
        assert_eq!(category("Uniformity of Language").unwrap().max_score(), 25);
        assert!(category("Unknown").is_none());
    }

    #[test]
    fn test_rule_code_shape() {
        assert!(is_rule_code("P1"));
        assert!(is_rule_code("R36"));
        assert!(!is_rule_code("R"));
        assert!(!is_rule_code("total"));
        assert!(!is_rule_code("X1"));
        assert!(!is_rule_code("R3a"));
    }
}
