use std::collections::BTreeMap;

use codelia_llm::ProviderKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pattern used when the caller does not name one
pub const DEFAULT_PATTERN: &str = "ubiquitous";

/// Requirement-writing pattern and the fields filled in for it.
///
/// Deserializes from a flat object such as
/// `{"pattern": "event-driven", "trigger": "...", "system_response": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl PatternData {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), Value::String(value.into()));
        self
    }

    pub fn pattern(&self) -> &str {
        self.pattern
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PATTERN)
    }

    /// Non-blank fields as `(label, value)` pairs, labels title-cased
    pub fn labeled_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.trim().to_string(),
                    Value::Null | Value::Bool(false) => String::new(),
                    other => other.to_string(),
                };
                (!text.is_empty()).then(|| (field_label(key), text))
            })
            .collect()
    }
}

/// `system_response` -> `System Response`
fn field_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len());
    let mut boundary = true;
    for c in key.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if boundary {
                label.extend(c.to_uppercase());
            } else {
                label.extend(c.to_lowercase());
            }
            boundary = false;
        } else {
            label.push(c);
            boundary = true;
        }
    }
    label
}

/// Who builds the system, what it is, and for whom
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub client: String,
}

impl ProjectContext {
    pub fn new(
        developer: impl Into<String>,
        system: impl Into<String>,
        client: impl Into<String>,
    ) -> Self {
        Self {
            developer: developer.into(),
            system: system.into(),
            client: client.into(),
        }
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

/// Prompt text sent alongside the system prompts
pub struct RequirementPrompts;

impl RequirementPrompts {
    /// User message asking for a score document
    pub fn build_evaluation_message(requirement: &str, provider: ProviderKind) -> String {
        let mut message = format!(
            "Requirement to Evaluate:\n{}\n\nPlease evaluate this requirement and provide the score in JSON format as specified.",
            requirement
        );
        // Gemini tends to wrap the JSON in commentary without this.
        if provider == ProviderKind::Gemini {
            message.push_str("\n\nIMPORTANT: Output ONLY valid JSON.");
        }
        message
    }

    /// User message asking for a rewrite that follows the pattern
    pub fn build_improvement_message(requirement: &str, pattern: &PatternData) -> String {
        let mut context = format!("Pattern Type: {}\n\n", pattern.pattern());
        for (label, value) in pattern.labeled_fields() {
            context.push_str(&format!("{}: {}\n", label, value));
        }

        format!(
            r#"
Original Requirement: {requirement}

{context}

Please improve this requirement based on the INCOSE rules provided in the system prompt.
Use the pattern information above to structure the improved requirement appropriately.
If any pattern fields are missing, do not include them in the improved requirement.
"#
        )
    }

    /// Fill the project placeholders of the rewrite system prompt.
    ///
    /// `{PROJECT_CONTEXT}` becomes a bullet list of whatever was configured;
    /// `{Developer}`, `{System}` and `{Client}` fall back to generic nouns.
    pub fn render_quality_prompt(template: &str, project: &ProjectContext) -> String {
        let bullets = format!(
            "\n- **Developer**: {}\n- **Target System**: {}\n- **Client**: {}\n",
            project.developer.trim(),
            project.system.trim(),
            project.client.trim()
        );

        template
            .replace("{PROJECT_CONTEXT}", &bullets)
            .replace("{Developer}", or_default(&project.developer, "Supplier"))
            .replace("{System}", or_default(&project.system, "System"))
            .replace("{Client}", or_default(&project.client, "Client"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_message() {
        let message = RequirementPrompts::build_evaluation_message(
            "The pump shall stop.",
            ProviderKind::OpenAi,
        );
        assert!(message.starts_with("Requirement to Evaluate:\nThe pump shall stop.\n\n"));
        assert!(!message.contains("IMPORTANT"));

        let gemini = RequirementPrompts::build_evaluation_message(
            "The pump shall stop.",
            ProviderKind::Gemini,
        );
        assert!(gemini.ends_with("IMPORTANT: Output ONLY valid JSON."));
    }

    #[test]
    fn test_improvement_message_lists_non_blank_fields() {
        let pattern = PatternData::new("event-driven")
            .with_field("trigger", "the door opens")
            .with_field("system_response", "sound an alarm")
            .with_field("precondition", "  ");

        let message = RequirementPrompts::build_improvement_message("Alarm on door", &pattern);
        assert!(message.contains("Original Requirement: Alarm on door\n\n"));
        assert!(message.contains(
            "Pattern Type: event-driven\n\nSystem Response: sound an alarm\nTrigger: the door opens\n"
        ));
        assert!(!message.contains("Precondition"));
        assert!(message.contains("If any pattern fields are missing"));
    }

    #[test]
    fn test_pattern_defaults_to_ubiquitous() {
        let message =
            RequirementPrompts::build_improvement_message("x", &PatternData::default());
        assert!(message.contains("Pattern Type: ubiquitous\n"));
    }

    #[test]
    fn test_pattern_data_from_flat_json() {
        let pattern: PatternData = serde_json::from_str(
            r#"{"pattern": "state-driven", "condition": "in standby", "optional_feature": null}"#,
        )
        .unwrap();
        assert_eq!(pattern.pattern(), "state-driven");
        assert_eq!(
            pattern.labeled_fields(),
            vec![("Condition".to_string(), "in standby".to_string())]
        );
    }

    #[test]
    fn test_field_label() {
        assert_eq!(field_label("system_response"), "System Response");
        assert_eq!(field_label("forbidden_action"), "Forbidden Action");
        assert_eq!(field_label("TRIGGER"), "Trigger");
    }

    #[test]
    fn test_render_quality_prompt() {
        let template = "Context:{PROJECT_CONTEXT}The {Developer} builds the {System} for {Client}.";
        let project = ProjectContext::new("ACME", "Braking Controller", "");

        let rendered = RequirementPrompts::render_quality_prompt(template, &project);
        assert_eq!(
            rendered,
            "Context:\n- **Developer**: ACME\n- **Target System**: Braking Controller\n- **Client**: \nThe ACME builds the Braking Controller for Client."
        );
    }

    #[test]
    fn test_render_quality_prompt_defaults() {
        let rendered = RequirementPrompts::render_quality_prompt(
            "{Developer}/{System}/{Client}",
            &ProjectContext::default(),
        );
        assert_eq!(rendered, "Supplier/System/Client");
    }
}
