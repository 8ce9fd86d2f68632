use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const UNIQUENESS_MESSAGE_KEY: &str = "evaluator.uniqueness";
pub const REFERENTIAL_INTEGRITY_MESSAGE_KEY: &str = "evaluator.referential_integrity";
pub const INCOMPLETE_MESSAGE_KEY: &str = "evaluator.incomplete";
pub const FAILURE_MESSAGE_KEY: &str = "evaluator.failure";

/// Default templates used when no catalog override is supplied.
pub static DEFAULT_CATALOG: Lazy<MessageCatalog> = Lazy::new(MessageCatalog::default);

/// Explicit catalog of finding message templates.
///
/// Templates use `{0}`-style indexed placeholders. Evaluators hold a
/// reference to a catalog instead of consulting any global lookup, so a
/// driver can swap wording per run.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    templates: HashMap<&'static str, String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let mut templates = HashMap::new();
        templates.insert(UNIQUENESS_MESSAGE_KEY, "{0} is not unique for {1}".to_string());
        templates.insert(
            REFERENTIAL_INTEGRITY_MESSAGE_KEY,
            "{0} was not found in {1}".to_string(),
        );
        templates.insert(
            INCOMPLETE_MESSAGE_KEY,
            "results for {0} may be incomplete, some recorded values were lost".to_string(),
        );
        templates.insert(FAILURE_MESSAGE_KEY, "evaluation of {0} failed: {1}".to_string());
        Self { templates }
    }
}

impl MessageCatalog {
    pub fn with_template(mut self, key: &'static str, template: impl Into<String>) -> Self {
        self.templates.insert(key, template.into());
        self
    }

    /// Formats the template registered under `key`, substituting `{i}` with
    /// `args[i]`. An unknown key falls back to the key followed by the
    /// arguments, so a missing template never hides a finding.
    pub fn format(&self, key: &str, args: &[&str]) -> String {
        match self.templates.get(key) {
            Some(template) => {
                let mut message = template.clone();
                for (index, arg) in args.iter().enumerate() {
                    message = message.replace(&format!("{{{}}}", index), arg);
                }
                message
            }
            None => {
                let mut message = key.to_string();
                for arg in args {
                    message.push(' ');
                    message.push_str(arg);
                }
                message
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uniqueness_template() {
        let message = DEFAULT_CATALOG.format(UNIQUENESS_MESSAGE_KEY, &["t-1", "taxonID"]);
        assert_eq!(message, "t-1 is not unique for taxonID");
    }

    #[test]
    fn test_default_referential_template() {
        let message = DEFAULT_CATALOG.format(REFERENTIAL_INTEGRITY_MESSAGE_KEY, &["4", "taxonID"]);
        assert_eq!(message, "4 was not found in taxonID");
    }

    #[test]
    fn test_override_template() {
        let catalog =
            MessageCatalog::default().with_template(UNIQUENESS_MESSAGE_KEY, "duplicate {0} ({1})");
        assert_eq!(
            catalog.format(UNIQUENESS_MESSAGE_KEY, &["x", "taxonID"]),
            "duplicate x (taxonID)"
        );
    }

    #[test]
    fn test_unknown_key_falls_back() {
        let message = DEFAULT_CATALOG.format("evaluator.unknown", &["a", "b"]);
        assert_eq!(message, "evaluator.unknown a b");
    }
}
