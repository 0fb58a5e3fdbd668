//! Page identity rules.
//!
//! Page names are inferred by matching keywords against an identity signature
//! built from visible labels. The rules are an ordered table: the first rule
//! whose predicate holds names the page. Names are heuristic labels, not unique
//! keys; screens that share keywords collapse into the same page.

use serde::{Deserialize, Serialize};

/// Name used when no rule matches
pub const UNKNOWN_PAGE: &str = "Unknown";

/// Predicate over an identity signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePredicate {
    /// Signature contains any of these substrings (case-sensitive)
    ContainsAny(Vec<String>),
    /// Signature contains every one of these substrings (case-sensitive)
    ContainsAll(Vec<String>),
}

impl PagePredicate {
    /// Single-keyword predicate
    #[must_use]
    pub fn contains(keyword: &str) -> Self {
        Self::ContainsAny(vec![keyword.to_string()])
    }

    /// Any-of predicate
    #[must_use]
    pub fn any_of(keywords: &[&str]) -> Self {
        Self::ContainsAny(keywords.iter().map(|k| (*k).to_string()).collect())
    }

    /// Evaluate against a signature
    #[must_use]
    pub fn matches(&self, signature: &str) -> bool {
        match self {
            Self::ContainsAny(words) => words.iter().any(|w| signature.contains(w.as_str())),
            Self::ContainsAll(words) => {
                !words.is_empty() && words.iter().all(|w| signature.contains(w.as_str()))
            }
        }
    }
}

/// One `(predicate, label)` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRule {
    /// When to apply
    pub predicate: PagePredicate,
    /// Page name to assign
    pub label: String,
}

impl PageRule {
    /// Create a rule
    #[must_use]
    pub fn new(predicate: PagePredicate, label: impl Into<String>) -> Self {
        Self {
            predicate,
            label: label.into(),
        }
    }
}

/// Ordered rule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRules {
    rules: Vec<PageRule>,
    fallback: String,
}

impl Default for PageRules {
    fn default() -> Self {
        Self::new(vec![
            PageRule::new(PagePredicate::contains("Login"), "Login Page"),
            PageRule::new(
                PagePredicate::contains("Change Environment"),
                "Login/Environment Page",
            ),
            PageRule::new(
                PagePredicate::any_of(&["staging", "dev8", "prod"]),
                "Environment Selection",
            ),
            PageRule::new(PagePredicate::any_of(&["Email", "Password"]), "Auth Form"),
            PageRule::new(PagePredicate::any_of(&["Home", "Dashboard"]), "Home"),
        ])
    }
}

impl PageRules {
    /// Table with the default fallback name
    #[must_use]
    pub fn new(rules: Vec<PageRule>) -> Self {
        Self {
            rules,
            fallback: UNKNOWN_PAGE.to_string(),
        }
    }

    /// Put a rule ahead of all existing ones
    #[must_use]
    pub fn with_priority_rule(mut self, rule: PageRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Rules in evaluation order
    #[must_use]
    pub fn rules(&self) -> &[PageRule] {
        &self.rules
    }

    /// Join the first `limit` non-empty labels into an identity signature
    #[must_use]
    pub fn identity_signature<I, S>(labels: I, limit: usize) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .take(limit)
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Name for a signature
    #[must_use]
    pub fn infer(&self, signature: &str) -> String {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(signature))
            .map_or_else(|| self.fallback.clone(), |rule| rule.label.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let rules = PageRules::default();
        assert_eq!(rules.infer("Login|Email|Password"), "Login Page");
        assert_eq!(rules.infer("Change Environment|staging"), "Login/Environment Page");
        assert_eq!(rules.infer("staging|prod"), "Environment Selection");
        assert_eq!(rules.infer("Email|Password"), "Auth Form");
        assert_eq!(rules.infer("Home|Feed"), "Home");
        assert_eq!(rules.infer("Dashboard"), "Home");
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(PageRules::default().infer("Search|Settings"), UNKNOWN_PAGE);
        assert_eq!(PageRules::default().infer(""), UNKNOWN_PAGE);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(PageRules::default().infer("login"), UNKNOWN_PAGE);
    }

    #[test]
    fn test_priority_rule_wins() {
        let rules = PageRules::default()
            .with_priority_rule(PageRule::new(PagePredicate::contains("Search"), "Search"));
        assert_eq!(rules.infer("Search|Home"), "Search");
    }

    #[test]
    fn test_contains_all() {
        let p = PagePredicate::ContainsAll(vec!["a".into(), "b".into()]);
        assert!(p.matches("a|b"));
        assert!(!p.matches("a"));
        assert!(!PagePredicate::ContainsAll(vec![]).matches("anything"));
    }

    #[test]
    fn test_identity_signature_limit_and_trim() {
        let labels: Vec<String> = (0..12).map(|i| format!(" l{i} ")).collect();
        let sig = PageRules::identity_signature(&labels, 10);
        assert_eq!(sig.split('|').count(), 10);
        assert!(sig.starts_with("l0|l1"));
        assert_eq!(PageRules::identity_signature(["", "  ", "x"], 10), "x");
    }
}
