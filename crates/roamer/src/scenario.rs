//! Cucumber feature generation from recorded coverage.
//!
//! The generator only reads the session. Output is plain Gherkin text; one
//! feature per page, with optional gap-driven scenarios appended.

use crate::coverage::{CoverageSession, GapReport, PageRecord};
use std::collections::HashSet;

/// Text returned when the requested page has no record
pub const NO_PAGE_DATA: &str = "No page data available for feature generation";

/// Divider placed after each page when generating for all pages
pub const DIVIDER_WIDTH: usize = 50;

/// Placeholder target for interactions that addressed no element
pub const DEFAULT_TARGET: &str = "element";

/// Which pages to generate features for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureTarget {
    /// The most recently visited page
    Current,
    /// A page by name
    Page(String),
    /// Every page, in record order
    All,
}

impl FeatureTarget {
    /// `None` is the current page, `"all"` every page, anything else a name
    #[must_use]
    pub fn from_arg(name: Option<&str>) -> Self {
        match name {
            None => Self::Current,
            Some("all") => Self::All,
            Some(name) => Self::Page(name.to_string()),
        }
    }
}

/// `long_press` → `Long Press`
#[must_use]
pub fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds Gherkin features from a coverage session
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioGenerator;

impl ScenarioGenerator {
    /// Create a generator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generate feature text
    #[must_use]
    pub fn generate(
        &self,
        session: &CoverageSession,
        target: &FeatureTarget,
        include_gaps: bool,
    ) -> String {
        let page = match target {
            FeatureTarget::All => return self.all_pages(session, include_gaps),
            FeatureTarget::Current => session.current_page(),
            FeatureTarget::Page(name) => session.page(name),
        };
        page.map_or_else(
            || NO_PAGE_DATA.to_string(),
            |page| self.page_feature(page, include_gaps),
        )
    }

    fn all_pages(&self, session: &CoverageSession, include_gaps: bool) -> String {
        let mut out = String::new();
        for page in session.pages() {
            out.push_str(&self.page_feature(page, include_gaps));
            out.push('\n');
            out.push_str(&"=".repeat(DIVIDER_WIDTH));
            out.push_str("\n\n");
        }
        out
    }

    /// Feature text for one page
    #[must_use]
    pub fn page_feature(&self, page: &PageRecord, include_gaps: bool) -> String {
        let name = &page.name;
        let mut feature = format!(
            "Feature: {name} Testing\n\
             \x20 As a user\n\
             \x20 I want to interact with the {name}\n\
             \x20 So that I can complete my tasks successfully\n\
             \n\
             \x20 Background:\n\
             \x20   Given I am on the \"{name}\"\n\
             \n"
        );
        feature.push_str(&element_validation(page));
        feature.push_str(&interaction_scenarios(page));
        if include_gaps {
            feature.push_str(&gap_scenarios(&GapReport::for_page(page), name));
        }
        feature
    }
}

fn element_validation(page: &PageRecord) -> String {
    let mut out = String::from(
        "  Scenario: Page Elements Validation\n    Then I should see all required elements on the page\n",
    );
    for tracked in page.elements().iter().filter(|e| e.element.is_clickable) {
        if let Some(key) = tracked.element.display_key() {
            out.push_str(&format!("    And I should see \"{key}\" element\n"));
        }
    }
    out.push_str("    And all interactive elements should be clickable\n\n");
    out
}

fn interaction_scenarios(page: &PageRecord) -> String {
    let mut seen = HashSet::new();
    let mut out = String::new();
    for event in page.interactions() {
        let key = event.kind.as_str();
        if !seen.insert(key) {
            continue;
        }
        let target = event.target.as_deref().unwrap_or(DEFAULT_TARGET);
        out.push_str(&format!(
            "  Scenario: {}\n    When I {} \"{target}\"\n    Then the action should complete successfully\n    And I should see appropriate feedback\n\n",
            title_case(key),
            key.to_lowercase(),
        ));
    }
    out
}

fn gap_scenarios(gaps: &GapReport, page_name: &str) -> String {
    let mut out = String::from("  # Gap-based scenarios for improved coverage\n\n");

    if !gaps.untested_elements.is_empty() {
        out.push_str(&format!(
            "  Scenario: Test Untested Elements\n    Given I am on the \"{page_name}\"\n"
        ));
        for gap in &gaps.untested_elements {
            out.push_str(&format!(
                "    When I interact with \"{}\"\n    Then the element should respond appropriately\n",
                gap.element
            ));
        }
        out.push('\n');
    }

    if !gaps.missing_validations.is_empty() {
        out.push_str(&format!(
            "  Scenario Outline: Input Field Validation\n\
             \x20   Given I am on the \"{page_name}\"\n\
             \x20   When I enter \"<input_value>\" in \"<field_name>\"\n\
             \x20   And I submit the form\n\
             \x20   Then I should see \"<expected_result>\"\n\
             \n\
             \x20   Examples:\n\
             \x20     | field_name | input_value | expected_result |\n"
        ));
        for validation in &gaps.missing_validations {
            let field = &validation.element;
            out.push_str(&format!("      | {field} | \"\" | validation error |\n"));
            out.push_str(&format!("      | {field} | invalid_format | format error |\n"));
            out.push_str(&format!(
                "      | {field} | <script>alert('xss')</script> | security error |\n"
            ));
        }
        out.push('\n');
    }

    if !gaps.error_scenarios.is_empty() {
        out.push_str(&format!(
            "  Scenario: Error Handling\n\
             \x20   Given I am on the \"{page_name}\"\n\
             \x20   When a network error occurs\n\
             \x20   Then I should see appropriate error message\n\
             \x20   And I should be able to retry the action\n\
             \n\
             \x20 Scenario: Offline Behavior\n\
             \x20   Given I am on the \"{page_name}\"\n\
             \x20   When the device goes offline\n\
             \x20   Then the page should handle offline state gracefully\n\
             \x20   And data should be preserved when connection returns\n\
             \n"
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{InteractionKind, Outcome};
    use crate::screen::{RenderContext, ScreenElement, Snapshot};

    fn snapshot(elements: Vec<ScreenElement>) -> Snapshot {
        Snapshot {
            context: RenderContext::Native,
            available_contexts: Vec::new(),
            current_page: String::new(),
            page_signature: String::new(),
            clickable_count: 0,
            auth_detected: false,
            suggestions: Vec::new(),
            elements,
            source_excerpt: None,
        }
    }

    fn home_session() -> CoverageSession {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![
            ScreenElement::new("Home").clickable(),
            ScreenElement::new("Query").with_tag_kind("android.widget.EditText"),
            ScreenElement::new("Banner"),
        ]));
        session
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("long_press"), "Long Press");
        assert_eq!(title_case("tap"), "Tap");
        assert_eq!(title_case("open menu"), "Open menu");
    }

    #[test]
    fn test_feature_target_from_arg() {
        assert_eq!(FeatureTarget::from_arg(None), FeatureTarget::Current);
        assert_eq!(FeatureTarget::from_arg(Some("all")), FeatureTarget::All);
        assert_eq!(
            FeatureTarget::from_arg(Some("Home")),
            FeatureTarget::Page("Home".into())
        );
    }

    #[test]
    fn test_missing_page() {
        let session = CoverageSession::new();
        let generator = ScenarioGenerator::new();
        assert_eq!(
            generator.generate(&session, &FeatureTarget::Current, true),
            NO_PAGE_DATA
        );
        assert_eq!(
            generator.generate(&session, &FeatureTarget::Page("Home".into()), true),
            NO_PAGE_DATA
        );
    }

    #[test]
    fn test_header_and_element_validation() {
        let text = ScenarioGenerator::new().generate(
            &home_session(),
            &FeatureTarget::Page("Home".into()),
            false,
        );
        assert!(text.starts_with("Feature: Home Testing\n  As a user\n"));
        assert!(text.contains("  Background:\n    Given I am on the \"Home\"\n"));
        assert!(text.contains("  Scenario: Page Elements Validation\n"));
        assert!(text.contains("    And I should see \"Home\" element\n"));
        assert!(!text.contains("\"Banner\" element"));
    }

    #[test]
    fn test_interactions_deduplicated_by_kind() {
        let mut session = home_session();
        session.track_interaction(InteractionKind::Tap, Some("Home"), Outcome::Success);
        session.track_interaction(InteractionKind::Tap, Some("Banner"), Outcome::Success);
        session.track_interaction(InteractionKind::LongPress, None, Outcome::Success);
        let text = ScenarioGenerator::new().generate(&session, &FeatureTarget::Current, false);

        assert_eq!(text.matches("  Scenario: Tap\n").count(), 1);
        assert!(text.contains("    When I tap \"Home\"\n"));
        assert!(!text.contains("When I tap \"Banner\""));
        assert!(text.contains("  Scenario: Long Press\n    When I long_press \"element\"\n"));
    }

    #[test]
    fn test_gaps_excluded_when_not_requested() {
        let text =
            ScenarioGenerator::new().generate(&home_session(), &FeatureTarget::Current, false);
        assert!(!text.contains("Gap-based scenarios"));
        assert!(!text.contains("Scenario Outline: Input Field Validation"));
        assert!(!text.contains("Scenario: Error Handling"));
        assert!(!text.contains("Scenario: Offline Behavior"));
    }

    #[test]
    fn test_gap_scenarios_included() {
        let text =
            ScenarioGenerator::new().generate(&home_session(), &FeatureTarget::Current, true);
        assert!(text.contains("  Scenario: Test Untested Elements\n"));
        assert!(text.contains("    When I interact with \"Banner\"\n"));
        assert!(text.contains("  Scenario Outline: Input Field Validation\n"));
        assert!(text.contains("      | Query | \"\" | validation error |\n"));
        assert!(text.contains("      | Query | invalid_format | format error |\n"));
        assert!(text.contains("      | Query | <script>alert('xss')</script> | security error |\n"));
        assert!(text.contains("  Scenario: Error Handling\n"));
        assert!(text.contains("  Scenario: Offline Behavior\n"));
    }

    #[test]
    fn test_failure_suppresses_error_scenarios() {
        let mut session = home_session();
        session.track_interaction(InteractionKind::Tap, Some("Home"), Outcome::Failure);
        let text = ScenarioGenerator::new().generate(&session, &FeatureTarget::Current, true);
        assert!(!text.contains("Scenario: Error Handling"));
        assert!(text.contains("Scenario: Test Untested Elements"));
    }

    #[test]
    fn test_all_pages_divided() {
        let mut session = home_session();
        session.track_screen(&snapshot(vec![ScreenElement::new("Login").clickable()]));
        let text = ScenarioGenerator::new().generate(&session, &FeatureTarget::All, false);
        let divider = format!("\n{}\n\n", "=".repeat(50));
        assert_eq!(text.matches(&divider).count(), 2);
        let home = text.find("Feature: Home Testing").unwrap();
        let login = text.find("Feature: Login Page Testing").unwrap();
        assert!(home < login);
    }
}
