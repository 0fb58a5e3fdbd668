//! Gap reports, suggestions and risk assessment derived from page records.
//!
//! Everything here is a pure function of a [`PageRecord`] (or a slice of
//! them); nothing is cached on the record.

use super::page::{percentage, PageRecord};
use super::UserPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Input fields need at least this many recorded scenarios
pub const MIN_INPUT_SCENARIOS: usize = 3;

/// Critical gaps echoed into next actions
pub const NEXT_ACTION_EXAMPLES: usize = 3;

/// Gap priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Blocks confidence in core flows
    High,
    /// Should be covered
    Medium,
    /// Nice to have
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Role an untested element plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementRole {
    /// Clickable
    Interactive,
    /// Display only
    Display,
}

/// Element never interacted with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntestedElement {
    /// Display key
    pub element: String,
    /// Interactive or display
    #[serde(rename = "type")]
    pub role: ElementRole,
    /// High when interactive
    pub priority: Priority,
}

/// Input field without enough validation scenarios
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingValidation {
    /// Display key
    pub element: String,
    /// Validation cases still to exercise
    pub missing: Vec<String>,
    /// Always high
    pub priority: Priority,
}

/// Generic gap with a checklist of follow-up tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistGap {
    /// Gap kind, e.g. `no_error_testing`
    #[serde(rename = "type")]
    pub kind: String,
    /// Tests to add
    pub checks: Vec<String>,
    /// Priority
    pub priority: Priority,
}

impl ChecklistGap {
    fn new(kind: &str, checks: &[&str], priority: Priority) -> Self {
        Self {
            kind: kind.to_string(),
            checks: checks.iter().map(|c| (*c).to_string()).collect(),
            priority,
        }
    }

    /// Raised when a page never recorded a failing interaction
    #[must_use]
    pub fn no_error_testing() -> Self {
        Self::new(
            "no_error_testing",
            &["network_failure", "server_error", "invalid_data"],
            Priority::Medium,
        )
    }

    /// Screen-reader reminder attached to every page
    #[must_use]
    pub fn screen_reader() -> Self {
        Self::new(
            "screen_reader",
            &[
                "element_announcements",
                "navigation_flow",
                "content_descriptions",
            ],
            Priority::Medium,
        )
    }
}

/// What is still untested on a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    /// Elements never interacted with
    pub untested_elements: Vec<UntestedElement>,
    /// Input fields lacking validation scenarios
    pub missing_validations: Vec<MissingValidation>,
    /// Failure paths never exercised
    pub error_scenarios: Vec<ChecklistGap>,
    /// Accessibility reminders
    pub accessibility_gaps: Vec<ChecklistGap>,
}

impl GapReport {
    /// Derive the gaps for a page
    #[must_use]
    pub fn for_page(page: &PageRecord) -> Self {
        let mut report = Self::default();

        for tracked in page.elements() {
            let Some(key) = tracked.element.display_key() else {
                continue;
            };
            if !tracked.tested {
                let (role, priority) = if tracked.element.is_clickable {
                    (ElementRole::Interactive, Priority::High)
                } else {
                    (ElementRole::Display, Priority::Medium)
                };
                report.untested_elements.push(UntestedElement {
                    element: key.to_string(),
                    role,
                    priority,
                });
            }
            if tracked.element.is_input_like() && tracked.test_scenarios.len() < MIN_INPUT_SCENARIOS
            {
                report.missing_validations.push(MissingValidation {
                    element: key.to_string(),
                    missing: ["empty_input", "invalid_format", "boundary_values", "malicious_input"]
                        .iter()
                        .map(|m| (*m).to_string())
                        .collect(),
                    priority: Priority::High,
                });
            }
        }

        // Vacuously raised for a page with no interactions at all.
        if !page.has_failures() {
            report.error_scenarios.push(ChecklistGap::no_error_testing());
        }
        report.accessibility_gaps.push(ChecklistGap::screen_reader());
        report
    }

    /// High-priority untested elements plus high-priority validations
    #[must_use]
    pub fn high_priority_count(&self) -> usize {
        self.untested_elements
            .iter()
            .filter(|g| g.priority == Priority::High)
            .count()
            + self
                .missing_validations
                .iter()
                .filter(|g| g.priority == Priority::High)
                .count()
    }
}

/// Recommended follow-up work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Area, e.g. `Element Coverage`
    pub category: String,
    /// Priority
    pub priority: Priority,
    /// One-line summary
    pub description: String,
    /// Concrete steps
    pub actions: Vec<String>,
}

/// Suggestions derived from a gap report
#[must_use]
pub fn suggestions(gaps: &GapReport) -> Vec<Suggestion> {
    let mut out = Vec::new();
    if !gaps.untested_elements.is_empty() {
        out.push(Suggestion {
            category: "Element Coverage".to_string(),
            priority: Priority::High,
            description: format!("Test {} untested elements", gaps.untested_elements.len()),
            actions: gaps
                .untested_elements
                .iter()
                .map(|g| {
                    let role = match g.role {
                        ElementRole::Interactive => "interactive",
                        ElementRole::Display => "display",
                    };
                    format!("Test {} ({role})", g.element)
                })
                .collect(),
        });
    }
    if !gaps.missing_validations.is_empty() {
        out.push(Suggestion {
            category: "Input Validation".to_string(),
            priority: Priority::High,
            description: "Add comprehensive input validation tests".to_string(),
            actions: strings(&[
                "Test empty field validation",
                "Test invalid format handling",
                "Test boundary value inputs",
                "Test security injection attempts",
            ]),
        });
    }
    if !gaps.error_scenarios.is_empty() {
        out.push(Suggestion {
            category: "Error Handling".to_string(),
            priority: Priority::Medium,
            description: "Test error scenarios and edge cases".to_string(),
            actions: strings(&[
                "Test network connectivity issues",
                "Test server error responses",
                "Test app backgrounding/foregrounding",
                "Test device rotation scenarios",
            ]),
        });
    }
    out
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Likely to hurt users
    High,
    /// Worth tracking
    Medium,
}

/// Assessed risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    /// Level
    pub level: RiskLevel,
    /// `functionality`, `reliability` or `compliance`
    pub category: String,
    /// What is missing
    pub description: String,
    /// What could go wrong
    pub impact: String,
}

/// Risks implied by a gap report
#[must_use]
pub fn risks(gaps: &GapReport) -> Vec<Risk> {
    let mut out = Vec::new();
    let critical = gaps.high_priority_count();
    if critical > 0 {
        out.push(Risk {
            level: RiskLevel::High,
            category: "functionality".to_string(),
            description: format!("{critical} critical elements/validations not tested"),
            impact: "Could cause production failures".to_string(),
        });
    }
    if !gaps.error_scenarios.is_empty() {
        out.push(Risk {
            level: RiskLevel::Medium,
            category: "reliability".to_string(),
            description: "No error scenario testing performed".to_string(),
            impact: "App may not handle failures gracefully".to_string(),
        });
    }
    if !gaps.accessibility_gaps.is_empty() {
        out.push(Risk {
            level: RiskLevel::Medium,
            category: "compliance".to_string(),
            description: "Accessibility testing not performed".to_string(),
            impact: "Potential accessibility compliance issues".to_string(),
        });
    }
    out
}

/// Aggregate counts for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    /// Tracked elements
    pub total_elements: usize,
    /// Tested elements
    pub tested_elements: usize,
    /// Rounded tested share
    pub coverage_percentage: u32,
    /// Logged interactions
    pub interaction_count: usize,
}

/// Full coverage analysis of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAnalysis {
    /// Page name
    pub page: String,
    /// Counts
    pub summary: PageSummary,
    /// Display keys tracked on the page
    pub elements_found: Vec<String>,
    /// Kind of every logged interaction, in order
    pub interactions_tested: Vec<String>,
    /// Gap report
    pub gaps: GapReport,
    /// Suggested tests
    pub suggestions: Vec<Suggestion>,
    /// Risk assessment
    pub risks: Vec<Risk>,
}

impl PageAnalysis {
    /// Analyze a page record
    #[must_use]
    pub fn of(page: &PageRecord) -> Self {
        let gaps = GapReport::for_page(page);
        Self {
            page: page.name.clone(),
            summary: PageSummary {
                total_elements: page.total_elements(),
                tested_elements: page.tested_elements(),
                coverage_percentage: page.coverage_percentage(),
                interaction_count: page.interactions().len(),
            },
            elements_found: page.element_keys().map(str::to_string).collect(),
            interactions_tested: page
                .interactions()
                .iter()
                .map(|i| i.kind.to_string())
                .collect(),
            suggestions: suggestions(&gaps),
            risks: risks(&gaps),
            gaps,
        }
    }
}

/// Coverage across every page of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalGapAnalysis {
    /// Tested elements over all elements, rounded; 0 with no elements
    pub overall_coverage: u32,
    /// `"<page>: <element>"` for untested interactive elements
    pub critical_gaps: Vec<String>,
    /// `"<page>: <element>"` for untested display elements
    pub medium_gaps: Vec<String>,
    /// Reserved; nothing is classified low today
    pub low_priority_gaps: Vec<String>,
    /// Page-level advice
    pub recommendations: Vec<String>,
    /// Ordered to-do list
    pub next_actions: Vec<String>,
    /// Recorded user paths
    pub user_paths: Vec<UserPath>,
}

impl GlobalGapAnalysis {
    /// Aggregate across pages in record order
    #[must_use]
    pub fn of(pages: &[PageRecord], user_paths: &[UserPath], low_coverage_threshold: u32) -> Self {
        let total: usize = pages.iter().map(PageRecord::total_elements).sum();
        let tested: usize = pages.iter().map(PageRecord::tested_elements).sum();

        let mut critical_gaps = Vec::new();
        let mut medium_gaps = Vec::new();
        for page in pages {
            for gap in GapReport::for_page(page).untested_elements {
                let item = format!("{}: {}", page.name, gap.element);
                if gap.priority == Priority::High {
                    critical_gaps.push(item);
                } else {
                    medium_gaps.push(item);
                }
            }
        }

        Self {
            overall_coverage: percentage(tested, total),
            recommendations: recommendations(pages, low_coverage_threshold),
            next_actions: next_actions(&critical_gaps, &medium_gaps),
            critical_gaps,
            medium_gaps,
            low_priority_gaps: Vec::new(),
            user_paths: user_paths.to_vec(),
        }
    }
}

fn recommendations(pages: &[PageRecord], threshold: u32) -> Vec<String> {
    let mut out = Vec::new();
    let open: Vec<&str> = pages
        .iter()
        .filter(|p| !p.finalized)
        .map(|p| p.name.as_str())
        .collect();
    if !open.is_empty() {
        out.push(format!(
            "Complete testing for {} pages: {}",
            open.len(),
            open.join(", ")
        ));
    }
    let low: Vec<&str> = pages
        .iter()
        .filter(|p| p.coverage_percentage() < threshold)
        .map(|p| p.name.as_str())
        .collect();
    if !low.is_empty() {
        out.push(format!("Improve coverage for: {}", low.join(", ")));
    }
    out
}

fn next_actions(critical: &[String], medium: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    if !critical.is_empty() {
        out.push(format!(
            "HIGH PRIORITY: Address {} critical gaps",
            critical.len()
        ));
        out.extend(
            critical
                .iter()
                .take(NEXT_ACTION_EXAMPLES)
                .map(|gap| format!("- Test {gap}")),
        );
    }
    if !medium.is_empty() {
        out.push(format!(
            "MEDIUM PRIORITY: Address {} medium gaps",
            medium.len()
        ));
    }
    out
}
