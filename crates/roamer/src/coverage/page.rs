//! Page records and the per-element coverage state they accumulate.

use crate::gesture::GestureKind;
use crate::screen::ScreenElement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Coverage gained per successful interaction
pub const COVERAGE_STEP: u8 = 25;

/// Coverage ceiling
pub const MAX_COVERAGE: u8 = 100;

/// Text marker that flags a tool payload as a failure
pub const ERROR_MARKER: &str = "Error";

/// Kind of recorded interaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum InteractionKind {
    /// Tap gesture
    Tap,
    /// Scroll gesture
    Scroll,
    /// Long press gesture
    LongPress,
    /// Platform back
    Back,
    /// Free-text action as the caller phrased it
    Action(String),
}

impl InteractionKind {
    /// Grouping key, also used in generated step text
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tap => "tap",
            Self::Scroll => "scroll",
            Self::LongPress => "long_press",
            Self::Back => "back",
            Self::Action(text) => text,
        }
    }
}

impl From<GestureKind> for InteractionKind {
    fn from(kind: GestureKind) -> Self {
        match kind {
            GestureKind::Tap => Self::Tap,
            GestureKind::Scroll => Self::Scroll,
            GestureKind::LongPress => Self::LongPress,
            GestureKind::Back => Self::Back,
        }
    }
}

impl From<String> for InteractionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "tap" => Self::Tap,
            "scroll" => Self::Scroll,
            "long_press" => Self::LongPress,
            "back" => Self::Back,
            _ => Self::Action(s),
        }
    }
}

impl From<InteractionKind> for String {
    fn from(kind: InteractionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an interaction worked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Completed without error
    Success,
    /// Raised or reported an error
    Failure,
}

impl Outcome {
    /// Classify a tool payload: any mention of `Error` counts as failure
    #[must_use]
    pub fn from_payload(text: &str) -> Self {
        if text.contains(ERROR_MARKER) {
            Self::Failure
        } else {
            Self::Success
        }
    }

    /// Whether this is a success
    #[must_use]
    pub const fn succeeded(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One interaction applied to a tracked element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScenario {
    /// Interaction kind
    pub kind: InteractionKind,
    /// When it happened
    pub timestamp: DateTime<Utc>,
    /// Whether it worked
    pub succeeded: bool,
}

/// An element with its accumulated coverage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageElement {
    /// Element as first seen
    #[serde(flatten)]
    pub element: ScreenElement,
    /// Touched at least once
    pub tested: bool,
    /// Every interaction that addressed it
    pub test_scenarios: Vec<TestScenario>,
    /// 0..=100 in steps of 25
    pub coverage_level: u8,
}

impl CoverageElement {
    /// Untested element
    #[must_use]
    pub fn new(element: ScreenElement) -> Self {
        Self {
            element,
            tested: false,
            test_scenarios: Vec::new(),
            coverage_level: 0,
        }
    }

    /// Record an interaction; only successes raise the level
    pub fn record(&mut self, kind: InteractionKind, outcome: Outcome) {
        self.tested = true;
        self.test_scenarios.push(TestScenario {
            kind,
            timestamp: Utc::now(),
            succeeded: outcome.succeeded(),
        });
        if outcome.succeeded() {
            self.coverage_level = self
                .coverage_level
                .saturating_add(COVERAGE_STEP)
                .min(MAX_COVERAGE);
        }
    }
}

/// Entry in a page's interaction log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Interaction kind
    pub kind: InteractionKind,
    /// Display key addressed, if any
    pub target: Option<String>,
    /// Whether it worked
    pub succeeded: bool,
    /// When it completed
    pub timestamp: DateTime<Utc>,
}

/// Accumulated coverage for one inferred page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// Inferred page name
    pub name: String,
    elements: Vec<CoverageElement>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    interactions: Vec<InteractionEvent>,
    /// Last time a snapshot landed here
    pub last_visited: DateTime<Utc>,
    /// Session-wide visit counter value at the last visit
    pub visit_seq: u64,
    /// Whether a final report was produced
    pub finalized: bool,
    /// When the final report was produced
    pub finalized_at: Option<DateTime<Utc>>,
}

impl PageRecord {
    /// Empty record
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
            index: HashMap::new(),
            interactions: Vec::new(),
            last_visited: Utc::now(),
            visit_seq: 0,
            finalized: false,
            finalized_at: None,
        }
    }

    /// Stamp a visit
    pub fn visit(&mut self, seq: u64) {
        self.last_visited = Utc::now();
        self.visit_seq = seq;
    }

    /// Add elements not yet tracked; existing state is never overwritten.
    /// Elements without a display key cannot be tracked and are skipped.
    pub fn merge<'a, I>(&mut self, elements: I) -> usize
    where
        I: IntoIterator<Item = &'a ScreenElement>,
    {
        let mut added = 0;
        for element in elements {
            let Some(key) = element.display_key() else {
                continue;
            };
            if self.index.contains_key(key) {
                continue;
            }
            self.index.insert(key.to_string(), self.elements.len());
            self.elements.push(CoverageElement::new(element.clone()));
            added += 1;
        }
        added
    }

    /// Apply an interaction: update the addressed element if tracked, always log
    pub fn record(&mut self, kind: InteractionKind, target: Option<&str>, outcome: Outcome) {
        if let Some(&i) = target.and_then(|t| self.index.get(t)) {
            if let Some(element) = self.elements.get_mut(i) {
                element.record(kind.clone(), outcome);
            }
        }
        self.interactions.push(InteractionEvent {
            kind,
            target: target.map(str::to_string),
            succeeded: outcome.succeeded(),
            timestamp: Utc::now(),
        });
    }

    /// Mark finalized now
    pub fn finalize(&mut self) {
        self.finalized = true;
        self.finalized_at = Some(Utc::now());
    }

    /// Tracked element by display key
    #[must_use]
    pub fn element(&self, key: &str) -> Option<&CoverageElement> {
        self.index.get(key).and_then(|&i| self.elements.get(i))
    }

    /// Tracked elements in first-seen order
    #[must_use]
    pub fn elements(&self) -> &[CoverageElement] {
        &self.elements
    }

    /// Display keys in first-seen order
    pub fn element_keys(&self) -> impl Iterator<Item = &str> {
        self.elements
            .iter()
            .filter_map(|e| e.element.display_key())
    }

    /// Interaction log in completion order
    #[must_use]
    pub fn interactions(&self) -> &[InteractionEvent] {
        &self.interactions
    }

    /// Number of tracked elements
    #[must_use]
    pub fn total_elements(&self) -> usize {
        self.elements.len()
    }

    /// Number of tested elements
    #[must_use]
    pub fn tested_elements(&self) -> usize {
        self.elements.iter().filter(|e| e.tested).count()
    }

    /// Tested share, rounded; 0 for an empty page
    #[must_use]
    pub fn coverage_percentage(&self) -> u32 {
        percentage(self.tested_elements(), self.total_elements())
    }

    /// Whether any interaction failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.interactions.iter().any(|i| !i.succeeded)
    }
}

/// `part / whole` as a rounded percentage, 0 when `whole` is 0
#[must_use]
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}
