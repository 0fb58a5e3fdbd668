//! Coverage tracking for exploratory sessions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  COVERAGE SESSION                                                 │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Snapshot ──► PageRules ──► PageRecord (elements by display key) │
//! │  Interaction ──────────────► current PageRecord (log + levels)   │
//! │                                   │                               │
//! │                                   ▼                               │
//! │            GapReport ─► Suggestions / Risks ─► PageAnalysis      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is an ordinary value owned by the caller. Page records are
//! created lazily on first visit and never removed. The "current" page is the
//! one with the highest visit sequence number, which makes the choice
//! deterministic even when two visits share a timestamp.

mod gaps;
mod page;

pub use gaps::{
    risks, suggestions, ChecklistGap, ElementRole, GapReport, GlobalGapAnalysis,
    MissingValidation, PageAnalysis, PageSummary, Priority, Risk, RiskLevel, Suggestion,
    UntestedElement, MIN_INPUT_SCENARIOS,
};
pub use page::{
    percentage, CoverageElement, InteractionEvent, InteractionKind, Outcome, PageRecord,
    TestScenario, COVERAGE_STEP, ERROR_MARKER, MAX_COVERAGE,
};

use crate::config::ExplorerConfig;
use crate::identity::PageRules;
use crate::result::{RoamerError, RoamerResult};
use crate::screen::{ScreenElement, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Message reported when the current scope has no page
pub const NOTHING_TO_ANALYZE: &str = "No current page to analyze";

/// A recorded multi-step user journey
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPath {
    /// Journey family, e.g. `authentication`
    pub kind: String,
    /// Route taken, e.g. `webview`
    pub sub_type: String,
    /// Whether it completed
    pub succeeded: bool,
    /// When it was recorded
    pub timestamp: DateTime<Utc>,
}

/// Which pages a gap analysis covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapScope {
    /// Most recently visited page
    #[default]
    Current,
    /// Every page
    All,
}

impl FromStr for GapScope {
    type Err = RoamerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(Self::Current),
            "all" => Ok(Self::All),
            other => Err(RoamerError::invalid_argument(format!(
                "scope must be 'current' or 'all', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for GapScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Result of [`CoverageSession::analyze_gaps`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapAnalysis {
    /// Analysis of the current page
    Current(Box<PageAnalysis>),
    /// No page has been visited yet
    NothingToAnalyze,
    /// Aggregate over every page
    All(GlobalGapAnalysis),
}

impl GapAnalysis {
    /// Scope the analysis answers
    #[must_use]
    pub const fn scope(&self) -> GapScope {
        match self {
            Self::Current(_) | Self::NothingToAnalyze => GapScope::Current,
            Self::All(_) => GapScope::All,
        }
    }
}

/// Caller-owned coverage state for one exploration session
#[derive(Debug, Clone)]
pub struct CoverageSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    rules: PageRules,
    identity_labels: usize,
    low_coverage_threshold: u32,
    pages: Vec<PageRecord>,
    user_paths: Vec<UserPath>,
    visits: u64,
}

impl Default for CoverageSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverageSession {
    /// Empty session with default identity rules
    #[must_use]
    pub fn new() -> Self {
        let config = ExplorerConfig::default();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            rules: PageRules::default(),
            identity_labels: config.identity_labels,
            low_coverage_threshold: config.low_coverage_threshold,
            pages: Vec::new(),
            user_paths: Vec::new(),
            visits: 0,
        }
    }

    /// Take label limits and thresholds from a config
    #[must_use]
    pub fn with_config(mut self, config: &ExplorerConfig) -> Self {
        self.identity_labels = config.identity_labels;
        self.low_coverage_threshold = config.low_coverage_threshold;
        self
    }

    /// Replace the identity rules
    #[must_use]
    pub fn with_rules(mut self, rules: PageRules) -> Self {
        self.rules = rules;
        self
    }

    /// Session id
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session started
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Identity rules in use
    #[must_use]
    pub fn rules(&self) -> &PageRules {
        &self.rules
    }

    /// Page records in creation order
    #[must_use]
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Page record by name
    #[must_use]
    pub fn page(&self, name: &str) -> Option<&PageRecord> {
        self.pages.iter().find(|p| p.name == name)
    }

    /// Recorded user paths
    #[must_use]
    pub fn user_paths(&self) -> &[UserPath] {
        &self.user_paths
    }

    /// Most recently visited page
    #[must_use]
    pub fn current_page(&self) -> Option<&PageRecord> {
        self.current_index().and_then(|i| self.pages.get(i))
    }

    fn current_index(&self) -> Option<usize> {
        self.pages
            .iter()
            .enumerate()
            .max_by_key(|(_, p)| p.visit_seq)
            .map(|(i, _)| i)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.name == name)
    }

    /// Page name this session assigns to a set of elements
    #[must_use]
    pub fn infer_page_name(&self, elements: &[ScreenElement]) -> String {
        let signature = PageRules::identity_signature(
            elements.iter().filter_map(ScreenElement::display_key),
            self.identity_labels,
        );
        self.rules.infer(&signature)
    }

    /// Merge a snapshot into its page record; returns the page name
    pub fn track_screen(&mut self, snapshot: &Snapshot) -> String {
        let name = self.infer_page_name(&snapshot.elements);
        let index = match self.index_of(&name) {
            Some(i) => i,
            None => {
                self.pages.push(PageRecord::new(name.clone()));
                self.pages.len() - 1
            }
        };
        self.visits += 1;
        let seq = self.visits;
        if let Some(page) = self.pages.get_mut(index) {
            let added = page.merge(&snapshot.elements);
            page.visit(seq);
            info!(page = %name, added, total = page.total_elements(), "screen tracked");
        }
        name
    }

    /// Attribute an interaction to the current page; a no-op before any visit.
    /// Returns whether it was recorded.
    pub fn track_interaction(
        &mut self,
        kind: impl Into<InteractionKind>,
        target: Option<&str>,
        outcome: Outcome,
    ) -> bool {
        let Some(index) = self.current_index() else {
            debug!("interaction before any screen; dropped");
            return false;
        };
        let Some(page) = self.pages.get_mut(index) else {
            return false;
        };
        let kind = kind.into();
        info!(page = %page.name, kind = %kind, target = ?target, ?outcome, "interaction tracked");
        page.record(kind, target, outcome);
        true
    }

    /// Record an authentication journey
    pub fn track_auth_flow(&mut self, sub_type: &str, succeeded: bool) {
        info!(sub_type, succeeded, "auth flow tracked");
        self.user_paths.push(UserPath {
            kind: "authentication".to_string(),
            sub_type: sub_type.to_string(),
            succeeded,
            timestamp: Utc::now(),
        });
    }

    /// Analyze and mark finalized the named page, or the current one when the
    /// name is absent or unknown
    pub fn finalize_page(&mut self, name: Option<&str>) -> RoamerResult<PageAnalysis> {
        let index = name
            .and_then(|n| self.index_of(n))
            .or_else(|| self.current_index())
            .ok_or(RoamerError::NoPageData)?;
        let page = self.pages.get_mut(index).ok_or(RoamerError::NoPageData)?;
        let analysis = PageAnalysis::of(page);
        page.finalize();
        info!(
            page = %page.name,
            coverage = analysis.summary.coverage_percentage,
            "page finalized"
        );
        Ok(analysis)
    }

    /// Gap analysis for the current page or for all pages
    #[must_use]
    pub fn analyze_gaps(&self, scope: GapScope) -> GapAnalysis {
        match scope {
            GapScope::Current => self
                .current_page()
                .map_or(GapAnalysis::NothingToAnalyze, |page| {
                    GapAnalysis::Current(Box::new(PageAnalysis::of(page)))
                }),
            GapScope::All => GapAnalysis::All(GlobalGapAnalysis::of(
                &self.pages,
                &self.user_paths,
                self.low_coverage_threshold,
            )),
        }
    }
}

#[cfg(test)]
mod tests;
