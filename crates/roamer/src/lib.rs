//! Roamer: exploratory mobile testing with coverage gap analysis
//!
//! Roamer drives a mobile app through an abstract [`DeviceDriver`], resolves
//! free-text targets to elements, detects navigation around every gesture,
//! and keeps a coverage model of what has been seen and touched. From that
//! model it reports gaps and generates Cucumber features.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    ROAMER Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Explorer   │    │ Gesture    │    │ Device     │            │
//! │   │ (tools)    │───►│ Engine     │───►│ Driver     │            │
//! │   │            │    │ + Resolver │    │ (trait)    │            │
//! │   └─────┬──────┘    └────────────┘    └─────▲──────┘            │
//! │         │           ┌────────────┐          │                   │
//! │         ├──────────►│ Screen     │──────────┘                   │
//! │         │           │ Analyzer   │                              │
//! │         ▼           └────────────┘                              │
//! │   ┌────────────┐    ┌────────────┐                              │
//! │   │ Coverage   │───►│ Scenario   │                              │
//! │   │ Session    │    │ Generator  │                              │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use roamer::prelude::*;
//!
//! # async fn demo() -> RoamerResult<()> {
//! let fixture = DeviceFixture::load("app.yaml")?;
//! let mut explorer = Explorer::new(MockDriver::new(fixture), ExplorerConfig::default());
//! explorer.call("inspect_screen", &serde_json::json!({})).await;
//! explorer.call("gesture", &serde_json::json!({"type": "tap", "target": "Search"})).await;
//! println!("{}", explorer.call("analyze_gaps", &serde_json::json!({"scope": "all"})).await);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
pub mod coverage;
mod driver;
mod fixture;
mod gesture;
mod identity;
mod locator;
mod result;
mod scenario;
mod screen;
mod signature;
mod tools;

pub use config::{
    ExplorerConfig, DEFAULT_AUTH_SETTLE_MS, DEFAULT_ENABLE_TIMEOUT_MS, DEFAULT_IDENTITY_LABELS,
    DEFAULT_LOADER_TIMEOUT_MS, DEFAULT_LONG_PRESS_MS, DEFAULT_LOW_COVERAGE_THRESHOLD,
    DEFAULT_MAX_SCAN_ELEMENTS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RESOLVE_TIMEOUT_MS,
    DEFAULT_SCROLL_DISTANCE, DEFAULT_SETTLE_DELAY_MS, DEFAULT_SIGNATURE_LABELS,
    DEFAULT_STABILIZE_DELAY_MS,
};
pub use coverage::{
    CoverageElement, CoverageSession, GapAnalysis, GapReport, GapScope, GlobalGapAnalysis,
    InteractionEvent, InteractionKind, Outcome, PageAnalysis, PageRecord, Priority, UserPath,
};
pub use driver::{
    DeviceDriver, ElementAttribute, ElementHandle, Rect, TouchAction, WindowSize,
    NATIVE_CONTEXT, WEBVIEW_MARKER,
};
pub use fixture::{DeviceFixture, MockDriver, MockElement, MockScreen};
pub use gesture::{
    loading_selectors, scroll_path, GestureEngine, GestureKind, GestureOutcome, GestureRequest,
    ScrollDirection, LOADING_TEXT,
};
pub use identity::{PagePredicate, PageRule, PageRules, UNKNOWN_PAGE};
pub use locator::{ElementResolver, ResolveStrategy, Selector};
pub use result::{RoamerError, RoamerResult};
pub use scenario::{title_case, FeatureTarget, ScenarioGenerator, NO_PAGE_DATA};
pub use screen::{
    detect_auth, read_or_default, suggest_actions, ElementAttributes, RenderContext,
    ScreenAnalyzer, ScreenElement, Snapshot, AUTH_KEYWORDS, AUTH_SUGGESTION,
};
pub use signature::{PageSignature, UNKNOWN_SIGNATURE};
pub use tools::{
    action_candidates, action_gesture, tool_specs, AuthRoute, Explorer, ToolSpec, ERROR_PREFIX,
    FEATURES_HEADER,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::coverage::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::fixture::*;
    pub use super::gesture::*;
    pub use super::identity::*;
    pub use super::locator::*;
    pub use super::result::*;
    pub use super::scenario::*;
    pub use super::screen::*;
    pub use super::signature::*;
    pub use super::tools::*;
}
