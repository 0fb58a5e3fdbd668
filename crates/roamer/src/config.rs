//! Explorer configuration.
//!
//! Every timeout and limit used by resolution, gestures, screen analysis and
//! gap analysis lives here so a session can be tuned from a YAML file.

use crate::result::{RoamerError, RoamerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default wait for a resolved element to become displayed (5 seconds)
pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 5000;

/// Default wait for a tap target to become enabled
pub const DEFAULT_ENABLE_TIMEOUT_MS: u64 = 5000;

/// Pause after an action before checking for loaders
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Upper bound on waiting for a loading indicator to clear
pub const DEFAULT_LOADER_TIMEOUT_MS: u64 = 10_000;

/// Pause after loaders cleared (or gave up)
pub const DEFAULT_STABILIZE_DELAY_MS: u64 = 500;

/// Default polling interval for waits (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default long-press hold
pub const DEFAULT_LONG_PRESS_MS: u64 = 2000;

/// Default scroll travel in pixels
pub const DEFAULT_SCROLL_DISTANCE: f64 = 300.0;

/// Elements extracted per screen scan
pub const DEFAULT_MAX_SCAN_ELEMENTS: usize = 15;

/// Labels contributing to a page signature
pub const DEFAULT_SIGNATURE_LABELS: usize = 5;

/// Labels contributing to page identity inference
pub const DEFAULT_IDENTITY_LABELS: usize = 10;

/// Pause after submitting a webview login form
pub const DEFAULT_AUTH_SETTLE_MS: u64 = 3000;

/// Pages below this percentage are flagged for more work
pub const DEFAULT_LOW_COVERAGE_THRESHOLD: u32 = 70;

/// Configuration for an exploration session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Wait for a resolved element to be displayed
    pub resolve_timeout_ms: u64,
    /// Wait for a tap target to be enabled
    pub enable_timeout_ms: u64,
    /// Pause after an action
    pub settle_delay_ms: u64,
    /// Wait for a loading indicator to disappear
    pub loader_timeout_ms: u64,
    /// Pause after the loader check
    pub stabilize_delay_ms: u64,
    /// Polling interval used by all waits
    pub poll_interval_ms: u64,
    /// Long-press hold when the caller gives none
    pub long_press_ms: u64,
    /// Scroll travel in pixels
    pub scroll_distance: f64,
    /// Cap on elements read per screen scan
    pub max_scan_elements: usize,
    /// Labels used for the navigation signature
    pub signature_labels: usize,
    /// Labels used for page identity
    pub identity_labels: usize,
    /// Pause after webview login submit
    pub auth_settle_ms: u64,
    /// Coverage percentage below which a page is recommended for more work
    pub low_coverage_threshold: u32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: DEFAULT_RESOLVE_TIMEOUT_MS,
            enable_timeout_ms: DEFAULT_ENABLE_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            loader_timeout_ms: DEFAULT_LOADER_TIMEOUT_MS,
            stabilize_delay_ms: DEFAULT_STABILIZE_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            scroll_distance: DEFAULT_SCROLL_DISTANCE,
            max_scan_elements: DEFAULT_MAX_SCAN_ELEMENTS,
            signature_labels: DEFAULT_SIGNATURE_LABELS,
            identity_labels: DEFAULT_IDENTITY_LABELS,
            auth_settle_ms: DEFAULT_AUTH_SETTLE_MS,
            low_coverage_threshold: DEFAULT_LOW_COVERAGE_THRESHOLD,
        }
    }
}

impl ExplorerConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with every delay zeroed and short waits, for scripted drivers
    #[must_use]
    pub fn instant() -> Self {
        Self {
            resolve_timeout_ms: 20,
            enable_timeout_ms: 20,
            settle_delay_ms: 0,
            loader_timeout_ms: 20,
            stabilize_delay_ms: 0,
            poll_interval_ms: 5,
            auth_settle_ms: 0,
            ..Self::default()
        }
    }

    /// Parse a YAML document; missing fields keep their defaults
    pub fn from_yaml_str(yaml: &str) -> RoamerResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> RoamerResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Reject settings that would make scans or signatures meaningless
    pub fn validate(&self) -> RoamerResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(RoamerError::Config {
                message: "poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.max_scan_elements == 0 || self.signature_labels == 0 || self.identity_labels == 0
        {
            return Err(RoamerError::Config {
                message: "element and label limits must be greater than zero".to_string(),
            });
        }
        if self.low_coverage_threshold > 100 {
            return Err(RoamerError::Config {
                message: format!(
                    "low_coverage_threshold {} exceeds 100",
                    self.low_coverage_threshold
                ),
            });
        }
        Ok(())
    }

    /// Set the resolve timeout
    #[must_use]
    pub const fn with_resolve_timeout(mut self, ms: u64) -> Self {
        self.resolve_timeout_ms = ms;
        self
    }

    /// Set the loader timeout
    #[must_use]
    pub const fn with_loader_timeout(mut self, ms: u64) -> Self {
        self.loader_timeout_ms = ms;
        self
    }

    /// Set the scan cap
    #[must_use]
    pub const fn with_max_scan_elements(mut self, max: usize) -> Self {
        self.max_scan_elements = max;
        self
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settle delay as Duration
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Stabilize delay as Duration
    #[must_use]
    pub const fn stabilize_delay(&self) -> Duration {
        Duration::from_millis(self.stabilize_delay_ms)
    }
}
