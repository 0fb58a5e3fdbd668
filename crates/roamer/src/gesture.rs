//! Gesture execution with navigation detection.
//!
//! Every gesture is bracketed by two [`PageSignature`] captures:
//!
//! ```text
//! signature(before) → action → settle → loaders cleared? → stabilize → signature(after)
//! ```
//!
//! `navigation_occurred` is simply `before != after`. Loader waits are bounded
//! and never fail the gesture.

use crate::config::ExplorerConfig;
use crate::driver::{DeviceDriver, ElementAttribute, ElementHandle, Rect, TouchAction, WindowSize};
use crate::locator::{ElementResolver, Selector};
use crate::result::{RoamerError, RoamerResult};
use crate::signature::PageSignature;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Text searched for by the loading-indicator probes
pub const LOADING_TEXT: &str = "Loading";

/// Selectors probed after every gesture, in order
#[must_use]
pub fn loading_selectors() -> [Selector; 4] {
    [
        Selector::UiTextContains(LOADING_TEXT.to_string()),
        Selector::UiDescriptionContains(LOADING_TEXT.to_string()),
        Selector::TextContains(LOADING_TEXT.to_string()),
        Selector::DescriptionContains(LOADING_TEXT.to_string()),
    ]
}

/// Supported gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// Tap a resolved element
    Tap,
    /// Drag across the middle of the viewport
    Scroll,
    /// Press and hold a resolved element
    LongPress,
    /// Platform back
    Back,
}

impl GestureKind {
    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::Scroll => "scroll",
            Self::LongPress => "long_press",
            Self::Back => "back",
        }
    }

    /// Whether the gesture acts on a resolved element
    #[must_use]
    pub const fn needs_target(&self) -> bool {
        matches!(self, Self::Tap | Self::LongPress)
    }
}

impl FromStr for GestureKind {
    type Err = RoamerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tap" => Ok(Self::Tap),
            "scroll" | "swipe" => Ok(Self::Scroll),
            "long_press" => Ok(Self::LongPress),
            "back" => Ok(Self::Back),
            other => Err(RoamerError::UnknownGesture {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scroll direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    /// Content moves up
    Up,
    /// Content moves down
    #[default]
    Down,
    /// Horizontal, right to left
    Left,
    /// Horizontal, left to right
    Right,
}

impl ScrollDirection {
    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl FromStr for ScrollDirection {
    type Err = RoamerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(RoamerError::invalid_argument(format!(
                "unknown scroll direction '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gesture to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureRequest {
    /// Gesture kind
    pub kind: GestureKind,
    /// Free-text target; required for tap and long press
    pub target: Option<String>,
    /// Scroll direction, default down
    pub direction: Option<ScrollDirection>,
    /// Long-press hold, default from config
    pub duration_ms: Option<u64>,
}

impl GestureRequest {
    /// Tap a target
    #[must_use]
    pub fn tap(target: impl Into<String>) -> Self {
        Self::new(GestureKind::Tap).with_target(target)
    }

    /// Long press a target
    #[must_use]
    pub fn long_press(target: impl Into<String>) -> Self {
        Self::new(GestureKind::LongPress).with_target(target)
    }

    /// Scroll the viewport
    #[must_use]
    pub fn scroll(direction: ScrollDirection) -> Self {
        Self {
            direction: Some(direction),
            ..Self::new(GestureKind::Scroll)
        }
    }

    /// Platform back
    #[must_use]
    pub fn back() -> Self {
        Self::new(GestureKind::Back)
    }

    /// Bare request
    #[must_use]
    pub const fn new(kind: GestureKind) -> Self {
        Self {
            kind,
            target: None,
            direction: None,
            duration_ms: None,
        }
    }

    /// Set target
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set hold duration
    #[must_use]
    pub const fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }
}

/// What a gesture did and whether the screen changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureOutcome {
    /// Gesture wire name
    pub action: String,
    /// Target as given by the caller
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<String>,
    /// Display key of the element the target resolved to
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolved_key: Option<String>,
    /// Signatures differ
    pub navigation_occurred: bool,
    /// Signature before the action
    pub before_page: PageSignature,
    /// Signature after the action settled
    pub after_page: PageSignature,
    /// Human-readable detail, e.g. `Scrolled down`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

/// Display key of a resolved element: text, then label, then identifier.
/// `None` when every read fails or is empty.
pub async fn resolved_display_key<D: DeviceDriver + ?Sized>(
    driver: &D,
    element: &ElementHandle,
) -> Option<String> {
    for attribute in [
        ElementAttribute::Text,
        ElementAttribute::ContentDesc,
        ElementAttribute::ResourceId,
    ] {
        match driver.attribute(element, attribute).await {
            Ok(Some(value)) if !value.is_empty() => return Some(value),
            Ok(_) => {}
            Err(e) => debug!(element = %element.id, error = %e, "display key read failed"),
        }
    }
    None
}

/// Start and end points of a scroll drag centred in the viewport
#[must_use]
pub fn scroll_path(
    window: WindowSize,
    direction: ScrollDirection,
    distance: f64,
) -> ((f64, f64), (f64, f64)) {
    let cx = window.width / 2.0;
    let cy = window.height / 2.0;
    let half = distance / 2.0;
    match direction {
        ScrollDirection::Down => ((cx, cy - half), (cx, cy + half)),
        ScrollDirection::Up => ((cx, cy + half), (cx, cy - half)),
        ScrollDirection::Right => ((cx - half, cy), (cx + half, cy)),
        ScrollDirection::Left => ((cx + half, cy), (cx - half, cy)),
    }
}

/// Runs gestures against a driver
#[derive(Debug, Clone)]
pub struct GestureEngine {
    resolver: ElementResolver,
    config: ExplorerConfig,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new(ExplorerConfig::default())
    }
}

impl GestureEngine {
    /// Engine with a resolver built from the config
    #[must_use]
    pub fn new(config: ExplorerConfig) -> Self {
        let resolver = ElementResolver::new(
            Duration::from_millis(config.resolve_timeout_ms),
            config.poll_interval(),
        );
        Self { resolver, config }
    }

    /// Replace the resolver
    #[must_use]
    pub fn with_resolver(mut self, resolver: ElementResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Resolver used for targets
    #[must_use]
    pub fn resolver(&self) -> &ElementResolver {
        &self.resolver
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Execute a gesture
    pub async fn execute<D: DeviceDriver + ?Sized>(
        &self,
        driver: &D,
        request: &GestureRequest,
    ) -> RoamerResult<GestureOutcome> {
        let kind = request.kind;
        let target = if kind.needs_target() {
            let description = request.target.as_deref().unwrap_or_default();
            let element = self
                .resolver
                .resolve(driver, description)
                .await
                .ok_or_else(|| RoamerError::element_not_found(kind.as_str(), description))?;
            Some(element)
        } else {
            None
        };
        let resolved_key = match &target {
            Some(element) => resolved_display_key(driver, element).await,
            None => None,
        };

        let before = self.signature(driver).await;
        let detail = match (kind, target) {
            (GestureKind::Tap, Some(element)) => {
                self.tap(driver, &element).await?;
                None
            }
            (GestureKind::LongPress, Some(element)) => {
                let ms = request.duration_ms.unwrap_or(self.config.long_press_ms);
                self.long_press(driver, &element, ms).await?;
                Some(format!("Long pressed for {ms}ms"))
            }
            (GestureKind::Scroll, _) => {
                let direction = request.direction.unwrap_or_default();
                self.scroll(driver, direction).await?;
                Some(format!("Scrolled {direction}"))
            }
            (GestureKind::Back, _) => {
                driver.back().await?;
                None
            }
            (GestureKind::Tap | GestureKind::LongPress, None) => {
                return Err(RoamerError::element_not_found(kind.as_str(), ""));
            }
        };
        self.settle(driver).await;
        let after = self.signature(driver).await;

        let outcome = GestureOutcome {
            action: kind.as_str().to_string(),
            target: request.target.clone(),
            resolved_key,
            navigation_occurred: before != after,
            before_page: before,
            after_page: after,
            detail,
        };
        info!(
            action = %outcome.action,
            navigated = outcome.navigation_occurred,
            after = %outcome.after_page,
            "gesture complete"
        );
        Ok(outcome)
    }

    async fn signature<D: DeviceDriver + ?Sized>(&self, driver: &D) -> PageSignature {
        PageSignature::capture(driver, self.config.signature_labels).await
    }

    async fn tap<D: DeviceDriver + ?Sized>(
        &self,
        driver: &D,
        element: &ElementHandle,
    ) -> RoamerResult<()> {
        let timeout = Duration::from_millis(self.config.enable_timeout_ms);
        if let Err(e) = driver
            .wait_for_enabled(element, timeout, self.config.poll_interval())
            .await
        {
            warn!(element = %element.id, error = %e, "tap target never enabled; tapping anyway");
        }
        driver.click(element).await
    }

    async fn long_press<D: DeviceDriver + ?Sized>(
        &self,
        driver: &D,
        element: &ElementHandle,
        ms: u64,
    ) -> RoamerResult<()> {
        let rect = driver.rect(element).await.unwrap_or_else(|e| {
            warn!(element = %element.id, error = %e, "bounds unreadable");
            Rect::default()
        });
        let (x, y) = rect.center();
        driver
            .perform_touch(&[
                TouchAction::Press { x, y },
                TouchAction::Wait { ms },
                TouchAction::Release,
            ])
            .await
    }

    async fn scroll<D: DeviceDriver + ?Sized>(
        &self,
        driver: &D,
        direction: ScrollDirection,
    ) -> RoamerResult<()> {
        let window = driver.window_size().await.unwrap_or_else(|e| {
            warn!(error = %e, "window size unreadable");
            WindowSize::default()
        });
        let ((x0, y0), (x1, y1)) = scroll_path(window, direction, self.config.scroll_distance);
        driver
            .perform_touch(&[
                TouchAction::Press { x: x0, y: y0 },
                TouchAction::MoveTo { x: x1, y: y1 },
                TouchAction::Release,
            ])
            .await
    }

    /// Settle delay, loader probes, then the stabilization pause
    pub async fn settle<D: DeviceDriver + ?Sized>(&self, driver: &D) {
        tokio::time::sleep(self.config.settle_delay()).await;
        self.wait_for_loaders(driver).await;
        tokio::time::sleep(self.config.stabilize_delay()).await;
    }

    /// Wait for each visible loading indicator to go away; never fails
    pub async fn wait_for_loaders<D: DeviceDriver + ?Sized>(&self, driver: &D) {
        let timeout = Duration::from_millis(self.config.loader_timeout_ms);
        for selector in loading_selectors() {
            let loader = match driver.find_element(&selector).await {
                Ok(Some(loader)) => loader,
                Ok(None) => continue,
                Err(e) => {
                    debug!(%selector, error = %e, "loader probe failed");
                    continue;
                }
            };
            if !driver.is_existing(&loader).await.unwrap_or(false) {
                continue;
            }
            if let Err(e) = driver
                .wait_for_hidden(&loader, timeout, self.config.poll_interval())
                .await
            {
                debug!(%selector, error = %e, "loader still visible; continuing");
            }
        }
    }
}
