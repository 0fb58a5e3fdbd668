//! DeviceDriver - abstract mobile automation trait
//!
//! The remote device session lives outside this crate. Everything the engine
//! needs from it is expressed by [`DeviceDriver`], so an Appium/WebDriver
//! client, a local emulator bridge or the scripted [`MockDriver`] can be
//! swapped in without touching resolution, gestures or coverage.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  DeviceDriver (trait)                                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐   ┌──────────────────┐                 │
//! │  │  Remote session  │   │  MockDriver      │                 │
//! │  │  (external)      │   │  (YAML fixtures) │                 │
//! │  └──────────────────┘   └──────────────────┘                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`MockDriver`]: crate::fixture::MockDriver

use crate::locator::Selector;
use crate::result::{RoamerError, RoamerResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Context name of the native automation layer
pub const NATIVE_CONTEXT: &str = "NATIVE_APP";

/// Substring identifying embedded web contexts
pub const WEBVIEW_MARKER: &str = "WEBVIEW";

/// Opaque handle to an element found by the driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned element reference
    pub id: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Attributes the engine reads from elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementAttribute {
    /// Visible text
    Text,
    /// Android `resource-id`
    ResourceId,
    /// Android `content-desc` (accessibility label)
    ContentDesc,
    /// Native widget class, e.g. `android.widget.EditText`
    ClassName,
    /// Web tag name
    TagName,
    /// Web `id` attribute
    Id,
    /// Web `type` attribute
    InputType,
}

impl ElementAttribute {
    /// Attribute name as the automation protocol spells it
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::ResourceId => "resource-id",
            Self::ContentDesc => "content-desc",
            Self::ClassName => "class",
            Self::TagName => "tagName",
            Self::Id => "id",
            Self::InputType => "type",
        }
    }
}

/// Element position and size in device pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a new rect
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether a point falls inside
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Device viewport size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 2400.0,
        }
    }
}

/// One step of a low-level touch sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TouchAction {
    /// Finger down
    Press {
        /// X coordinate
        x: f64,
        /// Y coordinate
        y: f64,
    },
    /// Finger move while down
    MoveTo {
        /// X coordinate
        x: f64,
        /// Y coordinate
        y: f64,
    },
    /// Hold in place
    Wait {
        /// Hold in milliseconds
        ms: u64,
    },
    /// Finger up
    Release,
}

/// Abstract driver trait for mobile automation
///
/// Element-level waits are provided methods that poll the corresponding
/// check until a deadline; implementations with native wait support can
/// override them.
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// First element matching the selector, if any
    async fn find_element(&self, selector: &Selector) -> RoamerResult<Option<ElementHandle>>;

    /// All elements matching the selector, in document order
    async fn find_elements(&self, selector: &Selector) -> RoamerResult<Vec<ElementHandle>>;

    /// Whether the element still exists in the UI tree
    async fn is_existing(&self, element: &ElementHandle) -> RoamerResult<bool>;

    /// Whether the element is displayed
    async fn is_displayed(&self, element: &ElementHandle) -> RoamerResult<bool>;

    /// Whether the element is enabled
    async fn is_enabled(&self, element: &ElementHandle) -> RoamerResult<bool>;

    /// Whether the element accepts taps
    async fn is_clickable(&self, element: &ElementHandle) -> RoamerResult<bool>;

    /// Read one attribute; `None` when the element lacks it
    async fn attribute(
        &self,
        element: &ElementHandle,
        attribute: ElementAttribute,
    ) -> RoamerResult<Option<String>>;

    /// Element bounds
    async fn rect(&self, element: &ElementHandle) -> RoamerResult<Rect>;

    /// Tap the element
    async fn click(&self, element: &ElementHandle) -> RoamerResult<()>;

    /// Replace the element's value with text
    async fn set_value(&self, element: &ElementHandle, value: &str) -> RoamerResult<()>;

    /// Perform a raw touch sequence
    async fn perform_touch(&self, actions: &[TouchAction]) -> RoamerResult<()>;

    /// Platform back action
    async fn back(&self) -> RoamerResult<()>;

    /// Viewport size
    async fn window_size(&self) -> RoamerResult<WindowSize>;

    /// Available rendering contexts
    async fn contexts(&self) -> RoamerResult<Vec<String>>;

    /// Active rendering context
    async fn current_context(&self) -> RoamerResult<String>;

    /// Switch rendering context
    async fn switch_context(&self, name: &str) -> RoamerResult<()>;

    /// Full structural dump of the screen
    async fn page_source(&self) -> RoamerResult<String>;

    /// Wait until the element is displayed
    async fn wait_for_displayed(
        &self,
        element: &ElementHandle,
        timeout: Duration,
        poll: Duration,
    ) -> RoamerResult<()> {
        let start = Instant::now();
        loop {
            if self.is_displayed(element).await.unwrap_or(false) {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(RoamerError::Timeout {
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Wait until the element is enabled
    async fn wait_for_enabled(
        &self,
        element: &ElementHandle,
        timeout: Duration,
        poll: Duration,
    ) -> RoamerResult<()> {
        let start = Instant::now();
        loop {
            if self.is_enabled(element).await.unwrap_or(false) {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(RoamerError::Timeout {
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Wait until the element is gone or no longer displayed
    async fn wait_for_hidden(
        &self,
        element: &ElementHandle,
        timeout: Duration,
        poll: Duration,
    ) -> RoamerResult<()> {
        let start = Instant::now();
        loop {
            let gone = !self.is_existing(element).await.unwrap_or(false)
                || !self.is_displayed(element).await.unwrap_or(false);
            if gone {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(RoamerError::Timeout {
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(poll).await;
        }
    }
}
