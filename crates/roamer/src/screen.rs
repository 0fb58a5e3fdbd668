//! Screen analysis: context detection, element extraction and page identity.
//!
//! The analyzer never aborts a scan because one element misbehaves. Every
//! attribute read goes through [`read_or_default`], so a failing read yields an
//! empty value for that attribute only.

use crate::config::ExplorerConfig;
use crate::driver::{DeviceDriver, ElementAttribute, ElementHandle, NATIVE_CONTEXT, WEBVIEW_MARKER};
use crate::identity::PageRules;
use crate::locator::Selector;
use crate::result::RoamerResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Keywords that suggest an authentication flow
pub const AUTH_KEYWORDS: [&str; 5] = ["email", "password", "sign in", "login", "firebase"];

/// Suggestion emitted when a webview login form is on screen
pub const AUTH_SUGGESTION: &str = "use handle_auth_flow tool with email and password";

/// Identity signature length reported in snapshots
pub const REPORTED_SIGNATURE_CHARS: usize = 100;

/// Page-source excerpt kept when a scan finds nothing
pub const SOURCE_EXCERPT_CHARS: usize = 500;

/// Rendering context kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderContext {
    /// Native widgets
    #[default]
    Native,
    /// Embedded web content
    Webview,
}

impl RenderContext {
    /// Classify a context name
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.contains(WEBVIEW_MARKER) {
            Self::Webview
        } else {
            Self::Native
        }
    }
}

impl fmt::Display for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Webview => write!(f, "webview"),
        }
    }
}

/// A discovered UI node as observed at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenElement {
    /// Visible label
    pub text: String,
    /// Resource or automation id
    pub identifier: String,
    /// Accessibility label
    pub accessibility_label: String,
    /// Accepts taps
    pub is_clickable: bool,
    /// Native widget class or web tag
    pub tag_kind: Option<String>,
    /// Web input type
    pub input_type: Option<String>,
}

impl ScreenElement {
    /// Element with visible text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Mark clickable
    #[must_use]
    pub fn clickable(mut self) -> Self {
        self.is_clickable = true;
        self
    }

    /// Set identifier
    #[must_use]
    pub fn with_identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = id.into();
        self
    }

    /// Set accessibility label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.accessibility_label = label.into();
        self
    }

    /// Set tag kind
    #[must_use]
    pub fn with_tag_kind(mut self, kind: impl Into<String>) -> Self {
        self.tag_kind = Some(kind.into());
        self
    }

    /// First non-empty of text, accessibility label, identifier
    #[must_use]
    pub fn display_key(&self) -> Option<&str> {
        [&self.text, &self.accessibility_label, &self.identifier]
            .into_iter()
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }

    /// Whether this element takes free text input
    #[must_use]
    pub fn is_input_like(&self) -> bool {
        self.tag_kind.as_deref().is_some_and(|kind| {
            kind.contains("EditText")
                || kind.eq_ignore_ascii_case("input")
                || kind.eq_ignore_ascii_case("textarea")
        })
    }

    /// Whether text or identifier mention an auth keyword
    #[must_use]
    pub fn mentions_auth(&self) -> bool {
        let display = self.display_key().unwrap_or_default().to_lowercase();
        let identifier = self.identifier.to_lowercase();
        AUTH_KEYWORDS
            .iter()
            .any(|k| display.contains(k) || identifier.contains(k))
    }
}

/// Attributes of one element; every field has already fallen back to its default
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementAttributes {
    /// Visible text
    pub text: String,
    /// Native `resource-id` or web `id`
    pub identifier: String,
    /// `content-desc`
    pub content_desc: String,
    /// Native class or web tag
    pub tag_kind: String,
    /// Web `type`
    pub input_type: String,
    /// Clickability as reported by the driver
    pub clickable: bool,
}

/// Collapse a fallible read into its default, logging the failure
pub fn read_or_default<T: Default>(result: RoamerResult<T>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        debug!(attribute = what, error = %e, "attribute read failed");
        T::default()
    })
}

async fn read_attr<D: DeviceDriver + ?Sized>(
    driver: &D,
    element: &ElementHandle,
    attribute: ElementAttribute,
) -> String {
    read_or_default(driver.attribute(element, attribute).await, attribute.wire_name())
        .unwrap_or_default()
}

impl ElementAttributes {
    /// Read the attributes a native scan needs
    pub async fn read_native<D: DeviceDriver + ?Sized>(driver: &D, element: &ElementHandle) -> Self {
        Self {
            text: read_attr(driver, element, ElementAttribute::Text).await,
            identifier: read_attr(driver, element, ElementAttribute::ResourceId).await,
            content_desc: read_attr(driver, element, ElementAttribute::ContentDesc).await,
            tag_kind: read_attr(driver, element, ElementAttribute::ClassName).await,
            input_type: String::new(),
            clickable: read_or_default(driver.is_clickable(element).await, "clickable"),
        }
    }

    /// Read the attributes a web scan needs; clickability is inferred
    pub async fn read_web<D: DeviceDriver + ?Sized>(driver: &D, element: &ElementHandle) -> Self {
        let tag_kind = read_attr(driver, element, ElementAttribute::TagName).await;
        let input_type = read_attr(driver, element, ElementAttribute::InputType).await;
        let clickable = tag_kind.eq_ignore_ascii_case("button")
            || tag_kind.eq_ignore_ascii_case("a")
            || input_type == "submit";
        Self {
            text: read_attr(driver, element, ElementAttribute::Text).await,
            identifier: read_attr(driver, element, ElementAttribute::Id).await,
            content_desc: String::new(),
            tag_kind,
            input_type,
            clickable,
        }
    }

    fn into_element(self) -> ScreenElement {
        let non_empty = |s: String| (!s.is_empty()).then_some(s);
        ScreenElement {
            text: self.text,
            identifier: self.identifier,
            accessibility_label: self.content_desc,
            is_clickable: self.clickable,
            tag_kind: non_empty(self.tag_kind),
            input_type: non_empty(self.input_type),
        }
    }
}

/// Structured view of the current screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Active rendering context
    pub context: RenderContext,
    /// Every context the driver reported
    pub available_contexts: Vec<String>,
    /// Inferred page name
    pub current_page: String,
    /// Identity signature, truncated for display
    pub page_signature: String,
    /// Extracted elements
    pub elements: Vec<ScreenElement>,
    /// Number of clickable elements
    pub clickable_count: usize,
    /// Whether an auth flow is likely on screen
    pub auth_detected: bool,
    /// Up to three next actions
    pub suggestions: Vec<String>,
    /// Start of the structural dump when nothing could be extracted
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_excerpt: Option<String>,
}

impl Snapshot {
    /// Find an element whose display value contains `description`, ignoring case
    #[must_use]
    pub fn find_by_description(&self, description: &str) -> Option<&ScreenElement> {
        let needle = description.to_lowercase();
        self.elements.iter().find(|e| {
            e.display_key()
                .is_some_and(|key| key.to_lowercase().contains(&needle))
        })
    }
}

/// Whether any element suggests an auth flow
#[must_use]
pub fn detect_auth(elements: &[ScreenElement]) -> bool {
    elements.iter().any(ScreenElement::mentions_auth)
}

/// Suggested next actions for a screen
#[must_use]
pub fn suggest_actions(elements: &[ScreenElement], context: RenderContext) -> Vec<String> {
    if context == RenderContext::Webview && detect_auth(elements) {
        return vec![AUTH_SUGGESTION.to_string()];
    }
    elements
        .iter()
        .filter(|e| e.is_clickable)
        .filter_map(ScreenElement::display_key)
        .take(3)
        .map(|key| format!("tap {key}"))
        .collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Produces snapshots of the current screen
#[derive(Debug, Clone)]
pub struct ScreenAnalyzer {
    rules: PageRules,
    max_elements: usize,
    identity_labels: usize,
}

impl Default for ScreenAnalyzer {
    fn default() -> Self {
        Self::new(&ExplorerConfig::default())
    }
}

impl ScreenAnalyzer {
    /// Analyzer with the default identity rules
    #[must_use]
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            rules: PageRules::default(),
            max_elements: config.max_scan_elements,
            identity_labels: config.identity_labels,
        }
    }

    /// Replace the identity rules
    #[must_use]
    pub fn with_rules(mut self, rules: PageRules) -> Self {
        self.rules = rules;
        self
    }

    /// Detect the active context, defaulting to native when undeterminable
    pub async fn detect_context<D: DeviceDriver + ?Sized>(
        &self,
        driver: &D,
    ) -> (RenderContext, Vec<String>) {
        let available = read_or_default(driver.contexts().await, "contexts");
        let current = driver
            .current_context()
            .await
            .unwrap_or_else(|_| NATIVE_CONTEXT.to_string());
        (RenderContext::from_name(&current), available)
    }

    /// Extract up to the configured number of visible elements
    pub async fn extract_elements<D: DeviceDriver + ?Sized>(
        &self,
        driver: &D,
        context: RenderContext,
    ) -> Vec<ScreenElement> {
        let handles = read_or_default(driver.find_elements(&Selector::Any).await, "elements");
        let mut elements = Vec::new();
        for handle in &handles {
            if elements.len() >= self.max_elements {
                break;
            }
            if !read_or_default(driver.is_displayed(handle).await, "displayed") {
                continue;
            }
            let attributes = match context {
                RenderContext::Native => ElementAttributes::read_native(driver, handle).await,
                RenderContext::Webview => ElementAttributes::read_web(driver, handle).await,
            };
            elements.push(attributes.into_element());
        }
        elements
    }

    /// Identity signature and page name for a set of elements
    #[must_use]
    pub fn identify(&self, elements: &[ScreenElement]) -> (String, String) {
        let signature = PageRules::identity_signature(
            elements.iter().filter_map(ScreenElement::display_key),
            self.identity_labels,
        );
        let name = self.rules.infer(&signature);
        (name, signature)
    }

    /// Analyze the current screen
    pub async fn analyze<D: DeviceDriver + ?Sized>(&self, driver: &D) -> Snapshot {
        let (context, available_contexts) = self.detect_context(driver).await;
        let elements = self.extract_elements(driver, context).await;
        let (current_page, signature) = self.identify(&elements);

        let source_excerpt = if elements.is_empty() {
            driver
                .page_source()
                .await
                .ok()
                .map(|source| truncate_chars(&source, SOURCE_EXCERPT_CHARS))
        } else {
            None
        };

        let snapshot = Snapshot {
            context,
            available_contexts,
            current_page,
            page_signature: truncate_chars(&signature, REPORTED_SIGNATURE_CHARS),
            clickable_count: elements.iter().filter(|e| e.is_clickable).count(),
            auth_detected: detect_auth(&elements),
            suggestions: suggest_actions(&elements, context),
            elements,
            source_excerpt,
        };
        info!(
            page = %snapshot.current_page,
            context = %snapshot.context,
            elements = snapshot.elements.len(),
            "screen analyzed"
        );
        snapshot
    }
}
