//! Selectors and the element resolution strategy chain.
//!
//! A free-text target ("Search", "Open settings", "btn_login") is turned into a
//! concrete element by trying an ordered list of [`ResolveStrategy`] values.
//! The first strategy that yields an existing element which becomes displayed
//! within the timeout wins; the rest are skipped.

use crate::driver::{DeviceDriver, ElementHandle};
use crate::result::RoamerResult;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Selector for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `text` attribute equals
    TextEquals(String),
    /// `text` attribute contains
    TextContains(String),
    /// `content-desc` equals
    DescriptionEquals(String),
    /// `content-desc` contains
    DescriptionContains(String),
    /// `resource-id` contains
    ResourceIdContains(String),
    /// UiAutomator `textContains`
    UiTextContains(String),
    /// UiAutomator `descriptionContains`
    UiDescriptionContains(String),
    /// Any element carrying text or a description
    Labelled,
    /// Every element
    Any,
    /// CSS selector, web contexts only
    Css(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Render the query in the automation protocol's selector language
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::TextEquals(t) => format!("//*[@text={}]", xpath_literal(t)),
            Self::TextContains(t) => format!("//*[contains(@text, {})]", xpath_literal(t)),
            Self::DescriptionEquals(t) => format!("//*[@content-desc={}]", xpath_literal(t)),
            Self::DescriptionContains(t) => {
                format!("//*[contains(@content-desc, {})]", xpath_literal(t))
            }
            Self::ResourceIdContains(t) => {
                format!("//*[contains(@resource-id, {})]", xpath_literal(t))
            }
            Self::UiTextContains(t) => {
                format!("android=new UiSelector().textContains({t:?})")
            }
            Self::UiDescriptionContains(t) => {
                format!("android=new UiSelector().descriptionContains({t:?})")
            }
            Self::Labelled => r#"//*[@text!="" or @content-desc!=""]"#.to_string(),
            Self::Any => "*".to_string(),
            Self::Css(s) => s.clone(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query())
    }
}

/// Quote a string for XPath 1.0, which has no escape sequences
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    let parts: Vec<String> = value
        .split('"')
        .map(|part| format!("\"{part}\""))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}

/// One way of turning a target description into a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveStrategy {
    /// Visible text equals the target
    ExactText,
    /// Visible text contains the target
    PartialText,
    /// Accessibility label equals the target
    ExactLabel,
    /// Accessibility label contains the target
    PartialLabel,
    /// Resource identifier contains the target
    PartialIdentifier,
    /// UiAutomator text query
    NativeTextContains,
    /// UiAutomator description query
    NativeDescriptionContains,
}

impl ResolveStrategy {
    /// Default priority order
    pub const ALL: [Self; 7] = [
        Self::ExactText,
        Self::PartialText,
        Self::ExactLabel,
        Self::PartialLabel,
        Self::PartialIdentifier,
        Self::NativeTextContains,
        Self::NativeDescriptionContains,
    ];

    /// Build the selector for a target
    #[must_use]
    pub fn selector(&self, target: &str) -> Selector {
        let target = target.to_string();
        match self {
            Self::ExactText => Selector::TextEquals(target),
            Self::PartialText => Selector::TextContains(target),
            Self::ExactLabel => Selector::DescriptionEquals(target),
            Self::PartialLabel => Selector::DescriptionContains(target),
            Self::PartialIdentifier => Selector::ResourceIdContains(target),
            Self::NativeTextContains => Selector::UiTextContains(target),
            Self::NativeDescriptionContains => Selector::UiDescriptionContains(target),
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ExactText => "exact_text",
            Self::PartialText => "partial_text",
            Self::ExactLabel => "exact_label",
            Self::PartialLabel => "partial_label",
            Self::PartialIdentifier => "partial_identifier",
            Self::NativeTextContains => "native_text_contains",
            Self::NativeDescriptionContains => "native_description_contains",
        }
    }
}

impl fmt::Display for ResolveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Element resolver running the strategy chain
#[derive(Debug, Clone)]
pub struct ElementResolver {
    strategies: Vec<ResolveStrategy>,
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for ElementResolver {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(crate::config::DEFAULT_RESOLVE_TIMEOUT_MS),
            Duration::from_millis(crate::config::DEFAULT_POLL_INTERVAL_MS),
        )
    }
}

impl ElementResolver {
    /// Resolver with the default strategy order
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            strategies: ResolveStrategy::ALL.to_vec(),
            timeout,
            poll_interval,
        }
    }

    /// Replace the strategy order
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<ResolveStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Strategies in the order they are tried
    #[must_use]
    pub fn strategies(&self) -> &[ResolveStrategy] {
        &self.strategies
    }

    /// Resolve a target; `None` when every strategy fails
    pub async fn resolve<D: DeviceDriver + ?Sized>(
        &self,
        driver: &D,
        target: &str,
    ) -> Option<ElementHandle> {
        for strategy in &self.strategies {
            match self.attempt(driver, *strategy, target).await {
                Ok(Some(element)) => {
                    debug!(%target, strategy = %strategy, element = %element.id, "resolved");
                    return Some(element);
                }
                Ok(None) => {}
                Err(e) => debug!(%target, strategy = %strategy, error = %e, "strategy failed"),
            }
        }
        debug!(%target, "no strategy resolved target");
        None
    }

    /// Try a single strategy: fetch, check existence, wait for display
    pub async fn attempt<D: DeviceDriver + ?Sized>(
        &self,
        driver: &D,
        strategy: ResolveStrategy,
        target: &str,
    ) -> RoamerResult<Option<ElementHandle>> {
        let selector = strategy.selector(target);
        let Some(element) = driver.find_element(&selector).await? else {
            return Ok(None);
        };
        if !driver.is_existing(&element).await? {
            return Ok(None);
        }
        driver
            .wait_for_displayed(&element, self.timeout, self.poll_interval)
            .await?;
        Ok(Some(element))
    }
}
