//! Scripted device driver backed by YAML fixtures.
//!
//! A fixture describes a small app as a set of screens. Tapping an element
//! with `navigates_to` moves to that screen; `back` pops the history. The
//! driver records every call so tests can assert on what the engine did.
//!
//! ```yaml
//! start: home
//! contexts: [NATIVE_APP]
//! screens:
//!   - name: home
//!     elements:
//!       - text: Search
//!         resource_id: org.wikipedia:id/search_container
//!         clickable: true
//!         navigates_to: search
//!   - name: search
//!     elements:
//!       - text: Search Wikipedia
//!         class_name: android.widget.EditText
//! ```

use crate::driver::{
    DeviceDriver, ElementAttribute, ElementHandle, Rect, TouchAction, WindowSize, NATIVE_CONTEXT,
};
use crate::locator::Selector;
use crate::result::{RoamerError, RoamerResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// One element on a scripted screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockElement {
    /// Visible text
    pub text: String,
    /// Android resource id
    pub resource_id: String,
    /// Accessibility label
    pub content_desc: String,
    /// Native widget class
    pub class_name: String,
    /// Web tag name
    pub tag_name: String,
    /// Web `type` attribute
    pub input_type: String,
    /// Accepts taps
    pub clickable: bool,
    /// Hidden elements exist but are never displayed
    pub hidden: bool,
    /// Disabled elements never become enabled
    pub disabled: bool,
    /// Every attribute read fails
    pub unreadable: bool,
    /// Screen shown after a tap
    pub navigates_to: Option<String>,
    /// Bounds
    pub rect: Rect,
}

impl MockElement {
    /// Element with visible text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Element with only an accessibility label
    #[must_use]
    pub fn described(desc: impl Into<String>) -> Self {
        Self {
            content_desc: desc.into(),
            ..Self::default()
        }
    }

    /// Mark clickable
    #[must_use]
    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    /// Set resource id
    #[must_use]
    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = id.into();
        self
    }

    /// Set accessibility label
    #[must_use]
    pub fn with_content_desc(mut self, desc: impl Into<String>) -> Self {
        self.content_desc = desc.into();
        self
    }

    /// Set widget class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class_name = class.into();
        self
    }

    /// Set web tag and input type
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>, input_type: impl Into<String>) -> Self {
        self.tag_name = tag.into();
        self.input_type = input_type.into();
        self
    }

    /// Navigate to a screen when tapped
    #[must_use]
    pub fn navigates_to(mut self, screen: impl Into<String>) -> Self {
        self.navigates_to = Some(screen.into());
        self
    }

    /// Never displayed
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Attribute reads fail
    #[must_use]
    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    /// Set bounds
    #[must_use]
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::TextEquals(t) => self.text == *t,
            Selector::TextContains(t) | Selector::UiTextContains(t) => self.text.contains(t.as_str()),
            Selector::DescriptionEquals(t) => self.content_desc == *t,
            Selector::DescriptionContains(t) | Selector::UiDescriptionContains(t) => {
                self.content_desc.contains(t.as_str())
            }
            Selector::ResourceIdContains(t) => self.resource_id.contains(t.as_str()),
            Selector::Labelled => !self.text.is_empty() || !self.content_desc.is_empty(),
            Selector::Any => true,
            Selector::Css(css) => css_matches(css, self),
        }
    }
}

/// Minimal `tag[attr="value"]` matcher
fn css_matches(css: &str, element: &MockElement) -> bool {
    let (tag, filter) = match css.find('[') {
        Some(i) => (&css[..i], Some(css[i + 1..].trim_end_matches(']'))),
        None => (css, None),
    };
    if !tag.is_empty() && tag != "*" && !element.tag_name.eq_ignore_ascii_case(tag) {
        return false;
    }
    let Some(filter) = filter else {
        return true;
    };
    let Some((name, value)) = filter.split_once('=') else {
        return false;
    };
    let value = value.trim_matches(|c| c == '"' || c == '\'');
    match name.trim() {
        "type" => element.input_type == value,
        "id" => element.resource_id == value,
        _ => false,
    }
}

/// One scripted screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockScreen {
    /// Screen name, the target of `navigates_to`
    pub name: String,
    /// Context active while this screen is shown
    pub context: Option<String>,
    /// Elements in document order
    pub elements: Vec<MockElement>,
}

impl MockScreen {
    /// Create a screen
    #[must_use]
    pub fn new(name: impl Into<String>, elements: Vec<MockElement>) -> Self {
        Self {
            name: name.into(),
            context: None,
            elements,
        }
    }

    /// Show this screen in a given context
    #[must_use]
    pub fn in_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// A scripted app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFixture {
    /// Initial screen; defaults to the first
    pub start: Option<String>,
    /// Contexts reported by the driver
    pub contexts: Vec<String>,
    /// Viewport
    pub window: WindowSize,
    /// Make every context query fail
    pub contexts_unavailable: bool,
    /// Screens
    pub screens: Vec<MockScreen>,
}

impl Default for DeviceFixture {
    fn default() -> Self {
        Self {
            start: None,
            contexts: vec![NATIVE_CONTEXT.to_string()],
            window: WindowSize::default(),
            contexts_unavailable: false,
            screens: Vec::new(),
        }
    }
}

impl DeviceFixture {
    /// Fixture from screens, starting at the first
    #[must_use]
    pub fn new(screens: Vec<MockScreen>) -> Self {
        Self {
            screens,
            ..Self::default()
        }
    }

    /// Add a context
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.contexts.push(context.into());
        self
    }

    /// Parse a YAML fixture
    pub fn from_yaml_str(yaml: &str) -> RoamerResult<Self> {
        let fixture: Self = serde_yaml_ng::from_str(yaml)?;
        if fixture.screens.is_empty() {
            return Err(RoamerError::Config {
                message: "fixture defines no screens".to_string(),
            });
        }
        Ok(fixture)
    }

    /// Load a YAML fixture file
    pub fn load(path: impl AsRef<Path>) -> RoamerResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }
}

#[derive(Debug)]
struct MockState {
    fixture: DeviceFixture,
    current: usize,
    history: Vec<usize>,
    context: String,
    values: HashMap<String, String>,
    calls: Vec<String>,
}

impl MockState {
    fn screen(&self) -> Option<&MockScreen> {
        self.fixture.screens.get(self.current)
    }

    fn screen_context(&self, index: usize) -> String {
        self.fixture
            .screens
            .get(index)
            .and_then(|s| s.context.clone())
            .unwrap_or_else(|| NATIVE_CONTEXT.to_string())
    }

    fn show(&mut self, index: usize) {
        self.current = index;
        self.context = self.screen_context(index);
    }

    /// Handles are `<screen index>:<element index>`; stale after navigation
    fn element(&self, handle: &ElementHandle) -> Option<&MockElement> {
        let (screen, index) = handle.id.split_once(':')?;
        let screen: usize = screen.parse().ok()?;
        if screen != self.current {
            return None;
        }
        self.screen()?.elements.get(index.parse::<usize>().ok()?)
    }

    fn matching(&self, selector: &Selector) -> Vec<ElementHandle> {
        self.screen()
            .map(|screen| {
                screen
                    .elements
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.matches(selector))
                    .map(|(i, _)| ElementHandle::new(format!("{}:{i}", self.current)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Scripted driver for tests and offline sessions
#[derive(Debug)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create a driver at the fixture's start screen
    #[must_use]
    pub fn new(fixture: DeviceFixture) -> Self {
        let current = fixture
            .start
            .as_ref()
            .and_then(|name| fixture.screens.iter().position(|s| &s.name == name))
            .unwrap_or(0);
        let mut state = MockState {
            fixture,
            current,
            history: Vec::new(),
            context: NATIVE_CONTEXT.to_string(),
            values: HashMap::new(),
            calls: Vec::new(),
        };
        state.show(current);
        Self {
            state: Mutex::new(state),
        }
    }

    /// Single-screen driver
    #[must_use]
    pub fn with_elements(elements: Vec<MockElement>) -> Self {
        Self::new(DeviceFixture::new(vec![MockScreen::new("main", elements)]))
    }

    fn lock(&self) -> RoamerResult<MutexGuard<'_, MockState>> {
        self.state
            .lock()
            .map_err(|_| RoamerError::driver("mock driver state poisoned"))
    }

    /// Name of the screen currently shown
    pub fn current_screen(&self) -> RoamerResult<String> {
        let state = self.lock()?;
        Ok(state.screen().map(|s| s.name.clone()).unwrap_or_default())
    }

    /// Recorded calls, e.g. `click:0:1`, `back`, `touch:press,wait,release`
    pub fn history(&self) -> RoamerResult<Vec<String>> {
        Ok(self.lock()?.calls.clone())
    }

    /// Whether a call starting with `prefix` was recorded
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock()
            .map(|s| s.calls.iter().any(|c| c.starts_with(prefix)))
            .unwrap_or(false)
    }

    /// Value last typed into an element
    pub fn value_of(&self, element: &ElementHandle) -> Option<String> {
        self.lock().ok()?.values.get(&element.id).cloned()
    }

    fn missing(handle: &ElementHandle) -> RoamerError {
        RoamerError::driver(format!("stale element reference: {}", handle.id))
    }
}

#[async_trait]
impl DeviceDriver for MockDriver {
    async fn find_element(&self, selector: &Selector) -> RoamerResult<Option<ElementHandle>> {
        Ok(self.lock()?.matching(selector).into_iter().next())
    }

    async fn find_elements(&self, selector: &Selector) -> RoamerResult<Vec<ElementHandle>> {
        Ok(self.lock()?.matching(selector))
    }

    async fn is_existing(&self, element: &ElementHandle) -> RoamerResult<bool> {
        Ok(self.lock()?.element(element).is_some())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> RoamerResult<bool> {
        let state = self.lock()?;
        let el = state.element(element).ok_or_else(|| Self::missing(element))?;
        Ok(!el.hidden)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> RoamerResult<bool> {
        let state = self.lock()?;
        let el = state.element(element).ok_or_else(|| Self::missing(element))?;
        Ok(!el.disabled)
    }

    async fn is_clickable(&self, element: &ElementHandle) -> RoamerResult<bool> {
        let state = self.lock()?;
        let el = state.element(element).ok_or_else(|| Self::missing(element))?;
        if el.unreadable {
            return Err(RoamerError::driver("clickable check failed"));
        }
        Ok(el.clickable)
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        attribute: ElementAttribute,
    ) -> RoamerResult<Option<String>> {
        let state = self.lock()?;
        let el = state.element(element).ok_or_else(|| Self::missing(element))?;
        if el.unreadable {
            return Err(RoamerError::driver(format!(
                "cannot read {}",
                attribute.wire_name()
            )));
        }
        let value = match attribute {
            ElementAttribute::Text => &el.text,
            ElementAttribute::ResourceId | ElementAttribute::Id => &el.resource_id,
            ElementAttribute::ContentDesc => &el.content_desc,
            ElementAttribute::ClassName => &el.class_name,
            ElementAttribute::TagName => &el.tag_name,
            ElementAttribute::InputType => &el.input_type,
        };
        Ok((!value.is_empty()).then(|| value.clone()))
    }

    async fn rect(&self, element: &ElementHandle) -> RoamerResult<Rect> {
        let state = self.lock()?;
        let el = state.element(element).ok_or_else(|| Self::missing(element))?;
        Ok(el.rect)
    }

    async fn click(&self, element: &ElementHandle) -> RoamerResult<()> {
        let mut state = self.lock()?;
        let target = state
            .element(element)
            .ok_or_else(|| Self::missing(element))?
            .navigates_to
            .clone();
        state.calls.push(format!("click:{}", element.id));
        if let Some(name) = target {
            let index = state
                .fixture
                .screens
                .iter()
                .position(|s| s.name == name)
                .ok_or_else(|| RoamerError::driver(format!("fixture has no screen '{name}'")))?;
            let from = state.current;
            state.history.push(from);
            state.show(index);
        }
        Ok(())
    }

    async fn set_value(&self, element: &ElementHandle, value: &str) -> RoamerResult<()> {
        let mut state = self.lock()?;
        if state.element(element).is_none() {
            return Err(Self::missing(element));
        }
        state.calls.push(format!("set_value:{}", element.id));
        state.values.insert(element.id.clone(), value.to_string());
        Ok(())
    }

    async fn perform_touch(&self, actions: &[TouchAction]) -> RoamerResult<()> {
        let names: Vec<&str> = actions
            .iter()
            .map(|a| match a {
                TouchAction::Press { .. } => "press",
                TouchAction::MoveTo { .. } => "move",
                TouchAction::Wait { .. } => "wait",
                TouchAction::Release => "release",
            })
            .collect();
        self.lock()?.calls.push(format!("touch:{}", names.join(",")));
        Ok(())
    }

    async fn back(&self) -> RoamerResult<()> {
        let mut state = self.lock()?;
        state.calls.push("back".to_string());
        if let Some(previous) = state.history.pop() {
            state.show(previous);
        }
        Ok(())
    }

    async fn window_size(&self) -> RoamerResult<WindowSize> {
        Ok(self.lock()?.fixture.window)
    }

    async fn contexts(&self) -> RoamerResult<Vec<String>> {
        let state = self.lock()?;
        if state.fixture.contexts_unavailable {
            return Err(RoamerError::driver("contexts not available yet"));
        }
        Ok(state.fixture.contexts.clone())
    }

    async fn current_context(&self) -> RoamerResult<String> {
        let state = self.lock()?;
        if state.fixture.contexts_unavailable {
            return Err(RoamerError::driver("contexts not available yet"));
        }
        Ok(state.context.clone())
    }

    async fn switch_context(&self, name: &str) -> RoamerResult<()> {
        let mut state = self.lock()?;
        if !state.fixture.contexts.iter().any(|c| c == name) {
            return Err(RoamerError::driver(format!("no such context: {name}")));
        }
        state.calls.push(format!("switch_context:{name}"));
        state.context = name.to_string();
        Ok(())
    }

    async fn page_source(&self) -> RoamerResult<String> {
        let state = self.lock()?;
        let screen = state.screen().map(|s| s.name.as_str()).unwrap_or_default();
        let mut xml = format!("<hierarchy screen=\"{screen}\">");
        if let Some(s) = state.screen() {
            for el in &s.elements {
                xml.push_str(&format!(
                    "<node text=\"{}\" resource-id=\"{}\" content-desc=\"{}\" clickable=\"{}\"/>",
                    el.text, el.resource_id, el.content_desc, el.clickable
                ));
            }
        }
        xml.push_str("</hierarchy>");
        Ok(xml)
    }
}
