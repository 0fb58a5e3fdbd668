//! Tool call surface.
//!
//! [`Explorer`] bundles a driver with the analyzer, gesture engine, coverage
//! session and scenario generator, and exposes them as named tools taking a
//! flat JSON argument object. [`Explorer::call`] never fails: errors come back
//! as text starting with `Error: `.

use crate::config::ExplorerConfig;
use crate::coverage::{
    CoverageSession, GapAnalysis, GapScope, InteractionKind, Outcome, PageAnalysis,
    NOTHING_TO_ANALYZE,
};
use crate::driver::{DeviceDriver, NATIVE_CONTEXT, WEBVIEW_MARKER};
use crate::gesture::{GestureEngine, GestureKind, GestureOutcome, GestureRequest, ScrollDirection};
use crate::identity::PageRules;
use crate::locator::Selector;
use crate::result::{RoamerError, RoamerResult};
use crate::scenario::{FeatureTarget, ScenarioGenerator};
use crate::screen::{ScreenAnalyzer, Snapshot};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

/// Prefix on every error payload
pub const ERROR_PREFIX: &str = "Error: ";

/// Header on generated feature payloads
pub const FEATURES_HEADER: &str = "Generated Cucumber Features:";

/// Description of one callable tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    /// Tool name
    pub name: &'static str,
    /// What it does
    pub description: &'static str,
    /// JSON schema of the arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Every tool with its argument schema
#[must_use]
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "inspect_screen",
            description: "Analyze current mobile screen and track coverage",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolSpec {
            name: "gesture",
            description: "Execute specific gesture and track coverage",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "type": { "type": "string", "enum": ["tap", "swipe", "scroll", "long_press", "back"] },
                    "target": { "type": "string", "description": "Element description" },
                    "params": {
                        "type": "object",
                        "properties": {
                            "direction": { "type": "string", "enum": ["up", "down", "left", "right"] },
                            "duration": { "type": "integer", "description": "Long press hold in ms" }
                        }
                    }
                },
                "required": ["type"]
            }),
        },
        ToolSpec {
            name: "smart_action",
            description: "Perform a natural language action and track coverage",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "action": { "type": "string", "description": "Natural language action" }
                },
                "required": ["action"]
            }),
        },
        ToolSpec {
            name: "finalize_page",
            description: "Complete page analysis and generate a coverage report",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pageName": { "type": "string", "description": "Page to finalize; defaults to the current page" }
                }
            }),
        },
        ToolSpec {
            name: "analyze_gaps",
            description: "Analyze coverage gaps for current or all pages",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "scope": { "type": "string", "enum": ["current", "all"], "default": "current" }
                }
            }),
        },
        ToolSpec {
            name: "generate_cucumber",
            description: "Generate Cucumber feature files from page analysis",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pageName": { "type": "string", "description": "Specific page or 'all'" },
                    "includeGaps": { "type": "boolean", "default": true, "description": "Include gap-based scenarios" }
                }
            }),
        },
        ToolSpec {
            name: "handle_auth_flow",
            description: "Fill and submit a login form in a webview or native screen",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string", "description": "Email for login" },
                    "password": { "type": "string", "description": "Password for login" }
                },
                "required": ["email", "password"]
            }),
        },
    ]
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GestureParams {
    direction: Option<String>,
    duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GestureArgs {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    params: GestureParams,
}

#[derive(Debug, Deserialize)]
struct SmartActionArgs {
    action: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FinalizeArgs {
    page_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalyzeGapsArgs {
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateArgs {
    #[serde(default)]
    page_name: Option<String>,
    #[serde(default = "include_gaps_default")]
    include_gaps: bool,
}

const fn include_gaps_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct AuthArgs {
    email: String,
    password: String,
}

fn parse_args<T: DeserializeOwned>(arguments: &Value) -> RoamerResult<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments.clone()
    };
    serde_json::from_value(arguments).map_err(|e| RoamerError::invalid_argument(e.to_string()))
}

fn leading_verb() -> Option<&'static Regex> {
    static VERB: OnceLock<Option<Regex>> = OnceLock::new();
    VERB.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:tap|click|long\s+press|press|scroll|swipe)\s+(?:on\s+)?(?:the\s+)?(.+?)\s*$")
            .ok()
    })
    .as_ref()
}

/// Phrases to look for on screen: the whole action, then the action with any
/// leading gesture verb removed
#[must_use]
pub fn action_candidates(action: &str) -> Vec<String> {
    let mut candidates = vec![action.trim().to_string()];
    if let Some(rest) = leading_verb()
        .and_then(|re| re.captures(action))
        .and_then(|caps| caps.get(1))
    {
        candidates.push(rest.as_str().to_string());
    }
    candidates
}

/// Gesture implied by the wording of an action
#[must_use]
pub fn action_gesture(action: &str) -> GestureKind {
    let lower = action.to_lowercase();
    if lower.contains("tap") || lower.contains("click") {
        GestureKind::Tap
    } else if lower.contains("swipe") || lower.contains("scroll") {
        GestureKind::Scroll
    } else if lower.contains("long press") {
        GestureKind::LongPress
    } else {
        GestureKind::Tap
    }
}

/// Route an auth flow took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRoute {
    /// Login form inside a webview
    Webview,
    /// Native login widgets
    Native,
}

impl AuthRoute {
    /// Name recorded in user paths
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Webview => "webview",
            Self::Native => "native",
        }
    }
}

/// An exploration session against one device
#[derive(Debug)]
pub struct Explorer<D> {
    driver: D,
    config: ExplorerConfig,
    analyzer: ScreenAnalyzer,
    gestures: GestureEngine,
    session: CoverageSession,
    generator: ScenarioGenerator,
}

impl<D: DeviceDriver> Explorer<D> {
    /// Explorer with default identity rules
    #[must_use]
    pub fn new(driver: D, config: ExplorerConfig) -> Self {
        Self {
            driver,
            analyzer: ScreenAnalyzer::new(&config),
            gestures: GestureEngine::new(config.clone()),
            session: CoverageSession::new().with_config(&config),
            generator: ScenarioGenerator::new(),
            config,
        }
    }

    /// Use the same identity rules for snapshots and coverage
    #[must_use]
    pub fn with_rules(mut self, rules: PageRules) -> Self {
        self.analyzer = self.analyzer.with_rules(rules.clone());
        self.session = self.session.with_rules(rules);
        self
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Coverage recorded so far
    #[must_use]
    pub fn session(&self) -> &CoverageSession {
        &self.session
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Run a tool; errors are rendered as `Error: <message>`
    pub async fn call(&mut self, name: &str, arguments: &Value) -> String {
        match self.dispatch(name, arguments).await {
            Ok(text) => text,
            Err(e) => {
                warn!(tool = name, error = %e, "tool failed");
                format!("{ERROR_PREFIX}{e}")
            }
        }
    }

    /// Run a tool, surfacing errors
    pub async fn dispatch(&mut self, name: &str, arguments: &Value) -> RoamerResult<String> {
        info!(tool = name, "tool call");
        match name {
            "inspect_screen" => {
                let snapshot = self.inspect_screen().await;
                Ok(serde_json::to_string_pretty(&snapshot)?)
            }
            "gesture" => {
                let args: GestureArgs = parse_args(arguments)?;
                let outcome = self.gesture(args).await?;
                Ok(serde_json::to_string_pretty(&outcome)?)
            }
            "smart_action" => {
                let args: SmartActionArgs = parse_args(arguments)?;
                self.smart_action(&args.action).await
            }
            "finalize_page" => {
                let args: FinalizeArgs = parse_args(arguments)?;
                let analysis = self.finalize_page(args.page_name.as_deref())?;
                Ok(serde_json::to_string_pretty(&analysis)?)
            }
            "analyze_gaps" => {
                let args: AnalyzeGapsArgs = parse_args(arguments)?;
                let scope = args
                    .scope
                    .as_deref()
                    .map_or(Ok(GapScope::Current), str::parse::<GapScope>)?;
                render_gaps(&self.analyze_gaps(scope))
            }
            "generate_cucumber" => {
                let args: GenerateArgs = parse_args(arguments)?;
                let features =
                    self.generate_cucumber(args.page_name.as_deref(), args.include_gaps);
                Ok(format!("{FEATURES_HEADER}\n\n{features}"))
            }
            "handle_auth_flow" => {
                let args: AuthArgs = parse_args(arguments)?;
                self.handle_auth_flow(&args.email, &args.password).await
            }
            other => Err(RoamerError::UnknownTool {
                name: other.to_string(),
            }),
        }
    }

    /// Snapshot the screen and merge it into coverage
    pub async fn inspect_screen(&mut self) -> Snapshot {
        let snapshot = self.analyzer.analyze(&self.driver).await;
        self.session.track_screen(&snapshot);
        snapshot
    }

    /// Perform a gesture and record it; failures are recorded before returning
    async fn gesture(&mut self, args: GestureArgs) -> RoamerResult<GestureOutcome> {
        let kind: GestureKind = args.kind.parse()?;
        let direction = args
            .params
            .direction
            .as_deref()
            .map(str::parse::<ScrollDirection>)
            .transpose()?;
        let request = GestureRequest {
            kind,
            target: args.target.clone(),
            direction,
            duration_ms: args.params.duration,
        };
        let tracked = args.target.as_deref().filter(|_| kind.needs_target());
        self.run_gesture(&request, kind.into(), tracked).await
    }

    /// Execute a request and record it under `kind`. A success is recorded
    /// against the resolved element's display key when one could be read,
    /// else against `tracked_target`.
    pub async fn run_gesture(
        &mut self,
        request: &GestureRequest,
        kind: InteractionKind,
        tracked_target: Option<&str>,
    ) -> RoamerResult<GestureOutcome> {
        match self.gestures.execute(&self.driver, request).await {
            Ok(outcome) => {
                let target = outcome.resolved_key.as_deref().or(tracked_target);
                self.session.track_interaction(kind, target, Outcome::Success);
                Ok(outcome)
            }
            Err(e) => {
                self.session
                    .track_interaction(kind, tracked_target, Outcome::Failure);
                Err(e)
            }
        }
    }

    /// Interpret a free-text action against the current screen
    pub async fn smart_action(&mut self, action: &str) -> RoamerResult<String> {
        let snapshot = self.analyzer.analyze(&self.driver).await;
        let key = action_candidates(action).iter().find_map(|candidate| {
            snapshot
                .find_by_description(candidate)
                .and_then(|e| e.display_key())
                .map(str::to_string)
        });
        let kind = InteractionKind::Action(action.to_string());

        let Some(key) = key else {
            let text = format!("Could not understand action: {action}");
            self.session
                .track_interaction(kind, None, Outcome::from_payload(&text));
            return Ok(text);
        };

        let gesture = action_gesture(action);
        let request = GestureRequest::new(gesture).with_target(key.clone());
        let tracked = gesture.needs_target().then_some(key.as_str());
        let outcome = self.run_gesture(&request, kind, tracked).await?;
        Ok(serde_json::to_string_pretty(&outcome)?)
    }

    /// Final report for a page
    pub fn finalize_page(&mut self, page_name: Option<&str>) -> RoamerResult<PageAnalysis> {
        self.session.finalize_page(page_name)
    }

    /// Gap analysis
    #[must_use]
    pub fn analyze_gaps(&self, scope: GapScope) -> GapAnalysis {
        self.session.analyze_gaps(scope)
    }

    /// Feature text for a page, the current page, or `"all"`
    #[must_use]
    pub fn generate_cucumber(&self, page_name: Option<&str>, include_gaps: bool) -> String {
        self.generator.generate(
            &self.session,
            &FeatureTarget::from_arg(page_name),
            include_gaps,
        )
    }

    /// Log in through a webview form if one is available, else native widgets
    pub async fn handle_auth_flow(&mut self, email: &str, password: &str) -> RoamerResult<String> {
        let contexts = self.driver.contexts().await.unwrap_or_default();
        let webview = contexts.iter().find(|c| c.contains(WEBVIEW_MARKER)).cloned();

        let route = match webview {
            Some(context) => self
                .webview_login(&context, email, password)
                .await
                .map(|done| done.then_some(AuthRoute::Webview)),
            None => self
                .native_login(email, password)
                .await
                .map(|done| done.then_some(AuthRoute::Native)),
        };

        match route {
            Ok(Some(route)) => {
                self.session.track_auth_flow(route.as_str(), true);
                let label = match route {
                    AuthRoute::Webview => "Webview",
                    AuthRoute::Native => "Native",
                };
                Ok(format!("{label} auth completed for {email}"))
            }
            Ok(None) => {
                self.session.track_auth_flow("failed", false);
                Err(RoamerError::AuthElementsNotFound)
            }
            Err(e) => {
                self.session.track_auth_flow("failed", false);
                Err(e)
            }
        }
    }

    /// Fill the webview form; the native context is restored whatever happens
    async fn webview_login(
        &self,
        context: &str,
        email: &str,
        password: &str,
    ) -> RoamerResult<bool> {
        self.driver.switch_context(context).await?;
        let filled = self.fill_webview_form(email, password).await;
        let restored = self.driver.switch_context(NATIVE_CONTEXT).await;
        match (filled, restored) {
            (Ok(done), Ok(())) => Ok(done),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), restored) => {
                if let Err(restore) = restored {
                    warn!(error = %restore, "could not return to native context");
                }
                Err(e)
            }
        }
    }

    async fn fill_webview_form(&self, email: &str, password: &str) -> RoamerResult<bool> {
        let email_field = self
            .driver
            .find_element(&Selector::css(r#"input[type="email"]"#))
            .await?;
        let password_field = self
            .driver
            .find_element(&Selector::css(r#"input[type="password"]"#))
            .await?;
        let submit = self
            .driver
            .find_element(&Selector::css(r#"button[type="submit"]"#))
            .await?;

        let (Some(email_field), Some(password_field), Some(submit)) =
            (email_field, password_field, submit)
        else {
            return Ok(false);
        };

        self.driver.set_value(&email_field, email).await?;
        self.driver.set_value(&password_field, password).await?;
        self.driver.click(&submit).await?;
        tokio::time::sleep(Duration::from_millis(self.config.auth_settle_ms)).await;
        Ok(true)
    }

    async fn native_login(&self, email: &str, password: &str) -> RoamerResult<bool> {
        let resolver = self.gestures.resolver();
        let email_field = resolver.resolve(&self.driver, "email").await;
        let password_field = resolver.resolve(&self.driver, "password").await;
        let login = resolver.resolve(&self.driver, "login").await;

        let (Some(email_field), Some(password_field), Some(login)) =
            (email_field, password_field, login)
        else {
            return Ok(false);
        };
        self.driver.set_value(&email_field, email).await?;
        self.driver.set_value(&password_field, password).await?;
        self.driver.click(&login).await?;
        Ok(true)
    }
}

fn render_gaps(analysis: &GapAnalysis) -> RoamerResult<String> {
    let scope = analysis.scope().to_string();
    let mut body = match analysis {
        GapAnalysis::Current(page) => serde_json::to_value(page)?,
        GapAnalysis::NothingToAnalyze => json!({ "error": NOTHING_TO_ANALYZE }),
        GapAnalysis::All(global) => serde_json::to_value(global)?,
    };
    if let Value::Object(map) = &mut body {
        map.insert("scope".to_string(), Value::String(scope));
    }
    Ok(serde_json::to_string_pretty(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{DeviceFixture, MockDriver, MockElement, MockScreen};

    fn explorer(driver: MockDriver) -> Explorer<MockDriver> {
        Explorer::new(driver, ExplorerConfig::instant())
    }

    fn wiki() -> MockDriver {
        MockDriver::new(DeviceFixture::new(vec![
            MockScreen::new(
                "home",
                vec![
                    MockElement::text("Home").clickable(),
                    MockElement::text("Search Wikipedia")
                        .clickable()
                        .navigates_to("search"),
                    MockElement::described("Open menu").clickable(),
                ],
            ),
            MockScreen::new(
                "search",
                vec![MockElement::text("Search").with_class("android.widget.EditText")],
            ),
        ]))
    }

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_action_candidates_strip_verb() {
            assert_eq!(
                action_candidates("tap on the Search button"),
                vec!["tap on the Search button", "Search button"]
            );
            assert_eq!(
                action_candidates("Long press Open menu"),
                vec!["Long press Open menu", "Open menu"]
            );
            assert_eq!(action_candidates("Settings"), vec!["Settings"]);
        }

        #[test]
        fn test_action_gesture_mapping() {
            assert_eq!(action_gesture("Click login"), GestureKind::Tap);
            assert_eq!(action_gesture("swipe the feed"), GestureKind::Scroll);
            assert_eq!(action_gesture("long press menu"), GestureKind::LongPress);
            assert_eq!(action_gesture("open settings"), GestureKind::Tap);
        }

        #[test]
        fn test_tool_specs_cover_every_tool() {
            let names: Vec<&str> = tool_specs().iter().map(|t| t.name).collect();
            assert_eq!(
                names,
                vec![
                    "inspect_screen",
                    "gesture",
                    "smart_action",
                    "finalize_page",
                    "analyze_gaps",
                    "generate_cucumber",
                    "handle_auth_flow"
                ]
            );
            let json = serde_json::to_value(tool_specs()).unwrap();
            assert!(json[0].get("inputSchema").is_some());
        }
    }

    mod call_tests {
        use super::*;

        #[tokio::test]
        async fn test_unknown_tool_is_error_text() {
            let mut explorer = explorer(wiki());
            let text = explorer.call("teleport", &json!({})).await;
            assert_eq!(text, "Error: Unknown tool: teleport");
        }

        #[tokio::test]
        async fn test_unknown_gesture_is_error_text_and_untracked() {
            let mut explorer = explorer(wiki());
            explorer.call("inspect_screen", &Value::Null).await;
            let text = explorer
                .call("gesture", &json!({ "type": "pinch", "target": "Home" }))
                .await;
            assert_eq!(text, "Error: Unknown gesture: pinch");
            assert!(explorer.session().pages()[0].interactions().is_empty());
        }

        #[tokio::test]
        async fn test_missing_arguments_are_error_text() {
            let mut explorer = explorer(wiki());
            let text = explorer.call("smart_action", &json!({})).await;
            assert!(text.starts_with("Error: Invalid argument"));
        }

        #[tokio::test]
        async fn test_inspect_tracks_screen() {
            let mut explorer = explorer(wiki());
            let text = explorer.call("inspect_screen", &json!({})).await;
            let snapshot: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(snapshot["current_page"], "Home");
            assert_eq!(snapshot["clickable_count"], 3);
            assert_eq!(explorer.session().page("Home").unwrap().total_elements(), 3);
        }

        #[tokio::test]
        async fn test_gesture_tracks_success() {
            let mut explorer = explorer(wiki());
            explorer.call("inspect_screen", &json!({})).await;
            let text = explorer
                .call("gesture", &json!({ "type": "tap", "target": "Home" }))
                .await;
            let outcome: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(outcome["action"], "tap");
            assert_eq!(outcome["navigationOccurred"], false);
            let page = explorer.session().page("Home").unwrap();
            assert_eq!(page.element("Home").unwrap().coverage_level, 25);
        }

        #[tokio::test]
        async fn test_failed_gesture_recorded_as_failure() {
            let mut explorer = explorer(wiki());
            explorer.call("inspect_screen", &json!({})).await;
            let text = explorer
                .call("gesture", &json!({ "type": "tap", "target": "Settings" }))
                .await;
            assert_eq!(text, "Error: Element not found for tap: Settings");
            let page = explorer.session().page("Home").unwrap();
            assert_eq!(page.interactions().len(), 1);
            assert!(!page.interactions()[0].succeeded);
        }

        #[tokio::test]
        async fn test_scroll_with_params() {
            let mut explorer = explorer(wiki());
            let text = explorer
                .call(
                    "gesture",
                    &json!({ "type": "scroll", "params": { "direction": "up" } }),
                )
                .await;
            assert!(text.contains("Scrolled up"));
            let text = explorer
                .call(
                    "gesture",
                    &json!({ "type": "scroll", "params": { "direction": "sideways" } }),
                )
                .await;
            assert!(text.starts_with("Error: Invalid argument"));
        }

        #[tokio::test]
        async fn test_smart_action_taps_matching_element() {
            let mut explorer = explorer(wiki());
            explorer.call("inspect_screen", &json!({})).await;
            let text = explorer
                .call("smart_action", &json!({ "action": "tap search wikipedia" }))
                .await;
            let outcome: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(outcome["navigationOccurred"], true);
            assert_eq!(explorer.driver().current_screen().unwrap(), "search");

            let page = explorer.session().page("Home").unwrap();
            assert_eq!(page.interactions()[0].kind.as_str(), "tap search wikipedia");
            assert!(page.element("Search Wikipedia").unwrap().tested);
        }

        #[tokio::test]
        async fn test_partial_target_credits_resolved_element() {
            let mut explorer = explorer(wiki());
            explorer.call("inspect_screen", &json!({})).await;
            let text = explorer
                .call("gesture", &json!({ "type": "tap", "target": "Search" }))
                .await;
            let outcome: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(outcome["target"], "Search");
            assert_eq!(outcome["resolvedKey"], "Search Wikipedia");

            let page = explorer.session().page("Home").unwrap();
            assert_eq!(page.interactions()[0].target.as_deref(), Some("Search Wikipedia"));
            let element = page.element("Search Wikipedia").unwrap();
            assert!(element.tested);
            assert_eq!(element.coverage_level, 25);
        }

        #[tokio::test]
        async fn test_smart_scroll_credits_no_element() {
            let mut explorer = explorer(wiki());
            explorer.call("inspect_screen", &json!({})).await;
            let text = explorer
                .call("smart_action", &json!({ "action": "scroll the Open menu" }))
                .await;
            let outcome: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(outcome["action"], "scroll");

            let page = explorer.session().page("Home").unwrap();
            assert_eq!(page.interactions().len(), 1);
            assert_eq!(page.interactions()[0].target, None);
            let element = page.element("Open menu").unwrap();
            assert!(!element.tested);
            assert_eq!(element.coverage_level, 0);
        }

        #[tokio::test]
        async fn test_scroll_target_is_not_tracked() {
            let mut explorer = explorer(wiki());
            explorer.call("inspect_screen", &json!({})).await;
            explorer
                .call("gesture", &json!({ "type": "scroll", "target": "Home" }))
                .await;
            let page = explorer.session().page("Home").unwrap();
            assert_eq!(page.interactions()[0].target, None);
            assert!(!page.element("Home").unwrap().tested);
        }

        #[tokio::test]
        async fn test_smart_action_not_understood() {
            let mut explorer = explorer(wiki());
            explorer.call("inspect_screen", &json!({})).await;
            let text = explorer
                .call("smart_action", &json!({ "action": "open the pod bay doors" }))
                .await;
            assert_eq!(text, "Could not understand action: open the pod bay doors");
            let page = explorer.session().page("Home").unwrap();
            assert_eq!(page.interactions().len(), 1);
            assert_eq!(page.interactions()[0].target, None);
            assert!(page.interactions()[0].succeeded);
        }

        #[tokio::test]
        async fn test_finalize_and_gaps() {
            let mut explorer = explorer(wiki());
            let text = explorer.call("finalize_page", &json!({})).await;
            assert_eq!(text, "Error: No page data to finalize");

            let text = explorer.call("analyze_gaps", &json!({})).await;
            let gaps: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(gaps["scope"], "current");
            assert_eq!(gaps["error"], NOTHING_TO_ANALYZE);

            explorer.call("inspect_screen", &json!({})).await;
            let text = explorer
                .call("finalize_page", &json!({ "pageName": "Home" }))
                .await;
            let analysis: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(analysis["summary"]["total_elements"], 3);

            let text = explorer.call("analyze_gaps", &json!({ "scope": "all" })).await;
            let gaps: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(gaps["scope"], "all");
            assert_eq!(gaps["overall_coverage"], 0);
            assert_eq!(gaps["critical_gaps"].as_array().unwrap().len(), 3);
        }

        #[tokio::test]
        async fn test_generate_cucumber_defaults_to_gaps() {
            let mut explorer = explorer(wiki());
            explorer.call("inspect_screen", &json!({})).await;
            let text = explorer.call("generate_cucumber", &json!({})).await;
            assert!(text.starts_with("Generated Cucumber Features:\n\nFeature: Home Testing"));
            assert!(text.contains("Scenario: Error Handling"));

            let text = explorer
                .call("generate_cucumber", &json!({ "includeGaps": false }))
                .await;
            assert!(!text.contains("Scenario: Error Handling"));
        }
    }

    mod auth_tests {
        use super::*;

        fn webview_login() -> MockDriver {
            MockDriver::new(
                DeviceFixture::new(vec![MockScreen::new(
                    "login",
                    vec![
                        MockElement::default().with_tag("input", "email"),
                        MockElement::default().with_tag("input", "password"),
                        MockElement::text("Sign in").with_tag("button", "submit"),
                    ],
                )])
                .with_context("WEBVIEW_com.example"),
            )
        }

        #[tokio::test]
        async fn test_webview_route() {
            let mut explorer = explorer(webview_login());
            let text = explorer
                .call(
                    "handle_auth_flow",
                    &json!({ "email": "a@b.c", "password": "pw" }),
                )
                .await;
            assert_eq!(text, "Webview auth completed for a@b.c");
            let driver = explorer.driver();
            assert!(driver.was_called("switch_context:WEBVIEW_com.example"));
            assert!(driver.was_called("click:0:2"));
            assert_eq!(
                driver.history().unwrap().last().map(String::as_str),
                Some("switch_context:NATIVE_APP")
            );
            assert_eq!(
                driver.value_of(&crate::driver::ElementHandle::new("0:0")),
                Some("a@b.c".to_string())
            );
            assert_eq!(explorer.session().user_paths()[0].sub_type, "webview");
        }

        #[tokio::test]
        async fn test_native_route() {
            let driver = MockDriver::with_elements(vec![
                MockElement::default().with_resource_id("app:id/email"),
                MockElement::default().with_resource_id("app:id/password"),
                MockElement::text("Log in").with_resource_id("app:id/login"),
            ]);
            let mut explorer = explorer(driver);
            let text = explorer
                .call(
                    "handle_auth_flow",
                    &json!({ "email": "a@b.c", "password": "pw" }),
                )
                .await;
            assert_eq!(text, "Native auth completed for a@b.c");
            assert!(explorer.driver().was_called("click:0:2"));
            assert_eq!(explorer.session().user_paths()[0].sub_type, "native");
        }

        #[tokio::test]
        async fn test_failed_submit_restores_native_context() {
            let driver = MockDriver::new(
                DeviceFixture::new(vec![MockScreen::new(
                    "login",
                    vec![
                        MockElement::default().with_tag("input", "email"),
                        MockElement::default().with_tag("input", "password"),
                        MockElement::text("Sign in")
                            .with_tag("button", "submit")
                            .navigates_to("missing"),
                    ],
                )])
                .with_context("WEBVIEW_com.example"),
            );
            let mut explorer = explorer(driver);
            let text = explorer
                .call(
                    "handle_auth_flow",
                    &json!({ "email": "a@b.c", "password": "pw" }),
                )
                .await;
            assert!(text.starts_with("Error: Driver error"), "{text}");
            assert_eq!(
                explorer.driver().current_context().await.unwrap(),
                NATIVE_CONTEXT
            );
            assert_eq!(explorer.session().user_paths()[0].sub_type, "failed");
        }

        #[tokio::test]
        async fn test_missing_webview_fields_restore_native_context() {
            let driver = MockDriver::new(
                DeviceFixture::new(vec![MockScreen::new(
                    "login",
                    vec![MockElement::text("Welcome")],
                )])
                .with_context("WEBVIEW_com.example"),
            );
            let mut explorer = explorer(driver);
            let text = explorer
                .call(
                    "handle_auth_flow",
                    &json!({ "email": "a@b.c", "password": "pw" }),
                )
                .await;
            assert_eq!(text, "Error: Could not find auth elements");
            assert_eq!(
                explorer.driver().current_context().await.unwrap(),
                NATIVE_CONTEXT
            );
        }

        #[tokio::test]
        async fn test_no_auth_elements() {
            let mut explorer = explorer(wiki());
            let text = explorer
                .call(
                    "handle_auth_flow",
                    &json!({ "email": "a@b.c", "password": "pw" }),
                )
                .await;
            assert_eq!(text, "Error: Could not find auth elements");
            let paths = explorer.session().user_paths();
            assert_eq!(paths.len(), 1);
            assert_eq!(paths[0].sub_type, "failed");
            assert!(!paths[0].succeeded);
        }
    }
}
