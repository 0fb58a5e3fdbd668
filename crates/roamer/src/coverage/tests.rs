//! Coverage session tests

#![allow(clippy::redundant_clone)]

use super::*;
use crate::gesture::GestureKind;
use crate::identity::{PagePredicate, PageRule};
use crate::screen::RenderContext;

fn snapshot(elements: Vec<ScreenElement>) -> Snapshot {
    Snapshot {
        context: RenderContext::Native,
        available_contexts: vec!["NATIVE_APP".to_string()],
        current_page: String::new(),
        page_signature: String::new(),
        clickable_count: elements.iter().filter(|e| e.is_clickable).count(),
        auth_detected: false,
        suggestions: Vec::new(),
        elements,
        source_excerpt: None,
    }
}

/// Session that files anything mentioning "Search" under "Home"
fn search_home_session() -> CoverageSession {
    CoverageSession::new().with_rules(
        PageRules::default()
            .with_priority_rule(PageRule::new(PagePredicate::contains("Search"), "Home")),
    )
}

// ============================================================================
// Page tracking
// ============================================================================

mod track_screen_tests {
    use super::*;

    #[test]
    fn test_creates_record_lazily() {
        let mut session = CoverageSession::new();
        assert!(session.pages().is_empty());
        let name = session.track_screen(&snapshot(vec![ScreenElement::new("Dashboard")]));
        assert_eq!(name, "Home");
        assert_eq!(session.pages().len(), 1);
        assert_eq!(session.page("Home").unwrap().total_elements(), 1);
    }

    #[test]
    fn test_merge_never_overwrites_state() {
        let mut session = search_home_session();
        session.track_screen(&snapshot(vec![ScreenElement::new("Search").clickable()]));
        session.track_interaction(InteractionKind::Tap, Some("Search"), Outcome::Success);
        session.track_screen(&snapshot(vec![
            ScreenElement::new("Search").clickable(),
            ScreenElement::new("Settings"),
        ]));

        let page = session.page("Home").unwrap();
        assert_eq!(page.total_elements(), 2);
        let search = page.element("Search").unwrap();
        assert!(search.tested);
        assert_eq!(search.coverage_level, 25);
    }

    #[test]
    fn test_shared_display_key_collapses() {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![
            ScreenElement::new("OK").clickable(),
            ScreenElement::new("OK").with_identifier("second_ok"),
        ]));
        assert_eq!(session.pages()[0].total_elements(), 1);
    }

    #[test]
    fn test_unkeyed_elements_skipped() {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![ScreenElement::default().clickable()]));
        assert_eq!(session.pages()[0].total_elements(), 0);
    }

    #[test]
    fn test_current_page_is_latest_visit() {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![ScreenElement::new("Home")]));
        session.track_screen(&snapshot(vec![ScreenElement::new("Login")]));
        assert_eq!(session.current_page().unwrap().name, "Login Page");
        session.track_screen(&snapshot(vec![ScreenElement::new("Home")]));
        assert_eq!(session.current_page().unwrap().name, "Home");
        assert_eq!(session.pages().len(), 2);
    }
}

// ============================================================================
// Interactions
// ============================================================================

mod interaction_tests {
    use super::*;

    /// Interactions before any screen are dropped
    #[test]
    fn test_interaction_before_screen_is_noop() {
        let mut session = CoverageSession::new();
        let recorded = session.track_interaction(GestureKind::Tap, Some("Search"), Outcome::Success);
        assert!(!recorded);
        assert!(session.pages().is_empty());
        assert!(session.current_page().is_none());
    }

    #[test]
    fn test_level_caps_at_100() {
        let mut session = search_home_session();
        session.track_screen(&snapshot(vec![ScreenElement::new("Search").clickable()]));
        for _ in 0..6 {
            session.track_interaction(InteractionKind::Tap, Some("Search"), Outcome::Success);
        }
        let element = session.page("Home").unwrap().element("Search").unwrap();
        assert_eq!(element.coverage_level, 100);
        assert_eq!(element.test_scenarios.len(), 6);
    }

    #[test]
    fn test_failure_marks_tested_without_level() {
        let mut session = search_home_session();
        session.track_screen(&snapshot(vec![ScreenElement::new("Search").clickable()]));
        session.track_interaction(InteractionKind::Tap, Some("Search"), Outcome::Failure);
        let element = session.page("Home").unwrap().element("Search").unwrap();
        assert!(element.tested);
        assert_eq!(element.coverage_level, 0);
        assert!(!element.test_scenarios[0].succeeded);
    }

    #[test]
    fn test_untracked_target_still_logged() {
        let mut session = search_home_session();
        session.track_screen(&snapshot(vec![ScreenElement::new("Search").clickable()]));
        session.track_interaction(InteractionKind::Scroll, None, Outcome::Success);
        session.track_interaction(
            InteractionKind::Action("open the drawer".into()),
            Some("Drawer"),
            Outcome::Success,
        );
        let page = session.page("Home").unwrap();
        assert_eq!(page.interactions().len(), 2);
        assert_eq!(page.interactions()[1].kind.as_str(), "open the drawer");
        assert_eq!(page.tested_elements(), 0);
    }

    #[test]
    fn test_outcome_from_payload() {
        assert_eq!(Outcome::from_payload("Error: boom"), Outcome::Failure);
        assert_eq!(Outcome::from_payload(r#"{"action":"tap"}"#), Outcome::Success);
    }

    #[test]
    fn test_kind_round_trips_through_string() {
        assert_eq!(InteractionKind::from("long_press".to_string()), InteractionKind::LongPress);
        assert_eq!(
            InteractionKind::from("wave".to_string()),
            InteractionKind::Action("wave".into())
        );
    }
}

// ============================================================================
// Finalize and gap reports
// ============================================================================

mod finalize_tests {
    use super::*;

    #[test]
    fn test_untested_clickable_is_high_priority_gap() {
        let mut session = search_home_session();
        session.track_screen(&snapshot(vec![ScreenElement::new("Search").clickable()]));
        let analysis = session.finalize_page(Some("Home")).unwrap();

        assert_eq!(analysis.summary.total_elements, 1);
        assert_eq!(analysis.summary.tested_elements, 0);
        assert_eq!(analysis.summary.coverage_percentage, 0);
        assert_eq!(analysis.gaps.untested_elements.len(), 1);
        let gap = &analysis.gaps.untested_elements[0];
        assert_eq!(gap.element, "Search");
        assert_eq!(gap.priority, Priority::High);
        assert_eq!(gap.role, ElementRole::Interactive);
        assert!(session.page("Home").unwrap().finalized);
        assert!(session.page("Home").unwrap().finalized_at.is_some());
    }

    #[test]
    fn test_tap_closes_gap() {
        let mut session = search_home_session();
        session.track_screen(&snapshot(vec![ScreenElement::new("Search").clickable()]));
        session.track_interaction(InteractionKind::Tap, Some("Search"), Outcome::Success);
        let analysis = session.finalize_page(Some("Home")).unwrap();
        assert_eq!(analysis.summary.coverage_percentage, 100);
        assert!(analysis.gaps.untested_elements.is_empty());
        assert_eq!(analysis.interactions_tested, vec!["tap"]);
    }

    #[test]
    fn test_error_scenarios_flag() {
        let mut session = search_home_session();
        session.track_screen(&snapshot(vec![ScreenElement::new("Search").clickable()]));
        session.track_interaction(InteractionKind::Tap, Some("Search"), Outcome::Success);
        let gaps = session.finalize_page(None).unwrap().gaps;
        assert_eq!(gaps.error_scenarios.len(), 1);
        assert_eq!(gaps.error_scenarios[0].kind, "no_error_testing");

        session.track_interaction(InteractionKind::Tap, Some("Missing"), Outcome::Failure);
        let gaps = session.finalize_page(None).unwrap().gaps;
        assert!(gaps.error_scenarios.is_empty());
    }

    #[test]
    fn test_finalize_without_pages_fails() {
        let mut session = CoverageSession::new();
        let err = session.finalize_page(Some("Nowhere")).unwrap_err();
        assert!(matches!(err, RoamerError::NoPageData));
        assert_eq!(err.to_string(), "No page data to finalize");
    }

    #[test]
    fn test_unknown_name_falls_back_to_current() {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![ScreenElement::new("Home")]));
        let analysis = session.finalize_page(Some("Checkout")).unwrap();
        assert_eq!(analysis.page, "Home");
    }

    #[test]
    fn test_input_fields_need_validation() {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![
            ScreenElement::new("Email").with_tag_kind("android.widget.EditText"),
            ScreenElement::new("Submit").clickable(),
        ]));
        for _ in 0..2 {
            session.track_interaction(InteractionKind::Tap, Some("Email"), Outcome::Success);
        }
        let analysis = session.finalize_page(None).unwrap();
        assert_eq!(analysis.page, "Auth Form");
        assert_eq!(analysis.gaps.missing_validations.len(), 1);
        assert_eq!(analysis.gaps.missing_validations[0].element, "Email");
        assert_eq!(analysis.gaps.missing_validations[0].missing.len(), 4);

        session.track_interaction(InteractionKind::Tap, Some("Email"), Outcome::Success);
        let analysis = session.finalize_page(None).unwrap();
        assert!(analysis.gaps.missing_validations.is_empty());
    }

    #[test]
    fn test_suggestions_and_risks() {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![
            ScreenElement::new("Home").clickable(),
            ScreenElement::new("Welcome"),
        ]));
        let analysis = session.finalize_page(None).unwrap();

        let categories: Vec<&str> = analysis
            .suggestions
            .iter()
            .map(|s| s.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Element Coverage", "Error Handling"]);
        assert_eq!(
            analysis.suggestions[0].actions,
            vec!["Test Home (interactive)", "Test Welcome (display)"]
        );

        let risk_categories: Vec<&str> =
            analysis.risks.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(risk_categories, vec!["functionality", "reliability", "compliance"]);
        assert_eq!(
            analysis.risks[0].description,
            "1 critical elements/validations not tested"
        );
    }

    #[test]
    fn test_accessibility_reminder_always_present() {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![]));
        let analysis = session.finalize_page(None).unwrap();
        assert_eq!(analysis.gaps.accessibility_gaps.len(), 1);
        assert_eq!(analysis.gaps.accessibility_gaps[0].kind, "screen_reader");
    }
}

// ============================================================================
// Gap analysis
// ============================================================================

mod analyze_gaps_tests {
    use super::*;

    #[test]
    fn test_current_without_pages() {
        let session = CoverageSession::new();
        assert_eq!(
            session.analyze_gaps(GapScope::Current),
            GapAnalysis::NothingToAnalyze
        );
    }

    #[test]
    fn test_all_without_elements_is_zero() {
        let session = CoverageSession::new();
        let GapAnalysis::All(global) = session.analyze_gaps(GapScope::All) else {
            panic!("expected global analysis");
        };
        assert_eq!(global.overall_coverage, 0);
        assert!(global.critical_gaps.is_empty());
        assert!(global.next_actions.is_empty());
    }

    #[test]
    fn test_all_buckets_and_actions() {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![
            ScreenElement::new("Home").clickable(),
            ScreenElement::new("Feed").clickable(),
            ScreenElement::new("Banner"),
        ]));
        session.track_interaction(InteractionKind::Tap, Some("Home"), Outcome::Success);
        session.track_screen(&snapshot(vec![
            ScreenElement::new("Login").clickable(),
            ScreenElement::new("Forgot").clickable(),
            ScreenElement::new("Help").clickable(),
        ]));
        session.finalize_page(Some("Login Page")).unwrap();

        let GapAnalysis::All(global) = session.analyze_gaps(GapScope::All) else {
            panic!("expected global analysis");
        };
        assert_eq!(global.overall_coverage, 17);
        assert_eq!(
            global.critical_gaps,
            vec![
                "Home: Feed",
                "Login Page: Login",
                "Login Page: Forgot",
                "Login Page: Help"
            ]
        );
        assert_eq!(global.medium_gaps, vec!["Home: Banner"]);
        assert!(global.low_priority_gaps.is_empty());
        assert_eq!(
            global.next_actions,
            vec![
                "HIGH PRIORITY: Address 4 critical gaps",
                "- Test Home: Feed",
                "- Test Login Page: Login",
                "- Test Login Page: Forgot",
                "MEDIUM PRIORITY: Address 1 medium gaps",
            ]
        );
        assert_eq!(
            global.recommendations,
            vec![
                "Complete testing for 1 pages: Home",
                "Improve coverage for: Home, Login Page",
            ]
        );
    }

    #[test]
    fn test_all_fully_tested_is_hundred() {
        let mut session = CoverageSession::new();
        session.track_screen(&snapshot(vec![ScreenElement::new("Home").clickable()]));
        session.track_interaction(InteractionKind::Tap, Some("Home"), Outcome::Success);
        let GapAnalysis::All(global) = session.analyze_gaps(GapScope::All) else {
            panic!("expected global analysis");
        };
        assert_eq!(global.overall_coverage, 100);
    }

    #[test]
    fn test_user_paths_reported() {
        let mut session = CoverageSession::new();
        session.track_auth_flow("webview", true);
        let GapAnalysis::All(global) = session.analyze_gaps(GapScope::All) else {
            panic!("expected global analysis");
        };
        assert_eq!(global.user_paths.len(), 1);
        assert_eq!(global.user_paths[0].kind, "authentication");
        assert_eq!(global.user_paths[0].sub_type, "webview");
    }

    #[test]
    fn test_threshold_from_config() {
        let config = ExplorerConfig {
            low_coverage_threshold: 0,
            ..ExplorerConfig::default()
        };
        let mut session = CoverageSession::new().with_config(&config);
        session.track_screen(&snapshot(vec![ScreenElement::new("Home")]));
        let GapAnalysis::All(global) = session.analyze_gaps(GapScope::All) else {
            panic!("expected global analysis");
        };
        assert_eq!(global.recommendations, vec!["Complete testing for 1 pages: Home"]);
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("all".parse::<GapScope>().unwrap(), GapScope::All);
        assert!("everything".parse::<GapScope>().is_err());
        assert_eq!(GapScope::default(), GapScope::Current);
    }
}

mod session_tests {
    use super::*;

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(CoverageSession::new().id(), CoverageSession::new().id());
    }

    #[test]
    fn test_created_at_is_recent() {
        let session = CoverageSession::new();
        assert!(Utc::now() >= session.created_at());
    }
}
