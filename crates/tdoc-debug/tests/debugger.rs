//! Debugger sessions against scripted hosts

use std::time::Duration;

use tdoc_debug::{
    DebugConfig, DebugReport, Debugger, PerformanceMetric, ProfileSummary, RunOutcome,
    SessionState,
};
use tdoc_test_utils::{sample_screen, Ending, MockWidget, ScriptedApp, Step};

fn app() -> ScriptedApp {
    ScriptedApp::new("DemoApp")
        .with_root(sample_screen())
        .with_handlers(&["on_mount", "on_button_pressed", "compose"])
        .step(Step::new("on_mount", "Mount"))
        .step(Step::new("on_button_pressed", "Pressed").taking(Duration::from_millis(20)))
        .step(Step::new("on_key", "Key"))
}

#[tokio::test]
async fn traced_run_records_every_dispatch() {
    let config = DebugConfig::new().with_trace_events(true);
    let mut host = app();
    let mut debugger = Debugger::new(&config);

    let session = debugger.start(&mut host).await.unwrap();

    assert_eq!(debugger.state(), SessionState::ReportReady);
    assert_eq!(session.outcome, Some(RunOutcome::Exited));
    assert!(session.live);
    let handlers: Vec<&str> = session.events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(handlers, vec!["on_mount", "on_button_pressed", "on_key"]);
    assert_eq!(session.events[1].target, "DemoApp");
    assert_eq!(
        session.events[1].data.get("type").and_then(|v| v.as_str()),
        Some("Pressed")
    );
    assert_eq!(session.tree.len(), sample_screen().count());
}

#[tokio::test]
async fn instrumentation_is_transparent() {
    let mut plain = app();
    let config = DebugConfig::new();
    Debugger::new(&config).start(&mut plain).await.unwrap();

    let mut traced = app();
    let config = DebugConfig::new().with_trace_events(true).with_profiling(true);
    Debugger::new(&config).start(&mut traced).await.unwrap();

    assert_eq!(plain.invocations(), traced.invocations());
    assert_eq!(traced.installed_hooks(), 0);
}

#[tokio::test]
async fn untraced_run_records_nothing() {
    let config = DebugConfig::new();
    let mut host = app();
    let session = Debugger::new(&config).start(&mut host).await.unwrap();
    assert!(session.events.is_empty());
    assert_eq!(session.profile, ProfileSummary::Disabled);
}

#[tokio::test]
async fn handler_inventory_uses_prefix() {
    let config = DebugConfig::new();
    let mut host = app();
    let session = Debugger::new(&config).start(&mut host).await.unwrap();

    let names: Vec<&str> = session.handlers.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["on_mount", "on_button_pressed"]);
    assert_eq!(session.handlers[1].event_tag.as_deref(), Some("button"));
}

#[tokio::test]
async fn interrupt_still_reports() {
    let config = DebugConfig::new().with_trace_events(true);
    let mut host = app().ending(Ending::Interrupt);
    let mut debugger = Debugger::new(&config);

    let session = debugger.start(&mut host).await.unwrap();

    assert_eq!(session.outcome, Some(RunOutcome::Interrupted));
    assert!(session.failures.is_empty());
    assert_eq!(session.events.len(), 3);
    assert_eq!(debugger.state(), SessionState::ReportReady);
}

#[tokio::test]
async fn interrupt_inside_handler_keeps_profile() {
    let config = DebugConfig::new().with_trace_events(true).with_profiling(true);
    let mut host = app().ending(Ending::InterruptInside(Step::new("on_key", "Key")));

    let session = Debugger::new(&config).start(&mut host).await.unwrap();

    assert_eq!(session.outcome, Some(RunOutcome::Interrupted));
    assert_eq!(session.events.len(), 4);
    let ProfileSummary::Metrics(metrics) = &session.profile else {
        panic!("expected metrics, got {:?}", session.profile);
    };
    let key = metrics.iter().find(|m| m.function_name == "on_key").unwrap();
    assert_eq!(key.call_count, 2);
    assert!(metrics.iter().any(|m| m.function_name == "DemoApp.run"));
}

#[tokio::test]
async fn failure_is_captured() {
    let config = DebugConfig::new();
    let mut host = app().ending(Ending::Fail {
        message: "KeyError: 'missing'".to_string(),
        trace: "Traceback (most recent call last): ...".to_string(),
    });

    let session = Debugger::new(&config).start(&mut host).await.unwrap();

    assert!(session.crashed());
    assert_eq!(session.failures.len(), 1);
    assert_eq!(session.failures[0].message, "KeyError: 'missing'");

    let text = DebugReport::new("app.py", &session, &config).generate_text();
    assert!(text.contains("ERRORS DETECTED"));
    assert!(text.contains("Verify all widget IDs exist"));
}

#[tokio::test]
async fn panic_is_captured() {
    let config = DebugConfig::new().with_profiling(true);
    let mut host = app().ending(Ending::Panic("handler exploded".to_string()));

    let session = Debugger::new(&config).start(&mut host).await.unwrap();

    assert!(session.crashed());
    assert_eq!(session.failures[0].message, "Panic: handler exploded");
    assert!(matches!(session.profile, ProfileSummary::Metrics(_)));
}

#[tokio::test]
async fn iterations_rerun_under_one_profiler() {
    let config = DebugConfig::new().with_profiling(true).with_iterations(3);
    let mut host = app();

    let session = Debugger::new(&config).start(&mut host).await.unwrap();

    assert_eq!(host.runs(), 3);
    assert_eq!(session.runs, 3);
    let ProfileSummary::Metrics(metrics) = &session.profile else {
        panic!("expected metrics, got {:?}", session.profile);
    };
    let run = metrics.iter().find(|m| m.function_name == "DemoApp.run").unwrap();
    assert_eq!(run.call_count, 3);
    let pressed = metrics
        .iter()
        .find(|m| m.function_name == "on_button_pressed")
        .unwrap();
    assert_eq!(pressed.call_count, 3);
    assert!((pressed.total_time - 0.06).abs() < 1e-9);
}

#[tokio::test]
async fn host_profile_rows_are_reported() {
    let config = DebugConfig::new().with_profiling(true).with_iterations(2);
    let row = PerformanceMetric {
        function_name: "app.py:40(refresh_table)".to_string(),
        call_count: 5,
        total_time: 1.5,
        per_call_time: 0.3,
        cumulative_time: 2.0,
    };
    let mut host = app().with_host_profile(vec![row]);

    let session = Debugger::new(&config).start(&mut host).await.unwrap();

    let ProfileSummary::Metrics(metrics) = &session.profile else {
        panic!("expected metrics, got {:?}", session.profile);
    };
    assert_eq!(metrics[0].function_name, "app.py:40(refresh_table)");
    assert_eq!(metrics[0].call_count, 10);
    assert!((metrics[0].cumulative_time - 4.0).abs() < 1e-9);
    assert!(metrics.iter().any(|m| m.function_name == "on_mount"));
}

#[tokio::test]
async fn failed_run_stops_iterations() {
    let config = DebugConfig::new().with_iterations(3);
    let mut host = app().ending(Ending::Fail {
        message: "TypeError: bad".to_string(),
        trace: String::new(),
    });
    let session = Debugger::new(&config).start(&mut host).await.unwrap();
    assert_eq!(host.runs(), 1);
    assert_eq!(session.runs, 1);
}

#[tokio::test]
async fn partial_tree_on_broken_widget() {
    let root = MockWidget::new("Screen", 1)
        .child(MockWidget::new("Static", 2).broken().child(MockWidget::new("Label", 3)))
        .child(MockWidget::new("Footer", 4));
    let config = DebugConfig::new();
    let mut host = ScriptedApp::new("BrokenApp").with_root(root);

    let session = Debugger::new(&config).start(&mut host).await.unwrap();

    assert_eq!(session.tree.len(), 3);
    assert!(session.tree.get("Label_3").is_none());
}

#[tokio::test]
async fn debugger_runs_once() {
    let config = DebugConfig::new();
    let mut host = app();
    let mut debugger = Debugger::new(&config);
    debugger.start(&mut host).await.unwrap();
    assert!(debugger.start(&mut host).await.is_err());
}
