use std::time::Duration;

use serde_json::json;
use zone_bridge::{
    BridgeError, BridgeState, BufferedShellAudit, CollisionKind, ContentNode, ContentRef,
    HandoffPhase, Logger, ManualClock, MemorySink, Severity, Shell, ShellAuditStage, ShellConfig,
    Size, Zone,
};

struct Harness {
    shell: Shell,
    clock: ManualClock,
    audit: BufferedShellAudit,
    logs: MemorySink,
}

fn harness(config: ShellConfig) -> Harness {
    let clock = ManualClock::new(10_000);
    let audit = BufferedShellAudit::new();
    let logs = MemorySink::new();
    let mut shell = Shell::new(config)
        .expect("shell")
        .with_clock(clock.clone())
        .with_audit(audit.clone())
        .with_logger(Logger::new(logs.clone()));
    shell.mount().expect("mount");
    shell
        .navigate("Home", json!({"routes": ["Home"]}))
        .expect("navigate");
    Harness {
        shell,
        clock,
        audit,
        logs,
    }
}

fn text(body: &str) -> ContentRef {
    ContentNode::text(body).into_ref()
}

fn settle(h: &mut Harness) {
    h.clock.advance(Duration::from_millis(100));
    h.shell.tick();
}

#[test]
fn every_bridge_is_ready_after_mount() {
    let h = harness(ShellConfig::default());
    for zone in Zone::ALL {
        let bridge = h.shell.bridge(zone);
        assert!(bridge.is_ready(), "{zone} not ready");
        assert_eq!(bridge.context().and_then(|c| c.current_route()), Some("Home"));
        assert_eq!(bridge.context().map(|c| c.zone), Some(zone));
    }
}

#[test]
fn phone_screen_with_center_content_is_valid() {
    let mut h = harness(ShellConfig::default());
    h.shell.inject(Zone::Center, text("Welcome")).unwrap();
    settle(&mut h);

    let result = h.shell.latest_validation().expect("validation result");
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
    assert!(result.collisions.is_empty());
    assert_eq!(
        h.shell.bridge(Zone::Center).injected_content().unwrap().body,
        "Welcome"
    );
}

#[test]
fn short_screen_reports_top_overlap() {
    let mut config = ShellConfig::default();
    config.screen = Size::new(375, 90);
    let mut h = harness(config);
    settle(&mut h);

    let result = h.shell.latest_validation().expect("validation result");
    assert!(!result.is_valid);
    let top = result
        .collisions
        .iter()
        .find(|c| c.zone == Zone::Top)
        .expect("top collision");
    assert_eq!(top.kind, CollisionKind::Overlap);
    assert_eq!(top.severity, Severity::Error);
    assert!(result.errors.contains(&top.message));
}

#[test]
fn resizing_past_the_threshold_clears_overlap() {
    let mut config = ShellConfig::default();
    config.screen = Size::new(80, 99);
    let mut h = harness(config);
    settle(&mut h);
    assert!(!h.shell.latest_validation().unwrap().is_valid);

    h.shell.resize(Size::new(80, 100)).unwrap();
    settle(&mut h);
    let result = h.shell.latest_validation().unwrap();
    assert!(result.is_valid, "{:?}", result.errors);
    assert_eq!(h.shell.validator().history_len(), 2);
}

#[test]
fn second_injection_replaces_first() {
    let mut h = harness(ShellConfig::default());
    h.shell.inject(Zone::Top, text("first")).unwrap();
    h.clock.advance(Duration::from_millis(1));
    h.shell.inject(Zone::Top, text("second")).unwrap();

    let bridge = h.shell.bridge(Zone::Top);
    assert_eq!(bridge.injected_content().unwrap().body, "second");
    assert_eq!(bridge.injection_count(), 2);
    assert_eq!(bridge.state().last_injection_at_ms, 10_001);
    assert_eq!(
        h.shell.registry().content(Zone::Top).unwrap().body,
        "second"
    );
}

#[test]
fn unmount_before_handoff_deadline_blocks_late_writes() {
    let mut h = harness(ShellConfig::default());
    let token = h.shell.renderer(Zone::Bottom).token().expect("token");
    h.shell.inject(Zone::Bottom, text("status")).unwrap();

    h.clock.advance(Duration::from_millis(50));
    h.shell.unmount_zone(Zone::Bottom).unwrap();
    let audit_len = h.audit.events().len();

    h.clock.advance(Duration::from_millis(200));
    h.shell.tick();

    let late = h.shell.renderer_mounted(token);
    assert!(matches!(late, Err(BridgeError::StaleMount { zone: Zone::Bottom, .. })));

    let bridge = h.shell.bridge(Zone::Bottom);
    assert_eq!(bridge.phase(), HandoffPhase::Unmounted);
    assert_eq!(bridge.state(), &BridgeState::default());
    assert!(
        h.audit.events()[audit_len..]
            .iter()
            .all(|event| event.zone != Some(Zone::Bottom))
    );
    assert!(h.logs.messages().contains(&"stale_mount_rejected".to_string()));
}

#[test]
fn rapid_requests_collapse_to_one_result() {
    let mut config = ShellConfig::default();
    config.debounce_ms = 100;
    let mut h = harness(config);
    settle(&mut h);
    let before = h.audit.count(ShellAuditStage::ValidationCompleted);

    for _ in 0..8 {
        h.shell.request_validation().unwrap();
        h.clock.advance(Duration::from_millis(20));
        h.shell.tick();
    }
    assert_eq!(h.audit.count(ShellAuditStage::ValidationCompleted), before);

    settle(&mut h);
    assert_eq!(h.audit.count(ShellAuditStage::ValidationCompleted), before + 1);
    assert!(h.shell.validator().history_len() <= h.shell.config().history_limit);
}

#[test]
fn renderer_handshake_delivers_current_context() {
    let mut h = harness(ShellConfig::default());
    let delivered = h.shell.announce_renderer(Zone::Center).unwrap();
    assert_eq!(delivered.zone, Zone::Center);
    assert_eq!(delivered.context.current_route(), Some("Home"));
    assert!(h.shell.renderer(Zone::Center).is_mounted());
    assert!(h.shell.bridge(Zone::Center).is_handoff_complete());

    // A second announcement is harmless.
    assert!(h.shell.announce_renderer(Zone::Center).is_ok());
    assert_eq!(h.audit.count(ShellAuditStage::HandoffCompleted), 2);
}

#[test]
fn named_injection_rejects_unknown_zone() {
    let mut h = harness(ShellConfig::default());
    let err = h.shell.inject_named("sidebar", text("x")).unwrap_err();
    assert!(matches!(err, BridgeError::UnknownZone(name) if name == "sidebar"));
    h.shell.inject_named(" Bottom ", text("ok")).unwrap();
    assert_eq!(h.shell.bridge(Zone::Bottom).injection_count(), 1);
}

#[test]
fn triage_is_clean_after_full_handshake() {
    let mut h = harness(ShellConfig::default());
    for zone in Zone::ALL {
        h.shell.announce_renderer(zone).unwrap();
    }
    h.shell.inject(Zone::Center, text("body")).unwrap();
    settle(&mut h);
    let report = h.shell.triage();
    assert!(report.is_clean, "{report:?}");
}
