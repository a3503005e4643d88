use std::io;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;
use zone_bridge::{
    ContentNode, Logger, ManualClock, NullSink, Result, Shell, ShellConfig, ShellEvent, Size,
    Zone,
};

fn shell_session_script(c: &mut Criterion) {
    let script = session_events();
    c.bench_function("shell_session_script", |b| {
        b.iter(|| {
            let mut shell = build_shell().expect("shell");
            let mut sink = io::sink();
            shell
                .run_scripted(&mut sink, black_box(script.clone()))
                .expect("scripted run");
        });
    });
}

fn shell_validation_burst(c: &mut Criterion) {
    let script = validation_burst();
    c.bench_function("shell_validation_burst", |b| {
        b.iter(|| {
            let mut shell = build_shell().expect("shell");
            let mut sink = io::sink();
            shell
                .run_scripted(&mut sink, black_box(script.clone()))
                .expect("scripted run");
        });
    });
}

fn build_shell() -> Result<Shell> {
    let mut config = ShellConfig::default();
    config.enable_context_bridge = true;
    config
        .slot_overrides
        .insert(Zone::Top, "Zone Bridge Bench".to_string());
    Ok(Shell::new(config)?
        .with_clock(ManualClock::new(0))
        .with_logger(Logger::new(NullSink)))
}

fn session_events() -> Vec<ShellEvent> {
    let mut events = vec![
        ShellEvent::Navigate {
            route: "Home".to_string(),
            state: json!({"routes": ["Home", "Settings"]}),
        },
        ShellEvent::RendererMounted(Zone::Top),
        ShellEvent::RendererMounted(Zone::Center),
        ShellEvent::RendererMounted(Zone::Bottom),
    ];
    for index in 0..20 {
        events.push(ShellEvent::Inject {
            zone: Zone::Center,
            content: ContentNode::text(format!("message #{index}\nrendered into center"))
                .into_ref(),
        });
        events.push(ShellEvent::InjectNamed {
            zone: "bottom".to_string(),
            content: ContentNode::text(format!("{index} messages")).into_ref(),
        });
    }
    events.push(ShellEvent::Wait(Duration::from_millis(100)));
    events.push(ShellEvent::UnmountZone(Zone::Bottom));
    events.push(ShellEvent::RemountZone(Zone::Bottom));
    events.push(ShellEvent::RendererMounted(Zone::Bottom));
    events.push(ShellEvent::Wait(Duration::from_millis(100)));
    events
}

fn validation_burst() -> Vec<ShellEvent> {
    let mut events = Vec::with_capacity(210);
    for step in 0..100u16 {
        events.push(ShellEvent::Resize(Size::new(80, 60 + step)));
        events.push(ShellEvent::Wait(Duration::from_millis(10)));
    }
    events.push(ShellEvent::Wait(Duration::from_millis(100)));
    events
}

criterion_group!(benches, shell_session_script, shell_validation_burst);
criterion_main!(benches);
