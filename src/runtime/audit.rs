//! Shell lifecycle audit hooks.
//!
//! Records capture a stage plus structured details so callers can buffer,
//! log, or display the shell's progression without touching the core loop.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde_json::Value;

use crate::zone::Zone;

/// Lifecycle checkpoints emitted by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAuditStage {
    /// Registry, bridges and validator came up.
    ShellMounted,
    /// A bridge received its context.
    BridgeInitialized,
    /// Content reached a ready bridge.
    ContentInjected,
    /// A renderer's mount announcement was answered.
    HandoffCompleted,
    /// The handoff watchdog fired before the renderer announced itself.
    HandoffOverdue,
    /// The route changed and bridges were refreshed.
    ContextPropagated,
    /// A validation pass produced a result.
    ValidationCompleted,
    /// A validation result was dropped as stale.
    ValidationDiscarded,
    /// A single zone's bridge was torn down.
    ZoneUnmounted,
    /// The whole shell was torn down.
    ShellTornDown,
}

#[derive(Debug, Clone)]
pub struct ShellAuditEvent {
    pub timestamp: SystemTime,
    pub stage: ShellAuditStage,
    pub zone: Option<Zone>,
    pub details: Vec<(String, Value)>,
}

impl ShellAuditEvent {
    fn new(stage: ShellAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            zone: None,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Builder helper to append fields ergonomically.
pub struct ShellAuditEventBuilder {
    event: ShellAuditEvent,
}

impl ShellAuditEventBuilder {
    pub fn new(stage: ShellAuditStage) -> Self {
        Self {
            event: ShellAuditEvent::new(stage),
        }
    }

    pub fn zone(mut self, zone: Zone) -> Self {
        self.event.zone = Some(zone);
        self
    }

    pub fn detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> ShellAuditEvent {
        self.event
    }
}

/// Trait implemented by any audit sink.
pub trait ShellAudit: Send + Sync {
    fn record(&self, event: ShellAuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullShellAudit;

impl ShellAudit for NullShellAudit {
    fn record(&self, _event: ShellAuditEvent) {}
}

/// Keeps every record in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferedShellAudit {
    events: Arc<Mutex<Vec<ShellAuditEvent>>>,
}

impl BufferedShellAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ShellAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<ShellAuditStage> {
        self.events().into_iter().map(|e| e.stage).collect()
    }

    pub fn count(&self, stage: ShellAuditStage) -> usize {
        self.events().iter().filter(|e| e.stage == stage).count()
    }
}

impl ShellAudit for BufferedShellAudit {
    fn record(&self, event: ShellAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
