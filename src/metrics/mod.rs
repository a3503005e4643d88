use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct ShellMetrics {
    injections: u64,
    rejected_injections: u64,
    notifications: u64,
    validations_requested: u64,
    validations_completed: u64,
    validations_superseded: u64,
    validations_stale: u64,
    handoffs_completed: u64,
    handoffs_overdue: u64,
    renders: u64,
    zones_rendered: u64,
}

impl ShellMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_injection(&mut self, delivered: bool) {
        self.injections = self.injections.saturating_add(1);
        if !delivered {
            self.rejected_injections = self.rejected_injections.saturating_add(1);
        }
    }

    pub fn record_notification(&mut self) {
        self.notifications = self.notifications.saturating_add(1);
    }

    pub fn record_validation_requested(&mut self, superseded_previous: bool) {
        self.validations_requested = self.validations_requested.saturating_add(1);
        if superseded_previous {
            self.validations_superseded = self.validations_superseded.saturating_add(1);
        }
    }

    pub fn record_validation_completed(&mut self) {
        self.validations_completed = self.validations_completed.saturating_add(1);
    }

    pub fn record_validation_stale(&mut self) {
        self.validations_stale = self.validations_stale.saturating_add(1);
    }

    pub fn record_handoff(&mut self) {
        self.handoffs_completed = self.handoffs_completed.saturating_add(1);
    }

    pub fn record_handoff_overdue(&mut self) {
        self.handoffs_overdue = self.handoffs_overdue.saturating_add(1);
    }

    pub fn record_render(&mut self, zone_count: usize) {
        self.renders = self.renders.saturating_add(1);
        self.zones_rendered = self.zones_rendered.saturating_add(zone_count as u64);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            injections: self.injections,
            rejected_injections: self.rejected_injections,
            notifications: self.notifications,
            validations_requested: self.validations_requested,
            validations_completed: self.validations_completed,
            validations_superseded: self.validations_superseded,
            validations_stale: self.validations_stale,
            handoffs_completed: self.handoffs_completed,
            handoffs_overdue: self.handoffs_overdue,
            renders: self.renders,
            zones_rendered: self.zones_rendered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub injections: u64,
    pub rejected_injections: u64,
    pub notifications: u64,
    pub validations_requested: u64,
    pub validations_completed: u64,
    pub validations_superseded: u64,
    pub validations_stale: u64,
    pub handoffs_completed: u64,
    pub handoffs_overdue: u64,
    pub renders: u64,
    pub zones_rendered: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "shell_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        match json!(self) {
            serde_json::Value::Object(map) => map,
            _ => LogFields::new(),
        }
    }
}
