use std::sync::{Arc, Mutex};

use crate::context::ContextSnapshot;
use crate::registry::ContentRef;
use crate::zone::Zone;

/// Lifecycle callbacks fired by a [`Bridge`](super::Bridge).
pub trait BridgeHooks: Send {
    fn on_bridge_ready(&mut self, _zone: Zone, _context: &ContextSnapshot) {}

    fn on_content_injected(&mut self, _zone: Zone, _content: &ContentRef) {}

    fn on_handoff_complete(&mut self, _zone: Zone) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl BridgeHooks for NoopHooks {}

/// Hook invocation captured by [`RecordingHooks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    Ready { zone: Zone, route: Option<String> },
    Injected { zone: Zone, key: String },
    HandoffComplete { zone: Zone },
}

/// Records every hook call. Clones share one log, so a single instance can
/// be handed to several bridges.
#[derive(Debug, Default, Clone)]
pub struct RecordingHooks {
    events: Arc<Mutex<Vec<HookEvent>>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: HookEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}

impl BridgeHooks for RecordingHooks {
    fn on_bridge_ready(&mut self, zone: Zone, context: &ContextSnapshot) {
        self.push(HookEvent::Ready {
            zone,
            route: context.current_route().map(str::to_string),
        });
    }

    fn on_content_injected(&mut self, zone: Zone, content: &ContentRef) {
        self.push(HookEvent::Injected {
            zone,
            key: content.key.clone(),
        });
    }

    fn on_handoff_complete(&mut self, zone: Zone) {
        self.push(HookEvent::HandoffComplete { zone });
    }
}
