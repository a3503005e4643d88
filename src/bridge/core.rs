use serde::Serialize;
use serde_json::json;

use crate::context::ContextSnapshot;
use crate::error::{BridgeError, Result};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::registry::ContentRef;
use crate::zone::Zone;

use super::hooks::{BridgeHooks, NoopHooks};

const TARGET: &str = "zone_bridge::bridge";

/// Observable bridge state. Empty until `initialize`, emptied again on teardown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeState {
    pub is_ready: bool,
    pub injected_content: Option<ContentRef>,
    pub bridge_context: Option<ContextSnapshot>,
    pub last_injection_at_ms: u64,
    pub injection_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffPhase {
    Unmounted,
    AwaitingRenderer,
    Delivered,
}

/// Issued by `initialize`; the renderer presents it back to claim the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountToken {
    pub zone: Zone,
    pub epoch: u64,
}

/// Bridge reply to a renderer's mount announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextDelivered {
    pub zone: Zone,
    pub epoch: u64,
    pub context: ContextSnapshot,
}

pub struct Bridge {
    zone: Zone,
    state: BridgeState,
    phase: HandoffPhase,
    epoch: u64,
    hooks: Box<dyn BridgeHooks>,
    logger: Option<Logger>,
}

impl Bridge {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            state: BridgeState::default(),
            phase: HandoffPhase::Unmounted,
            epoch: 0,
            hooks: Box::new(NoopHooks),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn set_logger(&mut self, logger: Option<Logger>) {
        self.logger = logger;
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn BridgeHooks>) {
        self.hooks = hooks;
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    pub fn phase(&self) -> HandoffPhase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready
    }

    pub fn is_handoff_complete(&self) -> bool {
        self.phase == HandoffPhase::Delivered
    }

    pub fn injection_count(&self) -> u64 {
        self.state.injection_count
    }

    /// Content the renderer should draw. `None` until the bridge is ready.
    pub fn injected_content(&self) -> Option<&ContentRef> {
        if self.state.is_ready {
            self.state.injected_content.as_ref()
        } else {
            None
        }
    }

    pub fn context(&self) -> Option<&ContextSnapshot> {
        self.state.bridge_context.as_ref()
    }

    /// Bring the bridge up with `context`, seeding any content the registry
    /// already holds for this zone. Calling it again on a ready bridge only
    /// refreshes the context; the mount token and injection count survive.
    pub fn initialize(&mut self, context: ContextSnapshot, seed: Option<ContentRef>) -> MountToken {
        if self.state.is_ready {
            self.state.bridge_context = Some(context.clone());
            self.hooks.on_bridge_ready(self.zone, &context);
            self.log(
                LogLevel::Debug,
                "bridge_reinitialized",
                [json_kv("route", json!(context.current_route()))],
            );
            return self.token();
        }

        self.epoch += 1;
        let last_injection_at_ms = if seed.is_some() {
            context.timestamp_ms
        } else {
            0
        };
        self.state = BridgeState {
            is_ready: true,
            injected_content: seed,
            bridge_context: Some(context.clone()),
            last_injection_at_ms,
            injection_count: self.state.injection_count,
        };
        self.phase = HandoffPhase::AwaitingRenderer;
        self.hooks.on_bridge_ready(self.zone, &context);
        self.log(
            LogLevel::Info,
            "bridge_initialized",
            [
                json_kv("epoch", json!(self.epoch)),
                json_kv("route", json!(context.current_route())),
                json_kv("seeded", json!(self.state.injected_content.is_some())),
            ],
        );
        self.token()
    }

    /// Replace the delivered context without touching content or counts.
    pub fn refresh_context(&mut self, context: ContextSnapshot) -> Result<()> {
        if !self.state.is_ready {
            return Err(BridgeError::NotReady(self.zone));
        }
        let route = context.current_route().map(str::to_string);
        self.state.bridge_context = Some(context);
        self.log(
            LogLevel::Debug,
            "context_updated",
            [json_kv("route", json!(route))],
        );
        Ok(())
    }

    /// Overwrite the zone's content. Returns the new injection count.
    pub fn inject(&mut self, content: ContentRef, now_ms: u64) -> Result<u64> {
        if !self.state.is_ready {
            return Err(BridgeError::NotReady(self.zone));
        }
        self.state.injection_count += 1;
        self.state.last_injection_at_ms = now_ms;
        self.hooks.on_content_injected(self.zone, &content);
        self.log(
            LogLevel::Debug,
            "content_injected",
            [
                json_kv("key", json!(content.key)),
                json_kv("count", json!(self.state.injection_count)),
            ],
        );
        self.state.injected_content = Some(content);
        Ok(self.state.injection_count)
    }

    /// Renderer side of the handshake: "mounted". Answers with the context.
    pub fn renderer_mounted(&mut self, token: MountToken) -> Result<ContextDelivered> {
        if token.zone != self.zone || !self.state.is_ready || token.epoch != self.epoch {
            self.log(
                LogLevel::Warn,
                "stale_mount_rejected",
                [
                    json_kv("token_zone", json!(token.zone.as_str())),
                    json_kv("token_epoch", json!(token.epoch)),
                    json_kv("epoch", json!(self.epoch)),
                ],
            );
            return Err(BridgeError::StaleMount {
                zone: self.zone,
                token_epoch: token.epoch,
                current_epoch: self.epoch,
            });
        }
        let context = self
            .state
            .bridge_context
            .clone()
            .ok_or(BridgeError::NotReady(self.zone))?;
        self.complete_handoff()?;
        Ok(ContextDelivered {
            zone: self.zone,
            epoch: self.epoch,
            context,
        })
    }

    /// Mark the handoff done. Idempotent once delivered.
    pub fn complete_handoff(&mut self) -> Result<()> {
        if !self.state.is_ready {
            return Err(BridgeError::NotReady(self.zone));
        }
        if self.phase == HandoffPhase::Delivered {
            return Ok(());
        }
        self.phase = HandoffPhase::Delivered;
        self.hooks.on_handoff_complete(self.zone);
        self.log(
            LogLevel::Info,
            "handoff_completed",
            [json_kv("epoch", json!(self.epoch))],
        );
        Ok(())
    }

    /// Reset to the empty shape. Counts and context are discarded.
    pub fn teardown(&mut self) {
        let discarded = self.state.injection_count;
        self.state = BridgeState::default();
        self.phase = HandoffPhase::Unmounted;
        self.log(
            LogLevel::Info,
            "bridge_torn_down",
            [json_kv("discarded_injections", json!(discarded))],
        );
    }

    fn token(&self) -> MountToken {
        MountToken {
            zone: self.zone,
            epoch: self.epoch,
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let mut event = event_with_fields(level, TARGET, message, fields);
            event
                .fields
                .insert("zone".to_string(), json!(self.zone.as_str()));
            let _ = logger.log_event(event);
        }
    }
}
