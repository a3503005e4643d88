//! The shell: owner of the registry, bridges, renderers and validator.
//!
//! Everything runs on the caller's thread. Time only moves through the
//! injected [`Clock`]; timers fire when [`Shell::tick`] is called.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use crate::bridge::{Bridge, BridgeHooks, ContextDelivered, MountToken};
use crate::clock::{Clock, SystemClock};
use crate::config::ShellConfig;
use crate::context::{
    AppState, ContextPropagator, ContextUpdate, NavigationContext, ThemeContext, UserContext,
};
use crate::error::{BridgeError, Result};
use crate::geometry::{Insets, Size};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::{MetricSnapshot, ShellMetrics};
use crate::registry::{ContentNode, ContentRef, ZoneRegistry};
use crate::render::ZoneRenderer;
use crate::scheduler::{TimerHandle, TimerQueue};
use crate::validation::{
    HydrationStatus, StructureValidator, ValidationInputs, ValidationOutcome, ValidationResult,
};
use crate::zone::{Zone, ZoneMap};

pub mod audit;
mod triage;

pub use triage::TriageReport;

use audit::{NullShellAudit, ShellAudit, ShellAuditEventBuilder, ShellAuditStage};

const TARGET: &str = "zone_bridge::shell";
const METRICS_TARGET: &str = "zone_bridge::metrics";

/// Payload carried by the shell's timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellTimer {
    Validation { generation: u64 },
    HandoffWatchdog { zone: Zone, epoch: u64 },
}

/// Scripted input for [`Shell::run_scripted`].
#[derive(Debug, Clone)]
pub enum ShellEvent {
    Inject { zone: Zone, content: ContentRef },
    InjectNamed { zone: String, content: ContentRef },
    Navigate { route: String, state: Value },
    Resize(Size),
    /// The shell's own renderer for this zone announces itself.
    RendererMounted(Zone),
    UnmountZone(Zone),
    RemountZone(Zone),
    Validate,
    Wait(Duration),
}

pub struct Shell {
    config: ShellConfig,
    clock: Arc<dyn Clock>,
    logger: Option<Logger>,
    audit: Arc<dyn ShellAudit>,
    metrics: ShellMetrics,
    propagator: ContextPropagator,
    registry: ZoneRegistry,
    bridges: ZoneMap<Bridge>,
    renderers: ZoneMap<ZoneRenderer>,
    validator: StructureValidator,
    timers: TimerQueue<ShellTimer>,
    validation_timer: Option<TimerHandle>,
    handoff_timers: ZoneMap<Option<TimerHandle>>,
    overdue: ZoneMap<bool>,
    screen: Size,
    safe_area: Insets,
    mounted: bool,
    started_at_ms: u64,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Result<Self> {
        let theme = match config.theme.as_ref() {
            Some(theme) => {
                ThemeContext::new(theme.background_color.clone(), theme.border_color.clone())?
            }
            None => ThemeContext::default(),
        };
        let propagator = ContextPropagator::new()
            .with_theme(theme)
            .with_context_bridge(config.enable_context_bridge);
        let validator = StructureValidator::new(config.zone_model)
            .with_options(config.validator)
            .with_hydration_source(config.hydration_source)
            .with_history_limit(config.history_limit);

        Ok(Self {
            screen: config.screen,
            safe_area: config.safe_area,
            config,
            clock: Arc::new(SystemClock),
            logger: None,
            audit: Arc::new(NullShellAudit),
            metrics: ShellMetrics::new(),
            propagator,
            registry: ZoneRegistry::new(),
            bridges: ZoneMap::from_fn(Bridge::new),
            renderers: ZoneMap::from_fn(ZoneRenderer::new),
            validator,
            timers: TimerQueue::new(),
            validation_timer: None,
            handoff_timers: ZoneMap::default(),
            overdue: ZoneMap::default(),
            mounted: false,
            started_at_ms: 0,
        })
    }

    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Attach a logger. The config's `log_level` becomes its floor.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        let logger = logger.with_min_level(self.config.log_level);
        for (_, bridge) in self.bridges.iter_mut() {
            bridge.set_logger(Some(logger.clone()));
        }
        self.validator.set_logger(Some(logger.clone()));
        self.logger = Some(logger);
        self
    }

    pub fn with_audit<A>(mut self, audit: A) -> Self
    where
        A: ShellAudit + 'static,
    {
        self.audit = Arc::new(audit);
        self
    }

    /// Install a clone of `hooks` on every bridge.
    pub fn with_bridge_hooks<H>(mut self, hooks: H) -> Self
    where
        H: BridgeHooks + Clone + 'static,
    {
        for (_, bridge) in self.bridges.iter_mut() {
            bridge.set_hooks(Box::new(hooks.clone()));
        }
        self
    }

    pub fn set_bridge_hooks(&mut self, zone: Zone, hooks: Box<dyn BridgeHooks>) {
        self.bridges.get_mut(zone).set_hooks(hooks);
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn screen(&self) -> Size {
        self.screen
    }

    pub fn bridge(&self, zone: Zone) -> &Bridge {
        self.bridges.get(zone)
    }

    pub fn renderer(&self, zone: Zone) -> &ZoneRenderer {
        self.renderers.get(zone)
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// Direct registry access. Writes made here bypass the bridges and show
    /// up in [`Shell::triage`] as broken projections.
    pub fn registry_mut(&mut self) -> &mut ZoneRegistry {
        &mut self.registry
    }

    pub fn propagator(&self) -> &ContextPropagator {
        &self.propagator
    }

    pub fn validator(&self) -> &StructureValidator {
        &self.validator
    }

    pub fn validator_mut(&mut self) -> &mut StructureValidator {
        &mut self.validator
    }

    pub fn latest_validation(&self) -> Option<Arc<ValidationResult>> {
        self.validator.latest()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn metrics_snapshot(&self) -> MetricSnapshot {
        let uptime = self.now_ms().saturating_sub(self.started_at_ms);
        self.metrics.snapshot(Duration::from_millis(uptime))
    }

    /// Bring the registry and every bridge up, seed slot overrides and queue
    /// the first validation. Mounting twice is a no-op.
    pub fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Ok(());
        }
        self.registry.init();
        self.mounted = true;
        self.started_at_ms = self.now_ms();

        let overrides: Vec<(Zone, String)> = self
            .config
            .slot_overrides
            .iter()
            .map(|(zone, body)| (*zone, body.clone()))
            .collect();
        for (zone, body) in overrides {
            self.registry
                .inject(zone, ContentNode::new("slot_override", body).into_ref())?;
            self.metrics.record_notification();
        }

        for zone in Zone::ALL {
            self.mount_zone(zone);
        }
        self.request_validation()?;

        self.record(ShellAuditEventBuilder::new(ShellAuditStage::ShellMounted).detail(
            "overrides",
            json!(self.config.slot_overrides.len()),
        ));
        self.log(
            LogLevel::Info,
            "shell_mounted",
            [
                json_kv("width", json!(self.screen.width)),
                json_kv("height", json!(self.screen.height)),
                json_kv("overrides", json!(self.config.slot_overrides.len())),
            ],
        );
        Ok(())
    }

    /// Tear everything down. Pending timers are cancelled first so nothing
    /// fires against the emptied state.
    pub fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        let snapshot = self.metrics_snapshot();
        self.timers.clear();
        self.validation_timer = None;
        self.handoff_timers = ZoneMap::default();
        self.overdue = ZoneMap::default();
        self.validator.reset();
        for zone in Zone::ALL {
            self.bridges.get_mut(zone).teardown();
            self.renderers.get_mut(zone).detach();
        }
        self.registry.teardown();
        self.mounted = false;

        self.record(ShellAuditEventBuilder::new(ShellAuditStage::ShellTornDown));
        if let Some(logger) = self.logger.as_ref() {
            let _ = logger.log_event(snapshot.to_log_event(METRICS_TARGET));
        }
        self.log(LogLevel::Info, "shell_torn_down", std::iter::empty());
    }

    /// Project `content` into `zone`. The registry always takes the write; the
    /// bridge only when it is ready. Content for an unmounted zone waits in
    /// the registry and seeds the bridge when the zone mounts again.
    pub fn inject(&mut self, zone: Zone, content: ContentRef) -> Result<()> {
        self.ensure_mounted()?;
        self.registry.inject(zone, Arc::clone(&content))?;
        self.metrics.record_notification();

        let now = self.now_ms();
        let bridge = self.bridges.get_mut(zone);
        if !bridge.is_ready() {
            self.metrics.record_injection(false);
            self.log_zone(
                LogLevel::Debug,
                zone,
                "injection_held",
                [json_kv("key", json!(content.key))],
            );
            return Ok(());
        }
        let count = bridge.inject(content, now)?;
        self.metrics.record_injection(true);
        self.record(
            ShellAuditEventBuilder::new(ShellAuditStage::ContentInjected)
                .zone(zone)
                .detail("count", json!(count)),
        );
        Ok(())
    }

    pub fn inject_named(&mut self, zone: &str, content: ContentRef) -> Result<()> {
        let zone = zone.parse::<Zone>()?;
        self.inject(zone, content)
    }

    /// Switch route, refresh every ready bridge and queue a validation.
    pub fn navigate(&mut self, route: impl Into<String>, state: Value) -> Result<()> {
        let navigation = NavigationContext::new(route, state)?;
        let update = self.propagator.navigate(navigation);
        self.propagate(&update)?;
        if self.mounted {
            self.request_validation()?;
        }
        Ok(())
    }

    pub fn set_theme(&mut self, theme: ThemeContext) -> Result<()> {
        let update = self.propagator.set_theme(theme);
        self.propagate(&update)
    }

    pub fn set_user(&mut self, user: UserContext) -> Result<()> {
        let update = self.propagator.set_user(user);
        self.propagate(&update)
    }

    pub fn set_app_state(&mut self, app_state: AppState) -> Result<()> {
        let update = self.propagator.set_app_state(app_state);
        self.propagate(&update)
    }

    /// Toggle the context bridge. Ready bridges get a fresh snapshot and a
    /// validation pass is queued, since hydration checks depend on the flag.
    pub fn set_context_bridge(&mut self, enabled: bool) -> Result<()> {
        let update = self.propagator.set_context_bridge(enabled);
        self.propagate(&update)?;
        if self.mounted {
            self.request_validation()?;
        }
        Ok(())
    }

    pub fn resize(&mut self, size: Size) -> Result<()> {
        self.screen = size;
        for zone in Zone::ALL {
            self.registry.mark_dirty(zone);
        }
        self.log(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        if self.mounted {
            self.request_validation()?;
        }
        Ok(())
    }

    pub fn set_safe_area(&mut self, safe_area: Insets) -> Result<()> {
        self.safe_area = safe_area;
        if self.mounted {
            self.request_validation()?;
        }
        Ok(())
    }

    /// Renderer handshake from an external renderer holding `token`.
    pub fn renderer_mounted(&mut self, token: MountToken) -> Result<ContextDelivered> {
        self.ensure_mounted()?;
        let delivered = self.bridges.get_mut(token.zone).renderer_mounted(token)?;
        self.renderers.get_mut(token.zone).accept(&delivered);
        self.on_handoff(token.zone);
        Ok(delivered)
    }

    /// Handshake for the shell's own renderer of `zone`.
    pub fn announce_renderer(&mut self, zone: Zone) -> Result<ContextDelivered> {
        self.ensure_mounted()?;
        let delivered = self
            .renderers
            .get_mut(zone)
            .announce(self.bridges.get_mut(zone))?;
        self.on_handoff(zone);
        Ok(delivered)
    }

    /// Tear down one zone's bridge. Its watchdog is cancelled before the
    /// state is reset, and its registry content is dropped with it.
    pub fn unmount_zone(&mut self, zone: Zone) -> Result<()> {
        self.ensure_mounted()?;
        if let Some(handle) = self.handoff_timers.get_mut(zone).take() {
            self.timers.cancel(handle);
        }
        self.timers.cancel_where(
            |timer| matches!(timer, ShellTimer::HandoffWatchdog { zone: z, .. } if *z == zone),
        );
        *self.overdue.get_mut(zone) = false;
        self.bridges.get_mut(zone).teardown();
        self.renderers.get_mut(zone).detach();
        self.registry.clear(zone)?;
        self.record(ShellAuditEventBuilder::new(ShellAuditStage::ZoneUnmounted).zone(zone));
        Ok(())
    }

    pub fn remount_zone(&mut self, zone: Zone) -> Result<MountToken> {
        self.ensure_mounted()?;
        Ok(self.mount_zone(zone))
    }

    /// Queue a validation pass after the debounce window. A request made
    /// while another is pending replaces it.
    pub fn request_validation(&mut self) -> Result<u64> {
        self.ensure_mounted()?;
        let generation = self.validator.request();
        let superseded = match self.validation_timer.take() {
            Some(handle) => self.timers.cancel(handle).is_some(),
            None => false,
        };
        self.metrics.record_validation_requested(superseded);
        let handle = self.timers.schedule(
            self.now_ms(),
            self.config.debounce(),
            ShellTimer::Validation { generation },
        );
        self.validation_timer = Some(handle);
        Ok(generation)
    }

    /// Fire every timer due at the clock's current time. Returns how many fired.
    pub fn tick(&mut self) -> usize {
        let now = self.now_ms();
        let fired = self.timers.drain_due(now);
        let count = fired.len();
        for timer in fired {
            match timer.payload {
                ShellTimer::Validation { generation } => {
                    if self.validation_timer == Some(timer.handle) {
                        self.validation_timer = None;
                    }
                    self.finish_validation(generation, now);
                }
                ShellTimer::HandoffWatchdog { zone, epoch } => {
                    if *self.handoff_timers.get(zone) == Some(timer.handle) {
                        *self.handoff_timers.get_mut(zone) = None;
                    }
                    self.check_handoff(zone, epoch);
                }
            }
        }
        count
    }

    /// Draw every dirty zone. Returns the number of zones written.
    pub fn render(&mut self, writer: &mut impl Write) -> Result<usize> {
        let bounds = self
            .validator
            .validate_bounds(self.screen, self.safe_area)
            .bounds;
        let dirty = self.registry.take_dirty();
        for zone in &dirty {
            self.renderers
                .get(*zone)
                .render(writer, self.bridges.get(*zone), bounds.zones.get(*zone))?;
        }
        if !dirty.is_empty() {
            self.metrics.record_render(dirty.len());
        }
        Ok(dirty.len())
    }

    /// Hydration flags taken from the live bridges and renderers.
    pub fn measured_hydration(&self) -> HydrationStatus {
        let mut status = HydrationStatus {
            layout_shell: self.mounted,
            zone_renderer: self.renderers.iter().all(|(_, r)| r.is_mounted()),
            zone_bridge: self.bridges.iter().all(|(_, b)| b.is_ready()),
            context_bridge: self.bridges.iter().all(|(_, b)| b.context().is_some()),
            ..HydrationStatus::default()
        };
        for (zone, bridge) in self.bridges.iter() {
            status.set_zone(zone, bridge.is_ready() && bridge.is_handoff_complete());
        }
        status
    }

    pub fn validation_inputs(&self) -> ValidationInputs {
        let navigation = self.propagator.navigation();
        ValidationInputs {
            screen: self.screen,
            safe_area: self.safe_area,
            navigation_available: navigation
                .map(|nav| nav.has_navigation_state())
                .unwrap_or(false),
            route_available: navigation.is_some(),
            hydration: self.measured_hydration(),
            context_bridge_enabled: self.propagator.context_bridge_enabled(),
        }
    }

    /// Compare registry, bridges and renderers across zones.
    pub fn triage(&self) -> TriageReport {
        let mut report = TriageReport::default();
        for zone in Zone::ALL {
            let bridge = self.bridges.get(zone);
            let stored = self.registry.content(zone);
            if !bridge.is_ready() {
                if stored.is_some() {
                    report.orphan_slots.push(zone);
                }
                continue;
            }
            let shown = bridge.injected_content().map(|c| c.fingerprint());
            if stored.map(|c| c.fingerprint()) != shown {
                report.broken_projections.push(zone);
            }
            if *self.overdue.get(zone) && !bridge.is_handoff_complete() {
                report.orphaned_bridges.push(zone);
            }
        }
        let hydration = self.validator.validate_hydration(
            self.measured_hydration(),
            self.propagator.context_bridge_enabled(),
        );
        report.hydration_warnings = hydration.errors;
        report.hydration_warnings.extend(hydration.warnings);
        report.finish()
    }

    /// Mount (if needed), then apply each event, fire due timers and render.
    pub fn run_scripted<I>(&mut self, writer: &mut impl Write, events: I) -> Result<()>
    where
        I: IntoIterator<Item = ShellEvent>,
    {
        self.mount()?;
        self.tick();
        self.render(writer)?;
        for event in events {
            self.apply(event)?;
            self.tick();
            self.render(writer)?;
        }
        let snapshot = self.metrics_snapshot();
        if let Some(logger) = self.logger.as_ref() {
            let _ = logger.log_event(snapshot.to_log_event(METRICS_TARGET));
        }
        Ok(())
    }

    pub fn apply(&mut self, event: ShellEvent) -> Result<()> {
        match event {
            ShellEvent::Inject { zone, content } => self.inject(zone, content),
            ShellEvent::InjectNamed { zone, content } => self.inject_named(&zone, content),
            ShellEvent::Navigate { route, state } => self.navigate(route, state),
            ShellEvent::Resize(size) => self.resize(size),
            ShellEvent::RendererMounted(zone) => self.announce_renderer(zone).map(|_| ()),
            ShellEvent::UnmountZone(zone) => self.unmount_zone(zone),
            ShellEvent::RemountZone(zone) => self.remount_zone(zone).map(|_| ()),
            ShellEvent::Validate => self.request_validation().map(|_| ()),
            ShellEvent::Wait(by) => {
                self.clock.wait(by);
                Ok(())
            }
        }
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.mounted {
            Ok(())
        } else {
            Err(BridgeError::ShellNotMounted)
        }
    }

    fn mount_zone(&mut self, zone: Zone) -> MountToken {
        let now = self.now_ms();
        let snapshot = self.propagator.snapshot_for(zone, now);
        let seed = self.registry.content(zone);
        let token = self.bridges.get_mut(zone).initialize(snapshot, seed);
        self.renderers.get_mut(zone).attach(token);
        self.registry.mark_dirty(zone);

        if let Some(previous) = self.handoff_timers.get_mut(zone).take() {
            self.timers.cancel(previous);
        }
        if !self.bridges.get(zone).is_handoff_complete() {
            let handle = self.timers.schedule(
                now,
                self.config.handoff_timeout(),
                ShellTimer::HandoffWatchdog {
                    zone,
                    epoch: token.epoch,
                },
            );
            *self.handoff_timers.get_mut(zone) = Some(handle);
        }
        *self.overdue.get_mut(zone) = false;

        self.record(
            ShellAuditEventBuilder::new(ShellAuditStage::BridgeInitialized)
                .zone(zone)
                .detail("epoch", json!(token.epoch)),
        );
        token
    }

    fn propagate(&mut self, update: &ContextUpdate) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }
        let now = self.now_ms();
        for zone in Zone::ALL {
            if self.bridges.get(zone).is_ready() {
                let snapshot = self.propagator.snapshot_for(zone, now);
                self.bridges.get_mut(zone).refresh_context(snapshot)?;
                self.registry.mark_dirty(zone);
            }
        }
        self.record(
            ShellAuditEventBuilder::new(ShellAuditStage::ContextPropagated)
                .detail("revision", json!(update.revision))
                .detail("route", json!(update.current_route)),
        );
        self.log(
            LogLevel::Debug,
            "context_propagated",
            [
                json_kv("revision", json!(update.revision)),
                json_kv("change", json!(update.change)),
            ],
        );
        Ok(())
    }

    fn on_handoff(&mut self, zone: Zone) {
        if let Some(handle) = self.handoff_timers.get_mut(zone).take() {
            self.timers.cancel(handle);
        }
        *self.overdue.get_mut(zone) = false;
        self.registry.mark_dirty(zone);
        self.metrics.record_handoff();
        self.record(
            ShellAuditEventBuilder::new(ShellAuditStage::HandoffCompleted)
                .zone(zone)
                .detail("epoch", json!(self.bridges.get(zone).epoch())),
        );
    }

    fn check_handoff(&mut self, zone: Zone, epoch: u64) {
        let bridge = self.bridges.get(zone);
        if bridge.epoch() != epoch || !bridge.is_ready() || bridge.is_handoff_complete() {
            return;
        }
        *self.overdue.get_mut(zone) = true;
        self.metrics.record_handoff_overdue();
        self.record(
            ShellAuditEventBuilder::new(ShellAuditStage::HandoffOverdue)
                .zone(zone)
                .detail("epoch", json!(epoch)),
        );
        self.log_zone(
            LogLevel::Warn,
            zone,
            "handoff_overdue",
            [json_kv(
                "timeout_ms",
                json!(self.config.handoff_timeout_ms),
            )],
        );
    }

    fn finish_validation(&mut self, generation: u64, now: u64) {
        let inputs = self.validation_inputs();
        match self.validator.complete(generation, &inputs, now) {
            ValidationOutcome::Completed(result) => {
                self.metrics.record_validation_completed();
                self.record(
                    ShellAuditEventBuilder::new(ShellAuditStage::ValidationCompleted)
                        .detail("generation", json!(generation))
                        .detail("is_valid", json!(result.is_valid)),
                );
            }
            ValidationOutcome::Stale { generation, current } => {
                self.metrics.record_validation_stale();
                self.record(
                    ShellAuditEventBuilder::new(ShellAuditStage::ValidationDiscarded)
                        .detail("generation", json!(generation))
                        .detail("current", json!(current)),
                );
            }
        }
    }

    fn record(&self, builder: ShellAuditEventBuilder) {
        self.audit.record(builder.finish());
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(level, TARGET, message, fields));
        }
    }

    fn log_zone<I>(&self, level: LogLevel, zone: Zone, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let fields = std::iter::once(json_kv("zone", json!(zone.as_str()))).chain(fields);
        self.log(level, message, fields);
    }
}
