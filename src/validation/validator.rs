use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::geometry::{Insets, Size};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::bounds::{
    BoundsReport, Collision, LayoutBounds, Severity, ZoneModel, validate_bounds,
};
use super::hydration::{HydrationReport, HydrationSource, HydrationStatus, validate_hydration};

const TARGET: &str = "zone_bridge::validation";

/// Toggles for the individual checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    pub enable_collision_detection: bool,
    pub enable_bounds_validation: bool,
    pub enable_hydration_tracking: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            enable_collision_detection: true,
            enable_bounds_validation: true,
            enable_hydration_tracking: true,
        }
    }
}

/// Everything a validation pass looks at, captured when the pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationInputs {
    pub screen: Size,
    pub safe_area: Insets,
    pub navigation_available: bool,
    pub route_available: bool,
    pub hydration: HydrationStatus,
    pub context_bridge_enabled: bool,
}

/// Outcome of one validation pass. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub generation: u64,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub collisions: Vec<Collision>,
    pub bounds: LayoutBounds,
    pub hydration_status: HydrationStatus,
    pub completed_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Completed(Arc<ValidationResult>),
    /// A newer request superseded this one; its result was dropped.
    Stale { generation: u64, current: u64 },
}

type CompletionHook = Box<dyn FnMut(&ValidationResult) + Send>;

pub struct StructureValidator {
    model: ZoneModel,
    options: ValidatorOptions,
    hydration_source: HydrationSource,
    history_limit: usize,
    generation: u64,
    pending: Option<u64>,
    superseded: u64,
    history: VecDeque<Arc<ValidationResult>>,
    on_complete: Option<CompletionHook>,
    logger: Option<Logger>,
}

impl Default for StructureValidator {
    fn default() -> Self {
        Self::new(ZoneModel::default())
    }
}

impl StructureValidator {
    pub fn new(model: ZoneModel) -> Self {
        Self {
            model,
            options: ValidatorOptions::default(),
            hydration_source: HydrationSource::default(),
            history_limit: 5,
            generation: 0,
            pending: None,
            superseded: 0,
            history: VecDeque::new(),
            on_complete: None,
            logger: None,
        }
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hydration_source(mut self, source: HydrationSource) -> Self {
        self.hydration_source = source;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.trim_history();
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn set_logger(&mut self, logger: Option<Logger>) {
        self.logger = logger;
    }

    pub fn set_on_complete<F>(&mut self, hook: F)
    where
        F: FnMut(&ValidationResult) + Send + 'static,
    {
        self.on_complete = Some(Box::new(hook));
    }

    pub fn model(&self) -> ZoneModel {
        self.model
    }

    pub fn hydration_source(&self) -> HydrationSource {
        self.hydration_source
    }

    /// Open a new request generation. Any request still pending is superseded.
    pub fn request(&mut self) -> u64 {
        self.generation += 1;
        if let Some(previous) = self.pending.replace(self.generation) {
            self.superseded += 1;
            self.log(
                LogLevel::Trace,
                "validation_superseded",
                [
                    json_kv("superseded", json!(previous)),
                    json_kv("generation", json!(self.generation)),
                ],
            );
        }
        self.generation
    }

    /// Drop the pending request, if any.
    pub fn cancel(&mut self) -> Option<u64> {
        self.pending.take()
    }

    pub fn is_validating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_generation(&self) -> Option<u64> {
        self.pending
    }

    pub fn current_generation(&self) -> u64 {
        self.generation
    }

    pub fn superseded_count(&self) -> u64 {
        self.superseded
    }

    /// Finish the request `generation`. Anything but the pending generation is stale.
    pub fn complete(
        &mut self,
        generation: u64,
        inputs: &ValidationInputs,
        now_ms: u64,
    ) -> ValidationOutcome {
        if self.pending != Some(generation) {
            self.log(
                LogLevel::Debug,
                "validation_discarded",
                [
                    json_kv("generation", json!(generation)),
                    json_kv("current", json!(self.generation)),
                ],
            );
            return ValidationOutcome::Stale {
                generation,
                current: self.generation,
            };
        }
        self.pending = None;

        let result = Arc::new(self.evaluate(generation, inputs, now_ms));
        self.history.push_front(Arc::clone(&result));
        self.trim_history();

        if let Some(hook) = self.on_complete.as_mut() {
            hook(&result);
        }
        self.log(
            if result.is_valid {
                LogLevel::Info
            } else {
                LogLevel::Warn
            },
            "validation_complete",
            [
                json_kv("generation", json!(generation)),
                json_kv("is_valid", json!(result.is_valid)),
                json_kv("errors", json!(result.errors)),
                json_kv("warnings", json!(result.warnings)),
                json_kv("collisions", json!(result.collisions.len())),
            ],
        );
        ValidationOutcome::Completed(result)
    }

    /// Run every enabled check against `inputs` without touching request state.
    pub fn evaluate(
        &self,
        generation: u64,
        inputs: &ValidationInputs,
        now_ms: u64,
    ) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut collisions = Vec::new();

        let BoundsReport {
            bounds,
            collisions: bounds_collisions,
        } = self.validate_bounds(inputs.screen, inputs.safe_area);
        if self.options.enable_bounds_validation && self.options.enable_collision_detection {
            collisions.extend(bounds_collisions);
        }

        let hydration = if self.options.enable_hydration_tracking {
            let report = self.validate_hydration(inputs.hydration, inputs.context_bridge_enabled);
            errors.extend(report.errors);
            warnings.extend(report.warnings);
            if self.options.enable_collision_detection {
                collisions.extend(report.collisions);
            }
            report.status
        } else {
            HydrationStatus::default()
        };

        for collision in &collisions {
            match collision.severity {
                Severity::Error => errors.push(collision.message.clone()),
                Severity::Warning => warnings.push(collision.message.clone()),
                Severity::Info => {}
            }
        }

        if !inputs.navigation_available {
            warnings.push("navigation context not available".to_string());
        }
        if !inputs.route_available {
            warnings.push("route context not available".to_string());
        }
        if inputs.screen.is_empty() {
            errors.push("invalid screen dimensions detected".to_string());
        }

        ValidationResult {
            generation,
            is_valid: errors.is_empty(),
            errors,
            warnings,
            collisions,
            bounds,
            hydration_status: hydration,
            completed_at_ms: now_ms,
        }
    }

    pub fn validate_bounds(&self, screen: Size, safe_area: Insets) -> BoundsReport {
        validate_bounds(screen, safe_area, self.model)
    }

    /// Check hydration flags. Under the optimistic source the measured flags
    /// are ignored and every component is taken as present.
    pub fn validate_hydration(
        &self,
        measured: HydrationStatus,
        context_bridge_enabled: bool,
    ) -> HydrationReport {
        let status = match self.hydration_source {
            HydrationSource::Optimistic => HydrationStatus::all_hydrated(),
            HydrationSource::Measured => measured,
        };
        validate_hydration(status, context_bridge_enabled)
    }

    pub fn latest(&self) -> Option<Arc<ValidationResult>> {
        self.history.front().cloned()
    }

    /// Retained results, newest first.
    pub fn history(&self) -> impl Iterator<Item = &Arc<ValidationResult>> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Short status badge for an on-screen overlay.
    pub fn overlay_summary(&self) -> Vec<String> {
        if self.is_validating() {
            return vec!["Validating...".to_string()];
        }
        let Some(result) = self.history.front() else {
            return vec!["Not validated".to_string()];
        };
        let mut lines = vec![if result.is_valid {
            "✓ Valid".to_string()
        } else {
            "✗ Invalid".to_string()
        }];
        if !result.errors.is_empty() {
            lines.push(format!("{} errors", result.errors.len()));
        }
        if !result.warnings.is_empty() {
            lines.push(format!("{} warnings", result.warnings.len()));
        }
        if !result.collisions.is_empty() {
            lines.push(format!("{} collisions", result.collisions.len()));
        }
        lines
    }

    /// Forget pending work and history.
    pub fn reset(&mut self) {
        self.pending = None;
        self.history.clear();
    }

    fn trim_history(&mut self) {
        self.history.truncate(self.history_limit);
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(level, TARGET, message, fields));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TimerQueue;
    use crate::validation::CollisionKind;
    use crate::zone::Zone;
    use std::sync::Mutex;
    use std::time::Duration;

    fn inputs(width: u16, height: u16) -> ValidationInputs {
        ValidationInputs {
            screen: Size::new(width, height),
            safe_area: Insets::zero(),
            navigation_available: true,
            route_available: true,
            hydration: HydrationStatus::all_hydrated(),
            context_bridge_enabled: false,
        }
    }

    fn run_once(validator: &mut StructureValidator, inputs: &ValidationInputs) -> Arc<ValidationResult> {
        let generation = validator.request();
        match validator.complete(generation, inputs, 0) {
            ValidationOutcome::Completed(result) => result,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn healthy_layout_is_valid() {
        let mut validator = StructureValidator::default();
        let result = run_once(&mut validator, &inputs(375, 812));
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.collisions.is_empty());
        assert_eq!(result.hydration_status, HydrationStatus::all_hydrated());
    }

    #[test]
    fn overlap_invalidates_the_result() {
        let mut validator = StructureValidator::default();
        let result = run_once(&mut validator, &inputs(375, 90));
        assert!(!result.is_valid);
        assert_eq!(result.collisions.len(), 1);
        assert_eq!(result.collisions[0].kind, CollisionKind::Overlap);
        assert_eq!(result.collisions[0].zone, Zone::Top);
    }

    #[test]
    fn zero_dimensions_are_an_error_not_a_panic() {
        let mut validator = StructureValidator::default();
        let result = run_once(&mut validator, &inputs(0, 0));
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"invalid screen dimensions detected".to_string())
        );
    }

    #[test]
    fn missing_route_degrades_to_warnings() {
        let mut validator = StructureValidator::default();
        let mut without_nav = inputs(375, 812);
        without_nav.navigation_available = false;
        without_nav.route_available = false;
        let result = run_once(&mut validator, &without_nav);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn optimistic_source_ignores_measured_flags() {
        let mut unhydrated = inputs(375, 812);
        unhydrated.hydration = HydrationStatus::default();

        let mut optimistic = StructureValidator::default();
        assert!(run_once(&mut optimistic, &unhydrated).is_valid);

        let mut measured =
            StructureValidator::default().with_hydration_source(HydrationSource::Measured);
        let result = run_once(&mut measured, &unhydrated);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(
            result
                .collisions
                .iter()
                .filter(|c| c.kind == CollisionKind::Missing)
                .count(),
            3
        );
    }

    #[test]
    fn disabled_checks_are_skipped() {
        let options = ValidatorOptions {
            enable_collision_detection: false,
            enable_bounds_validation: true,
            enable_hydration_tracking: false,
        };
        let mut validator = StructureValidator::default().with_options(options);
        let result = run_once(&mut validator, &inputs(375, 90));
        assert!(result.is_valid);
        assert!(result.collisions.is_empty());
        assert_eq!(result.bounds.zones.top.height, 50);
    }

    #[test]
    fn rapid_requests_within_window_yield_one_result() {
        let debounce = Duration::from_millis(100);
        let mut timers = TimerQueue::new();
        let mut validator = StructureValidator::default();
        let mut pending = None;

        for now in [0u64, 20, 40, 60, 80] {
            let generation = validator.request();
            if let Some(handle) = pending.take() {
                timers.cancel(handle);
            }
            pending = Some(timers.schedule(now, debounce, generation));
        }

        let mut results = Vec::new();
        for fired in timers.drain_due(1_000) {
            if let ValidationOutcome::Completed(result) =
                validator.complete(fired.payload, &inputs(375, 812), fired.due_at_ms)
            {
                results.push(result);
            }
        }
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].generation, 5);
        assert_eq!(results[0].completed_at_ms, 180);
        assert_eq!(validator.superseded_count(), 4);
    }

    #[test]
    fn late_result_for_old_generation_is_stale() {
        let mut validator = StructureValidator::default();
        let old = validator.request();
        let current = validator.request();
        assert_eq!(
            validator.complete(old, &inputs(375, 812), 0),
            ValidationOutcome::Stale {
                generation: old,
                current
            }
        );
        assert!(validator.is_validating());
        assert!(matches!(
            validator.complete(current, &inputs(375, 812), 0),
            ValidationOutcome::Completed(_)
        ));
        assert!(!validator.is_validating());
        assert_eq!(validator.history_len(), 1);
    }

    #[test]
    fn history_keeps_the_last_five_newest_first() {
        let mut validator = StructureValidator::default();
        for _ in 0..7 {
            run_once(&mut validator, &inputs(375, 812));
        }
        let generations: Vec<u64> = validator.history().map(|r| r.generation).collect();
        assert_eq!(generations, vec![7, 6, 5, 4, 3]);
        assert_eq!(validator.latest().unwrap().generation, 7);
    }

    #[test]
    fn completion_hook_sees_each_result() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut validator = StructureValidator::default();
        validator.set_on_complete(move |result| sink.lock().unwrap().push(result.is_valid));
        run_once(&mut validator, &inputs(375, 812));
        run_once(&mut validator, &inputs(375, 90));
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn overlay_summary_reflects_latest_result() {
        let mut validator = StructureValidator::default();
        assert_eq!(validator.overlay_summary(), vec!["Not validated".to_string()]);
        validator.request();
        assert_eq!(validator.overlay_summary(), vec!["Validating...".to_string()]);
        validator.cancel();
        run_once(&mut validator, &inputs(375, 90));
        assert_eq!(
            validator.overlay_summary(),
            vec![
                "✗ Invalid".to_string(),
                "1 errors".to_string(),
                "1 collisions".to_string()
            ]
        );
    }
}
