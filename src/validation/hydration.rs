use serde::{Deserialize, Serialize};

use crate::zone::Zone;

use super::bounds::{Collision, CollisionKind, Severity};

/// Presence flags for the runtime pieces a healthy layout needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HydrationStatus {
    pub layout_shell: bool,
    pub zone_renderer: bool,
    pub top_zone: bool,
    pub center_zone: bool,
    pub bottom_zone: bool,
    pub zone_bridge: bool,
    pub context_bridge: bool,
}

impl HydrationStatus {
    pub fn all_hydrated() -> Self {
        Self {
            layout_shell: true,
            zone_renderer: true,
            top_zone: true,
            center_zone: true,
            bottom_zone: true,
            zone_bridge: true,
            context_bridge: true,
        }
    }

    pub fn zone(&self, zone: Zone) -> bool {
        match zone {
            Zone::Top => self.top_zone,
            Zone::Center => self.center_zone,
            Zone::Bottom => self.bottom_zone,
        }
    }

    pub fn set_zone(&mut self, zone: Zone, hydrated: bool) {
        match zone {
            Zone::Top => self.top_zone = hydrated,
            Zone::Center => self.center_zone = hydrated,
            Zone::Bottom => self.bottom_zone = hydrated,
        }
    }
}

/// Where hydration flags come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HydrationSource {
    /// Every flag is reported present while the validator is running.
    #[default]
    Optimistic,
    /// Flags reflect the shell's actual bridge and renderer state.
    Measured,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub status: HydrationStatus,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub collisions: Vec<Collision>,
}

pub fn validate_hydration(status: HydrationStatus, context_bridge_enabled: bool) -> HydrationReport {
    let mut report = HydrationReport {
        status,
        ..HydrationReport::default()
    };

    if !status.layout_shell {
        report
            .errors
            .push("layout shell component not hydrated".to_string());
    }
    if !status.zone_renderer {
        report
            .errors
            .push("zone renderer component not hydrated".to_string());
    }
    if !status.zone_bridge {
        report
            .warnings
            .push("zone bridge component not detected".to_string());
    }
    if context_bridge_enabled && !status.context_bridge {
        report
            .warnings
            .push("context bridge enabled but not hydrated".to_string());
    }

    for zone in Zone::ALL {
        if !status.zone(zone) {
            report.collisions.push(Collision {
                zone,
                kind: CollisionKind::Missing,
                severity: Severity::Info,
                message: format!("{zone} zone has not hydrated"),
                bounds: None,
            });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_hydrated_is_clean() {
        let report = validate_hydration(HydrationStatus::all_hydrated(), true);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert!(report.collisions.is_empty());
    }

    #[test]
    fn missing_shell_and_renderer_are_errors() {
        let mut status = HydrationStatus::all_hydrated();
        status.layout_shell = false;
        status.zone_renderer = false;
        let report = validate_hydration(status, false);
        assert_eq!(report.errors.len(), 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_bridge_is_a_warning() {
        let mut status = HydrationStatus::all_hydrated();
        status.zone_bridge = false;
        let report = validate_hydration(status, false);
        assert!(report.errors.is_empty());
        assert_eq!(
            report.warnings,
            vec!["zone bridge component not detected".to_string()]
        );
    }

    #[test]
    fn context_bridge_only_matters_when_enabled() {
        let mut status = HydrationStatus::all_hydrated();
        status.context_bridge = false;
        assert!(validate_hydration(status, false).warnings.is_empty());
        assert_eq!(validate_hydration(status, true).warnings.len(), 1);
    }

    #[test]
    fn unhydrated_zone_is_reported_as_missing() {
        let mut status = HydrationStatus::all_hydrated();
        status.set_zone(Zone::Center, false);
        let report = validate_hydration(status, false);
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].zone, Zone::Center);
        assert_eq!(report.collisions[0].kind, CollisionKind::Missing);
    }
}
