use serde::{Deserialize, Serialize};

use crate::geometry::{Insets, Rect, Size};
use crate::zone::Zone;

/// Fixed heights for the edge zones; the center zone takes the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneModel {
    pub top_height: u16,
    pub bottom_height: u16,
}

impl Default for ZoneModel {
    fn default() -> Self {
        Self {
            top_height: 50,
            bottom_height: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ZoneBounds {
    pub top: Rect,
    pub center: Rect,
    pub bottom: Rect,
}

impl ZoneBounds {
    pub fn get(&self, zone: Zone) -> Rect {
        match zone {
            Zone::Top => self.top,
            Zone::Center => self.center,
            Zone::Bottom => self.bottom,
        }
    }
}

/// Screen, safe area and the solved zone rectangles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutBounds {
    pub screen: Size,
    pub safe_area: Insets,
    pub zones: ZoneBounds,
}

impl LayoutBounds {
    /// Stack top, center and bottom inside the safe area.
    ///
    /// The bottom zone is pinned to the bottom inset and the center zone
    /// collapses to zero height at the bottom zone's start when the screen is
    /// too short, so a short screen shows up as a top/center overlap.
    /// Center always ends exactly at `bottom.y`, so this model never yields a
    /// center/bottom overlap; that check only guards hand-built bounds.
    pub fn compute(screen: Size, safe_area: Insets, model: ZoneModel) -> Self {
        let x = safe_area.left;
        let width = screen
            .width
            .saturating_sub(safe_area.left.saturating_add(safe_area.right));

        let top = Rect::new(x, safe_area.top, width, model.top_height);
        let bottom_y = screen
            .height
            .saturating_sub(safe_area.bottom.saturating_add(model.bottom_height));
        let bottom = Rect::new(x, bottom_y, width, model.bottom_height);

        let center_start = top.bottom();
        let center = Rect::new(
            x,
            center_start.min(bottom_y),
            width,
            bottom_y.saturating_sub(center_start),
        );

        Self {
            screen,
            safe_area,
            zones: ZoneBounds {
                top,
                center,
                bottom,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionKind {
    Overlap,
    Overflow,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub zone: Zone,
    pub kind: CollisionKind,
    pub severity: Severity,
    pub message: String,
    pub bounds: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundsReport {
    pub bounds: LayoutBounds,
    pub collisions: Vec<Collision>,
}

/// Solve the zone rectangles and report overlaps and screen overflow.
pub fn validate_bounds(screen: Size, safe_area: Insets, model: ZoneModel) -> BoundsReport {
    let bounds = LayoutBounds::compute(screen, safe_area, model);
    let ZoneBounds {
        top,
        center,
        bottom,
    } = bounds.zones;
    let mut collisions = Vec::new();

    if top.bottom() > center.y {
        collisions.push(Collision {
            zone: Zone::Top,
            kind: CollisionKind::Overlap,
            severity: Severity::Error,
            message: "top zone overlaps with center zone".to_string(),
            bounds: Some(top),
        });
    }

    if center.bottom() > bottom.y {
        collisions.push(Collision {
            zone: Zone::Center,
            kind: CollisionKind::Overlap,
            severity: Severity::Error,
            message: "center zone overlaps with bottom zone".to_string(),
            bounds: Some(center),
        });
    }

    if bottom.bottom() > screen.height {
        collisions.push(Collision {
            zone: Zone::Bottom,
            kind: CollisionKind::Overflow,
            severity: Severity::Warning,
            message: "bottom zone overflows screen bounds".to_string(),
            bounds: Some(bottom),
        });
    }

    BoundsReport { bounds, collisions }
}
