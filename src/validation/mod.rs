//! Structure validation: layout bounds, zone collisions and hydration.
//!
//! The validator is a self-reporting health check. It never returns an
//! error and never blocks rendering; every problem degrades into strings on
//! a [`ValidationResult`].

mod bounds;
mod hydration;
mod validator;

pub use bounds::{
    BoundsReport, Collision, CollisionKind, LayoutBounds, Severity, ZoneBounds, ZoneModel,
    validate_bounds,
};
pub use hydration::{HydrationReport, HydrationSource, HydrationStatus, validate_hydration};
pub use validator::{
    StructureValidator, ValidationInputs, ValidationOutcome, ValidationResult, ValidatorOptions,
};
