//! Zone registry: the latest injected content per zone.
//!
//! The registry is an explicit object with an `init`/`teardown` lifecycle.
//! Callers own it (normally through the shell) and pass it where needed.

mod core;

pub use self::core::{ContentNode, ContentRef, SubscriptionId, ZoneChange, ZoneRegistry};
