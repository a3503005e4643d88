//! Error types shared across the crate.
//!
//! Validation problems are never raised through these types; they accumulate
//! inside a `ValidationResult`. Errors here describe lifecycle misuse.

mod types;

pub use types::{BridgeError, ConfigError, ContextError, Result};
