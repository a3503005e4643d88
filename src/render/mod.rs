//! Reference zone renderer: draws bridge state into a terminal region.

mod core;
mod width;

pub use self::core::{RendererSettings, ZoneRenderer};
pub use width::{display_width, truncate_to_width};
