//! Per-zone bridge between the shell (context owner) and a zone renderer.
//!
//! A bridge moves through three handoff phases:
//!
//! * `Unmounted`: constructed or torn down; state is empty.
//! * `AwaitingRenderer`: `initialize` delivered a context snapshot and
//!   issued a [`MountToken`]; content may be injected.
//! * `Delivered`: the renderer presented its token and received the
//!   context back; the handoff is complete.
//!
//! Every mount bumps an epoch so tokens from an earlier mount are rejected
//! instead of writing into a torn-down bridge.

mod core;
mod hooks;

pub use self::core::{Bridge, BridgeState, ContextDelivered, HandoffPhase, MountToken};
pub use hooks::{BridgeHooks, HookEvent, NoopHooks, RecordingHooks};
