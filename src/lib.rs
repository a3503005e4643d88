//! Slot projection for a three-zone terminal shell.
//!
//! Screens inject content into the `top`, `center` and `bottom` zones through
//! a [`ZoneRegistry`]. Each zone owns a [`Bridge`] that carries the shell
//! context to its renderer through a token handshake, and a debounced
//! [`StructureValidator`] checks the layout and hydration state. The
//! [`Shell`] wires the pieces together on an injected [`Clock`].

pub mod bridge;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod scheduler;
pub mod validation;
pub mod zone;

pub use bridge::{
    Bridge, BridgeHooks, BridgeState, ContextDelivered, HandoffPhase, HookEvent, MountToken,
    NoopHooks, RecordingHooks,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ENV_PREFIX, ShellConfig};
pub use context::{
    AppState, ContextChange, ContextPropagator, ContextSnapshot, ContextUpdate, ListenerId,
    NavigationContext, ThemeContext, UserContext,
};
pub use error::{BridgeError, ConfigError, ContextError, Result};
pub use geometry::{Insets, Rect, Size};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{MetricSnapshot, ShellMetrics};
pub use registry::{ContentNode, ContentRef, SubscriptionId, ZoneChange, ZoneRegistry};
pub use render::{RendererSettings, ZoneRenderer, display_width};
pub use runtime::audit::{
    BufferedShellAudit, NullShellAudit, ShellAudit, ShellAuditEvent, ShellAuditEventBuilder,
    ShellAuditStage,
};
pub use runtime::{Shell, ShellEvent, ShellTimer, TriageReport};
pub use scheduler::{FiredTimer, TimerHandle, TimerQueue};
pub use validation::{
    BoundsReport, Collision, CollisionKind, HydrationReport, HydrationSource, HydrationStatus,
    LayoutBounds, Severity, StructureValidator, ValidationInputs, ValidationOutcome,
    ValidationResult, ValidatorOptions, ZoneBounds, ZoneModel,
};
pub use zone::{Zone, ZoneMap};
