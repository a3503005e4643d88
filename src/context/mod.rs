//! Context propagation from the shell into each zone bridge.
//!
//! The shell-level context is split into independent variants, each checked
//! where it is built. [`ContextPropagator`] composes them into an immutable
//! [`ContextSnapshot`] per zone and republishes whenever one of them changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ContextError;
use crate::zone::Zone;

/// Navigation state plus the active route name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationContext {
    /// Opaque handle owned by the host navigator.
    pub navigation_state: Value,
    pub current_route: String,
}

impl NavigationContext {
    pub fn new(route: impl Into<String>, navigation_state: Value) -> Result<Self, ContextError> {
        let current_route = route.into();
        if current_route.trim().is_empty() {
            return Err(ContextError::EmptyRoute);
        }
        Ok(Self {
            navigation_state,
            current_route,
        })
    }

    /// A route is known but the navigator handed over no state.
    pub fn has_navigation_state(&self) -> bool {
        !self.navigation_state.is_null()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeContext {
    pub background_color: String,
    pub border_color: String,
}

impl ThemeContext {
    pub fn new(
        background_color: impl Into<String>,
        border_color: impl Into<String>,
    ) -> Result<Self, ContextError> {
        let background_color = background_color.into();
        let border_color = border_color.into();
        check_color("background_color", &background_color)?;
        check_color("border_color", &border_color)?;
        Ok(Self {
            background_color,
            border_color,
        })
    }
}

impl Default for ThemeContext {
    fn default() -> Self {
        Self {
            background_color: "#f8f8f8".to_string(),
            border_color: "#e0e0e0".to_string(),
        }
    }
}

fn check_color(field: &'static str, value: &str) -> Result<(), ContextError> {
    if value == "transparent" {
        return Ok(());
    }
    let valid = value
        .strip_prefix('#')
        .map(|hex| matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(ContextError::InvalidColor {
            field,
            value: value.to_string(),
        })
    }
}

/// Signed-in user as far as the zones care. The profile is opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<String>,
    pub profile: Value,
}

impl UserContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>, profile: Value) -> Result<Self, ContextError> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(ContextError::EmptyUserId);
        }
        Ok(Self {
            user_id: Some(user_id),
            profile,
        })
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Host application state, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppState(pub Value);

/// Immutable view of the shell context as delivered to one zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSnapshot {
    pub navigation: Option<NavigationContext>,
    pub theme: ThemeContext,
    pub user: UserContext,
    pub app_state: AppState,
    pub enable_context_bridge: bool,
    pub zone: Zone,
    pub timestamp_ms: u64,
    /// Propagator revision this snapshot was cut from.
    pub revision: u64,
}

impl ContextSnapshot {
    pub fn current_route(&self) -> Option<&str> {
        self.navigation.as_ref().map(|nav| nav.current_route.as_str())
    }
}

/// Which part of the context changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextChange {
    Route,
    Theme,
    User,
    AppState,
    ContextBridge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextUpdate {
    pub revision: u64,
    pub change: ContextChange,
    pub current_route: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ContextUpdate) + Send>;

pub struct ContextPropagator {
    navigation: Option<NavigationContext>,
    theme: ThemeContext,
    user: UserContext,
    app_state: AppState,
    enable_context_bridge: bool,
    revision: u64,
    next_listener: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl Default for ContextPropagator {
    fn default() -> Self {
        Self {
            navigation: None,
            theme: ThemeContext::default(),
            user: UserContext::anonymous(),
            app_state: AppState::default(),
            enable_context_bridge: false,
            revision: 0,
            next_listener: 0,
            listeners: Vec::new(),
        }
    }
}

impl ContextPropagator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme: ThemeContext) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_context_bridge(mut self, enabled: bool) -> Self {
        self.enable_context_bridge = enabled;
        self
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn navigation(&self) -> Option<&NavigationContext> {
        self.navigation.as_ref()
    }

    pub fn current_route(&self) -> Option<&str> {
        self.navigation.as_ref().map(|nav| nav.current_route.as_str())
    }

    pub fn theme(&self) -> &ThemeContext {
        &self.theme
    }

    pub fn context_bridge_enabled(&self) -> bool {
        self.enable_context_bridge
    }

    /// Switch the active route. Always republishes, even for the same route.
    pub fn navigate(&mut self, navigation: NavigationContext) -> ContextUpdate {
        self.navigation = Some(navigation);
        self.publish(ContextChange::Route)
    }

    pub fn set_theme(&mut self, theme: ThemeContext) -> ContextUpdate {
        self.theme = theme;
        self.publish(ContextChange::Theme)
    }

    pub fn set_user(&mut self, user: UserContext) -> ContextUpdate {
        self.user = user;
        self.publish(ContextChange::User)
    }

    pub fn set_app_state(&mut self, app_state: AppState) -> ContextUpdate {
        self.app_state = app_state;
        self.publish(ContextChange::AppState)
    }

    pub fn set_context_bridge(&mut self, enabled: bool) -> ContextUpdate {
        self.enable_context_bridge = enabled;
        self.publish(ContextChange::ContextBridge)
    }

    /// Cut a fresh snapshot for `zone`.
    pub fn snapshot_for(&self, zone: Zone, now_ms: u64) -> ContextSnapshot {
        ContextSnapshot {
            navigation: self.navigation.clone(),
            theme: self.theme.clone(),
            user: self.user.clone(),
            app_state: self.app_state.clone(),
            enable_context_bridge: self.enable_context_bridge,
            zone,
            timestamp_ms: now_ms,
            revision: self.revision,
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ContextUpdate) + Send + 'static,
    {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }

    fn publish(&mut self, change: ContextChange) -> ContextUpdate {
        self.revision += 1;
        let update = ContextUpdate {
            revision: self.revision,
            change,
            current_route: self.current_route().map(str::to_string),
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&update);
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn navigation_requires_a_route() {
        assert_eq!(
            NavigationContext::new("  ", Value::Null).unwrap_err(),
            ContextError::EmptyRoute
        );
        let nav = NavigationContext::new("Home", json!({"index": 0})).unwrap();
        assert!(nav.has_navigation_state());
    }

    #[test]
    fn theme_rejects_unknown_colours() {
        assert!(ThemeContext::new("#f8f9fa", "#dee").is_ok());
        assert!(ThemeContext::new("transparent", "#dee2e6ff").is_ok());
        let err = ThemeContext::new("#f8f9fa", "grey").unwrap_err();
        assert!(matches!(err, ContextError::InvalidColor { field: "border_color", .. }));
        assert!(ThemeContext::new("#12345", "#fff").is_err());
    }

    #[test]
    fn signed_in_user_needs_an_id() {
        assert_eq!(
            UserContext::signed_in("", Value::Null).unwrap_err(),
            ContextError::EmptyUserId
        );
        assert!(UserContext::anonymous().is_anonymous());
    }

    #[test]
    fn navigate_republishes_with_new_revision() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut propagator = ContextPropagator::new();
        propagator.subscribe(move |update| sink.lock().unwrap().push(update.clone()));

        let first = propagator.navigate(NavigationContext::new("Home", Value::Null).unwrap());
        let second = propagator.navigate(NavigationContext::new("Home", Value::Null).unwrap());

        assert_eq!(first.revision, 1);
        assert_eq!(second.revision, 2);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].current_route.as_deref(), Some("Home"));
    }

    #[test]
    fn snapshots_are_fresh_values() {
        let mut propagator = ContextPropagator::new().with_context_bridge(true);
        propagator.navigate(NavigationContext::new("Home", Value::Null).unwrap());
        let before = propagator.snapshot_for(Zone::Top, 10);
        propagator.navigate(NavigationContext::new("Settings", Value::Null).unwrap());
        let after = propagator.snapshot_for(Zone::Top, 20);

        assert_eq!(before.current_route(), Some("Home"));
        assert_eq!(after.current_route(), Some("Settings"));
        assert!(after.enable_context_bridge);
        assert_eq!(after.zone, Zone::Top);
        assert!(after.revision > before.revision);
    }

    #[test]
    fn unsubscribed_listeners_stop_hearing_updates() {
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let mut propagator = ContextPropagator::new();
        let id = propagator.subscribe(move |_| *counter.lock().unwrap() += 1);
        propagator.set_theme(ThemeContext::default());
        assert!(propagator.unsubscribe(id));
        propagator.set_user(UserContext::anonymous());
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
