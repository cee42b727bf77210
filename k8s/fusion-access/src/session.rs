//! Page-scoped state shared by the views of one console session: the alert list, the
//! primary call-to-action button and navigation.
//!
//! A [`PageStore`] is created per session and handed to every action explicitly.

use parking_lot::Mutex;
use std::sync::Arc;

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum AlertVariant {
    Danger,
    Warning,
    Info,
    Success,
}

/// A dismissible page alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Alerts with a key are unique, adding one replaces the previous one.
    pub key: Option<String>,
    pub variant: AlertVariant,
    pub title: String,
    pub description: Vec<String>,
}

impl Alert {
    pub fn new(variant: AlertVariant, title: impl Into<String>) -> Self {
        Self {
            key: None,
            variant,
            title: title.into(),
            description: vec![],
        }
    }
    pub fn danger(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(AlertVariant::Danger, title).with_description(vec![description.into()])
    }
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
    pub fn with_description(mut self, description: Vec<String>) -> Self {
        self.description = description;
        self
    }
}

/// State of the page's primary action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallToAction {
    pub is_disabled: bool,
    pub is_loading: bool,
}

impl Default for CallToAction {
    fn default() -> Self {
        Self {
            is_disabled: true,
            is_loading: false,
        }
    }
}

#[derive(Debug, Default)]
struct PageState {
    alerts: Vec<Alert>,
    toasts: Vec<Alert>,
    cta: CallToAction,
}

/// Session-scoped page state.
#[derive(Debug, Clone, Default)]
pub struct PageStore {
    state: Arc<Mutex<PageState>>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alert. A keyed alert replaces the alert with the same key and is moved to the
    /// front so that it stays visible, any other alert is appended.
    pub fn add_alert(&self, alert: Alert) {
        let mut state = self.state.lock();
        match &alert.key {
            Some(key) => {
                state.alerts.retain(|a| a.key.as_ref() != Some(key));
                state.alerts.insert(0, alert);
            }
            None => state.alerts.push(alert),
        }
    }
    /// Dismiss the alert with the given key.
    pub fn dismiss_alert(&self, key: &str) {
        self.state
            .lock()
            .alerts
            .retain(|a| a.key.as_deref() != Some(key));
    }
    /// Dismiss the first alert.
    pub fn dismiss_first_alert(&self) {
        let mut state = self.state.lock();
        if !state.alerts.is_empty() {
            state.alerts.remove(0);
        }
    }
    pub fn alerts(&self) -> Vec<Alert> {
        self.state.lock().alerts.clone()
    }

    /// Show a transient notification.
    pub fn add_toast(&self, toast: Alert) {
        self.state.lock().toasts.push(toast);
    }
    pub fn toasts(&self) -> Vec<Alert> {
        self.state.lock().toasts.clone()
    }

    pub fn cta(&self) -> CallToAction {
        self.state.lock().cta
    }
    pub fn set_cta_loading(&self, is_loading: bool) {
        self.state.lock().cta.is_loading = is_loading;
    }
    pub fn set_cta_disabled(&self, is_disabled: bool) {
        self.state.lock().cta.is_disabled = is_disabled;
    }
}

/// Navigation between console pages.
pub trait Navigator: Send + Sync {
    fn push(&self, path: &str);
    fn go_back(&self);
}

/// A [`Navigator`] which only remembers where it was sent.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    history: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }
    /// The current path, if any.
    pub fn current(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, path: &str) {
        self.history.lock().push(path.to_string());
    }
    fn go_back(&self) {
        self.history.lock().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_alerts_are_replaced() {
        let store = PageStore::new();
        store.add_alert(Alert::danger("first", "boom"));
        store.add_alert(Alert::new(AlertVariant::Warning, "old").with_key("k"));
        store.add_alert(Alert::new(AlertVariant::Warning, "new").with_key("k"));
        let alerts = store.alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].title, "new");
        assert_eq!(alerts[1].title, "first");

        store.dismiss_alert("k");
        assert_eq!(store.alerts().len(), 1);
        store.dismiss_first_alert();
        assert!(store.alerts().is_empty());
        store.dismiss_first_alert();
    }

    #[test]
    fn cta_starts_disabled() {
        let store = PageStore::new();
        assert_eq!(
            store.cta(),
            CallToAction {
                is_disabled: true,
                is_loading: false
            }
        );
        store.set_cta_loading(true);
        store.set_cta_disabled(false);
        assert!(store.cta().is_loading && !store.cta().is_disabled);
    }

    #[test]
    fn navigation() {
        let navigator = RecordingNavigator::new();
        navigator.push("/a");
        navigator.push("/b");
        navigator.go_back();
        assert_eq!(navigator.current().as_deref(), Some("/a"));
    }
}
