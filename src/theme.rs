//! Light/dark theme service
//!
//! One process-wide flag. Subscribers get the current value immediately and
//! every later change. Each change is persisted under the `theme` key and
//! mirrored to the `dark-theme` class on the style root, which the UI palette
//! is chosen from.

use crate::storage::{SharedStore, THEME_KEY};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

/// Class marking the dark theme on the style root
pub const DARK_THEME_CLASS: &str = "dark-theme";

/// Document-level class set (the `<html>` element's classList)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleRoot {
    classes: BTreeSet<String>,
}

impl StyleRoot {
    pub fn add(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    pub fn remove(&mut self, class: &str) {
        self.classes.remove(class);
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// OS-level color scheme preference
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorSchemeQuery {
    /// Explicit override from the config file
    pub override_dark: Option<bool>,
}

impl ColorSchemeQuery {
    pub fn new(override_dark: Option<bool>) -> Self {
        Self { override_dark }
    }

    /// `prefers-color-scheme: dark`
    pub fn prefers_dark(&self) -> bool {
        if let Some(dark) = self.override_dark {
            return dark;
        }
        // GTK desktops advertise dark variants as e.g. "Adwaita:dark"
        std::env::var("GTK_THEME")
            .map(|t| t.to_ascii_lowercase().contains("dark"))
            .unwrap_or(false)
    }
}

type Slot = Rc<RefCell<Option<bool>>>;

/// Receiving end of a theme subscription
///
/// Holds the newest value not yet taken. Dropping it unsubscribes.
pub struct ThemeSubscription {
    slot: Slot,
    current: bool,
}

impl ThemeSubscription {
    /// Newest value (drains pending notifications)
    pub fn latest(&mut self) -> bool {
        if let Some(v) = self.slot.borrow_mut().take() {
            self.current = v;
        }
        self.current
    }

    /// True if a value arrived since the last `latest()`
    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

pub struct ThemeService {
    dark: bool,
    subscribers: Vec<Weak<RefCell<Option<bool>>>>,
    store: SharedStore,
    root: StyleRoot,
}

impl ThemeService {
    /// Resolve the initial theme and apply it
    ///
    /// Stored `"dark"` wins. Any other stored value means light. With nothing
    /// stored the OS preference decides.
    pub fn new(store: SharedStore, query: ColorSchemeQuery) -> Self {
        let saved = store.borrow().get_item(THEME_KEY).map(str::to_string);
        let dark = match saved.as_deref() {
            Some("dark") => true,
            Some(s) if !s.is_empty() => false,
            _ => query.prefers_dark(),
        };

        let mut service = Self {
            dark: false,
            subscribers: Vec::new(),
            store,
            root: StyleRoot::default(),
        };
        service.set_dark_mode(dark);
        service
    }

    pub fn subscribe(&mut self) -> ThemeSubscription {
        let slot: Slot = Rc::new(RefCell::new(Some(self.dark)));
        self.subscribers.push(Rc::downgrade(&slot));
        ThemeSubscription { slot, current: self.dark }
    }

    pub fn toggle_theme(&mut self) {
        self.set_dark_mode(!self.dark);
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.dark = dark;

        self.subscribers.retain(|weak| match weak.upgrade() {
            Some(slot) => {
                *slot.borrow_mut() = Some(dark);
                true
            }
            None => false,
        });

        self.store
            .borrow_mut()
            .set_item(THEME_KEY, if dark { "dark" } else { "light" });

        if dark {
            self.root.add(DARK_THEME_CLASS);
        } else {
            self.root.remove(DARK_THEME_CLASS);
        }
        tracing::debug!(dark, "theme applied");
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark
    }

    pub fn root(&self) -> &StyleRoot {
        &self.root
    }

    /// Live subscriber count
    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.iter().filter(|w| w.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{shared, LocalStore};

    fn store_with(theme: Option<&str>) -> SharedStore {
        let mut store = LocalStore::in_memory();
        if let Some(t) = theme {
            store.set_item(THEME_KEY, t);
        }
        shared(store)
    }

    #[test]
    fn test_initial_value_precedence() {
        let os_dark = ColorSchemeQuery::new(Some(true));
        let os_light = ColorSchemeQuery::new(Some(false));

        assert!(ThemeService::new(store_with(Some("dark")), os_light).is_dark_mode());
        assert!(!ThemeService::new(store_with(Some("light")), os_dark).is_dark_mode());
        assert!(!ThemeService::new(store_with(Some("solarized")), os_dark).is_dark_mode());
        assert!(ThemeService::new(store_with(None), os_dark).is_dark_mode());
        assert!(ThemeService::new(store_with(Some("")), os_dark).is_dark_mode());
        assert!(!ThemeService::new(store_with(None), os_light).is_dark_mode());
    }

    #[test]
    fn test_construction_persists_and_marks_root() {
        let store = store_with(None);
        let service = ThemeService::new(store.clone(), ColorSchemeQuery::new(Some(true)));
        assert_eq!(store.borrow().get_item(THEME_KEY), Some("dark"));
        assert!(service.root().contains(DARK_THEME_CLASS));
    }

    #[test]
    fn test_toggle_twice_round_trips() {
        let store = store_with(Some("light"));
        let mut service = ThemeService::new(store.clone(), ColorSchemeQuery::default());
        let root_before = service.root().clone();

        service.toggle_theme();
        assert!(service.is_dark_mode());
        assert_eq!(store.borrow().get_item(THEME_KEY), Some("dark"));
        assert!(service.root().contains(DARK_THEME_CLASS));

        service.toggle_theme();
        assert!(!service.is_dark_mode());
        assert_eq!(store.borrow().get_item(THEME_KEY), Some("light"));
        assert_eq!(service.root(), &root_before);
    }

    #[test]
    fn test_subscribers_see_current_then_changes() {
        let mut service = ThemeService::new(store_with(Some("light")), ColorSchemeQuery::default());
        let mut sub = service.subscribe();
        assert!(sub.has_pending());
        assert!(!sub.latest());
        assert!(!sub.has_pending());

        service.toggle_theme();
        assert!(sub.latest());

        // Only the newest value matters
        service.toggle_theme();
        service.toggle_theme();
        assert!(sub.latest());
    }

    #[test]
    fn test_dropped_subscriptions_are_pruned() {
        let mut service = ThemeService::new(store_with(None), ColorSchemeQuery::new(Some(false)));
        let keep = service.subscribe();
        drop(service.subscribe());
        assert_eq!(service.subscriber_count(), 1);

        service.toggle_theme();
        assert_eq!(service.subscribers.len(), 1);
        drop(keep);
    }
}
