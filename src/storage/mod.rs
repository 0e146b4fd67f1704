//! Persistent key/value storage
//!
//! A small local-storage equivalent: string keys to string values, persisted
//! as one JSON file in the user's config directory. Theme preference, session
//! token and dashboard settings all live here. Any part of the app can read or
//! write any key.

pub mod local;

pub use local::LocalStore;

use std::cell::RefCell;
use std::rc::Rc;

/// Theme preference (`"dark"` / `"light"`)
pub const THEME_KEY: &str = "theme";

/// Session token returned by the login endpoint
pub const TOKEN_KEY: &str = "token";

/// Dashboard settings (JSON object)
pub const SETTINGS_KEY: &str = "settings";

/// Store handle shared by the UI-thread services
pub type SharedStore = Rc<RefCell<LocalStore>>;

/// Wrap a store for sharing between services
pub fn shared(store: LocalStore) -> SharedStore {
    Rc::new(RefCell::new(store))
}

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The backing file exists but is not a JSON string map
    #[error("corrupt storage file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
