//! UI layer for the desktop GUI: the app shell and its panels.

pub mod app;

pub use app::{ConverterApp, PersistedSettings, DEFAULT_SERVER_URL, SETTINGS_STORAGE_KEY};
