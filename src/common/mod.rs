//! Shared infrastructure used by the scene core, the remote adapters and the UI.

pub mod config;

pub use config::{BackendConfig, DEFAULT_CONFIG_FILE, EditorConfig, FieldConfig, PlannerConfig};
