//! Configuration module.
//!
//! This module provides the runtime settings of a test run and loads
//! them from configuration files.

pub mod loader;
pub mod settings;

pub use loader::SettingsLoader;
pub use settings::Settings;
