//! Ticket dashboard configuration.
//!
//! This crate provides:
//! - The immutable team roster and classification rules
//! - Source column names and presentation constants
//! - Runtime settings resolution (CLI → env → config file → defaults)

pub mod rules;
pub mod settings;

pub use rules::{CategoryRule, StateRule, CATEGORY_RULES, STATE_RULES, TEAM_ROSTER};
pub use settings::{resolve_settings, ConfigError, ResolvedSettings, Settings, SettingsOverrides};

/// Schema version for settings files.
pub const CONFIG_SCHEMA_VERSION: &str = td_common::SCHEMA_VERSION;
