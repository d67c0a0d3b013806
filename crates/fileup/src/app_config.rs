//! 🔧 App Configuration — the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because hand-parsing env vars is a form of self-harm
//! that even the borrow checker wouldn't approve of.
//!
//! 🧠 Knowledge graph: each section's struct lives next to the thing it configures
//! (`ServiceConfig` by the backends, `ImportConfig` by the importer,
//! `IndexPatternConfig` by the pattern manager). This file only glues them together.

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

pub use crate::backends::ServiceConfig;
pub use crate::importer::{DocCountMode, ImportConfig};
pub use crate::index_patterns::IndexPatternConfig;

/// 📦 One struct to rule them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Where the import routes and the saved-object store live.
    pub service: ServiceConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub index_patterns: IndexPatternConfig,
}

/// 🚀 Load the config — from a file, from env vars, or from the sheer power of hoping.
///
/// 🔧 `FILEUP_*` env vars are the base layer; nested keys use `__`
/// (`FILEUP_SERVICE__URL`, `FILEUP_IMPORT__CHUNK_SIZE`). A TOML file, when given,
/// is merged on top and wins on conflicts. No file means env only. No pizza defaults.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("FILEUP_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (FILEUP_*). \
             The file exists in our hearts, but apparently not in a shape serde recognizes.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (FILEUP_*). \
                 No file was provided — this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}
