// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./newsmith.toml` >
//! `~/.config/newsmith/newsmith.toml` > `/etc/newsmith/newsmith.toml`,
//! with environment variable overrides via the `NEWSMITH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::NewsmithConfig;

/// Load configuration from the standard XDG hierarchy with env overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/newsmith/newsmith.toml` (system-wide)
/// 3. `~/.config/newsmith/newsmith.toml` (user XDG config)
/// 4. `./newsmith.toml` (local directory)
/// 5. `NEWSMITH_*` environment variables
pub fn load_config() -> Result<NewsmithConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NewsmithConfig::default()))
        .merge(Toml::file("/etc/newsmith/newsmith.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("newsmith/newsmith.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("newsmith.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from inline TOML only (no XDG lookup). Used for
/// testing and explicit overrides.
pub fn load_config_from_str(toml_content: &str) -> Result<NewsmithConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NewsmithConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<NewsmithConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NewsmithConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `NEWSMITH_WORKFLOW_REQUEST_TIMEOUT_SECS`
/// must map to `workflow.request_timeout_secs`, not `workflow.request.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("NEWSMITH_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("llm_", "llm.", 1)
            .replacen("embedding_", "embedding.", 1)
            .replacen("retrieval_", "retrieval.", 1)
            .replacen("vector_", "vector.", 1)
            .replacen("scraper_", "scraper.", 1)
            .replacen("workflow_", "workflow.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
