// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loading for the Newsmith pipeline.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::NewsmithConfig;
pub use validation::{validate, Diagnostic};
