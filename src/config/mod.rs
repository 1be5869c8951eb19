//! Configuration - `Settings` plus the Rhai engine that fills them in
//!
//! Loaded from `~/.config/pyground/init.rhai` when present.

mod engine;
mod settings;

pub use engine::ConfigEngine;
pub use settings::Settings;
