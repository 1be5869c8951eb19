//! Tracing setup
//!
//! The full-screen UI owns the terminal, so it logs to a file in the config
//! directory. Headless commands log to stderr. `PYGROUND_LOG` takes an
//! `EnvFilter` directive, e.g. `PYGROUND_LOG=pyground=debug`.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::ConfigEngine;

const ENV_VAR: &str = "PYGROUND_LOG";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn log_file() -> Option<PathBuf> {
    ConfigEngine::config_dir().map(|dir| dir.join("pyground.log"))
}

/// Log to `pyground.log`. Logging is skipped if the file cannot be created.
pub fn init_for_tui() {
    let Some(path) = log_file() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let Ok(file) = File::create(&path) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("pyground=info"))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

pub fn init_for_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("pyground=warn"))
        .with_writer(std::io::stderr)
        .try_init();
}
