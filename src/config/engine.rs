use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use rhai::{Engine, Scope};

use super::Settings;
use crate::error::Error;

/// The Rhai scripting engine for configuration
pub struct ConfigEngine {
    engine: Engine,
    settings: Arc<RwLock<Settings>>,
}

impl ConfigEngine {
    pub fn new() -> Self {
        let settings = Arc::new(RwLock::new(Settings::default()));
        let engine = Self::create_engine(Arc::clone(&settings));

        Self { engine, settings }
    }

    fn create_engine(settings: Arc<RwLock<Settings>>) -> Engine {
        let mut engine = Engine::new();

        // Limit script execution for safety
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(100_000);

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_theme", move |name: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.theme = name.to_string();
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("get_theme", move || -> String {
                s.read().map(|s| s.theme.clone()).unwrap_or_default()
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_tab_width", move |width: i64| {
                if let Ok(mut settings) = s.write() {
                    settings.tab_width = width.clamp(1, 16) as usize;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_insert_spaces", move |enabled: bool| {
                if let Ok(mut settings) = s.write() {
                    settings.insert_spaces = enabled;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_show_line_numbers", move |enabled: bool| {
                if let Ok(mut settings) = s.write() {
                    settings.show_line_numbers = enabled;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_relative_line_numbers", move |enabled: bool| {
                if let Ok(mut settings) = s.write() {
                    settings.relative_line_numbers = enabled;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_output_height", move |rows: i64| {
                if let Ok(mut settings) = s.write() {
                    settings.output_height = rows.clamp(3, 100) as u16;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_python", move |executable: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.python = executable.to_string();
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_lint_delay", move |millis: i64| {
                if let Ok(mut settings) = s.write() {
                    settings.lint_delay_ms = millis.clamp(0, 10_000) as u64;
                }
            });
        }

        engine.register_fn("print", |msg: &str| {
            tracing::info!(target: "pyground::config", "{}", msg);
        });

        engine
    }

    /// Load and execute a config file
    pub fn load_file(&mut self, path: &Path) -> Result<(), Error> {
        let content = std::fs::read_to_string(path)?;
        self.eval(&content)
    }

    /// Evaluate a Rhai script string
    pub fn eval(&mut self, script: &str) -> Result<(), Error> {
        let ast = self
            .engine
            .compile(script)
            .map_err(|e| Error::Config(format!("parse error: {}", e)))?;

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(())
    }

    /// Get the current settings (cloned)
    pub fn settings(&self) -> Settings {
        self.settings.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Get the config directory path
    /// Uses ~/.config/pyground/ on all platforms for consistency
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("pyground"))
    }

    /// Get the default config file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("init.rhai"))
    }

    /// Load the default config file if it exists
    pub fn load_default(&mut self) -> Result<(), Error> {
        if let Some(config_file) = Self::config_file() {
            if config_file.exists() {
                tracing::info!(path = %config_file.display(), "loading config");
                return self.load_file(&config_file);
            }
        }
        Ok(()) // No config file is fine
    }
}

impl Default for ConfigEngine {
    fn default() -> Self {
        Self::new()
    }
}
