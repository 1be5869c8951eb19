/// Playground settings that can be customized via Rhai config
#[derive(Debug, Clone)]
pub struct Settings {
    // Display
    pub theme: String,
    pub show_line_numbers: bool,
    pub relative_line_numbers: bool,
    pub output_height: u16,

    // Editing
    pub tab_width: usize,
    pub insert_spaces: bool, // Use spaces instead of tabs

    // Interpreter
    pub python: String,
    pub lint_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "dracula".to_string(),
            show_line_numbers: true,
            relative_line_numbers: false,
            output_height: 10,

            tab_width: 4,
            insert_spaces: true,

            python: "python3".to_string(),
            lint_delay_ms: 300,
        }
    }
}
