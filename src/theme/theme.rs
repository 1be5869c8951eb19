use super::Color;

/// Complete theme definition
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // Editor
    pub background: Color,
    pub foreground: Color,
    pub line_number: Color,
    pub line_number_active: Color,
    pub lint_marker: Color,

    // Status line and run control
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub run_enabled: Color,
    pub run_disabled: Color,

    // Panels below the editor
    pub panel_bg: Color,
    pub panel_border: Color,
    pub output_fg: Color,

    // Diagnostics
    pub error: Color,
    pub warning: Color,
}

impl Theme {
    /// Dracula - the playground default
    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            background: Color::hex(0x282a36),
            foreground: Color::hex(0xf8f8f2),
            line_number: Color::hex(0x6272a4),
            line_number_active: Color::hex(0xf8f8f2),
            lint_marker: Color::hex(0xff5555),

            status_bar_bg: Color::hex(0x44475a),
            status_bar_fg: Color::hex(0xf8f8f2),
            run_enabled: Color::hex(0x50fa7b),
            run_disabled: Color::hex(0x6272a4),

            panel_bg: Color::hex(0x21222c),
            panel_border: Color::hex(0xbd93f9),
            output_fg: Color::hex(0xf8f8f2),

            error: Color::hex(0xff5555),
            warning: Color::hex(0xffb86c),
        }
    }

    /// Gruvbox Dark - warm retro theme
    pub fn gruvbox_dark() -> Self {
        Self {
            name: "gruvbox-dark".to_string(),
            background: Color::hex(0x282828),
            foreground: Color::hex(0xebdbb2),
            line_number: Color::hex(0x665c54),
            line_number_active: Color::hex(0xfabd2f),
            lint_marker: Color::hex(0xfb4934),

            status_bar_bg: Color::hex(0x3c3836),
            status_bar_fg: Color::hex(0xebdbb2),
            run_enabled: Color::hex(0xb8bb26),
            run_disabled: Color::hex(0x665c54),

            panel_bg: Color::hex(0x1d2021),
            panel_border: Color::hex(0xfe8019),
            output_fg: Color::hex(0xebdbb2),

            error: Color::hex(0xfb4934),
            warning: Color::hex(0xfabd2f),
        }
    }

    /// Nord - arctic, north-bluish theme
    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            background: Color::hex(0x2e3440),
            foreground: Color::hex(0xd8dee9),
            line_number: Color::hex(0x4c566a),
            line_number_active: Color::hex(0xd8dee9),
            lint_marker: Color::hex(0xbf616a),

            status_bar_bg: Color::hex(0x3b4252),
            status_bar_fg: Color::hex(0xd8dee9),
            run_enabled: Color::hex(0xa3be8c),
            run_disabled: Color::hex(0x4c566a),

            panel_bg: Color::hex(0x3b4252),
            panel_border: Color::hex(0x88c0d0),
            output_fg: Color::hex(0xd8dee9),

            error: Color::hex(0xbf616a),
            warning: Color::hex(0xebcb8b),
        }
    }

    /// Solarized Dark
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),
            background: Color::hex(0x002b36),
            foreground: Color::hex(0x839496),
            line_number: Color::hex(0x586e75),
            line_number_active: Color::hex(0x93a1a1),
            lint_marker: Color::hex(0xdc322f),

            status_bar_bg: Color::hex(0x073642),
            status_bar_fg: Color::hex(0x839496),
            run_enabled: Color::hex(0x859900),
            run_disabled: Color::hex(0x586e75),

            panel_bg: Color::hex(0x073642),
            panel_border: Color::hex(0x268bd2),
            output_fg: Color::hex(0x93a1a1),

            error: Color::hex(0xdc322f),
            warning: Color::hex(0xcb4b16),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dracula()
    }
}
