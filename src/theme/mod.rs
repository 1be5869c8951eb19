mod colors;
mod theme;

pub use colors::Color;
pub use theme::Theme;

pub fn list_builtin_themes() -> Vec<&'static str> {
    vec!["dracula", "gruvbox-dark", "nord", "solarized-dark"]
}

pub fn get_builtin_theme(name: &str) -> Option<Theme> {
    match name {
        "dracula" => Some(Theme::dracula()),
        "gruvbox-dark" => Some(Theme::gruvbox_dark()),
        "nord" => Some(Theme::nord()),
        "solarized-dark" => Some(Theme::solarized_dark()),
        _ => None,
    }
}
