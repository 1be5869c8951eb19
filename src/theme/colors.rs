/// A color that can be used in the playground
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value
    pub const fn hex(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_unpacks_channels() {
        let color = Color::hex(0xff5500);
        assert_eq!(color, Color::rgb(255, 85, 0));
    }

    #[test]
    fn to_crossterm_keeps_channels() {
        assert_eq!(
            Color::hex(0x282a36).to_crossterm(),
            crossterm::style::Color::Rgb {
                r: 0x28,
                g: 0x2a,
                b: 0x36
            }
        );
    }
}
