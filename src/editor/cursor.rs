use super::Buffer;

/// Cursor position in the buffer, 0-indexed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    pub fn move_left(&mut self) {
        self.col = self.col.saturating_sub(1);
    }

    pub fn move_right(&mut self, buffer: &Buffer) {
        self.col = (self.col + 1).min(buffer.line_len(self.line));
    }

    pub fn move_up(&mut self, buffer: &Buffer) {
        self.line = self.line.saturating_sub(1);
        self.clamp(buffer);
    }

    pub fn move_down(&mut self, buffer: &Buffer) {
        self.line = (self.line + 1).min(buffer.line_count().saturating_sub(1));
        self.clamp(buffer);
    }

    /// Pull the cursor back inside the buffer after an edit or motion
    pub fn clamp(&mut self, buffer: &Buffer) {
        self.line = self.line.min(buffer.line_count().saturating_sub(1));
        self.col = self.col.min(buffer.line_len(self.line));
    }
}
