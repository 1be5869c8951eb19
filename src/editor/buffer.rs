use ropey::Rope;
use std::{fs::File, io, path::Path};

/// The playground's source buffer
pub struct Buffer {
    text: Rope,
}

impl Buffer {
    pub fn new() -> Self {
        Self { text: Rope::new() }
    }

    /// Seed a buffer from a file. The buffer is never written back.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = Rope::from_reader(File::open(path)?)?;
        Ok(Self { text })
    }

    pub fn from_text(s: &str) -> Self {
        Self {
            text: Rope::from_str(s),
        }
    }

    /// The whole buffer as a string
    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// True when the buffer holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    pub fn line(&self, idx: usize) -> ropey::RopeSlice<'_> {
        self.text.line(idx)
    }

    pub fn line_len(&self, idx: usize) -> usize {
        // Length excluding newline character
        let line = self.text.line(idx);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Get character at position, returns None if out of bounds
    pub fn char_at(&self, line: usize, col: usize) -> Option<char> {
        if line >= self.line_count() {
            return None;
        }
        let rope_line = self.text.line(line);
        if col >= rope_line.len_chars() {
            return None;
        }
        Some(rope_line.char(col))
    }

    /// Convert (line, col) to a char index in the rope
    fn line_col_to_char(&self, line: usize, col: usize) -> usize {
        self.text.line_to_char(line) + col
    }

    /// Insert a character at the given position
    pub fn insert_char(&mut self, line: usize, col: usize, ch: char) {
        let idx = self.line_col_to_char(line, col);
        self.text.insert_char(idx, ch);
    }

    /// Insert a string at the given position
    pub fn insert_str(&mut self, line: usize, col: usize, s: &str) {
        let idx = self.line_col_to_char(line, col);
        self.text.insert(idx, s);
    }

    /// Delete the character at the given position
    pub fn delete_char(&mut self, line: usize, col: usize) -> bool {
        let idx = self.line_col_to_char(line, col);
        if idx < self.text.len_chars() {
            self.text.remove(idx..idx + 1);
            true
        } else {
            false
        }
    }

    /// Delete the character before the given position (backspace)
    pub fn delete_char_backward(&mut self, line: usize, col: usize) -> bool {
        if col > 0 {
            self.delete_char(line, col - 1)
        } else if line > 0 {
            // At start of line, join with previous line
            let idx = self.line_col_to_char(line, 0);
            if idx > 0 {
                self.text.remove(idx - 1..idx);
                return true;
            }
            false
        } else {
            false
        }
    }

    /// Delete a whole line, including its newline
    pub fn delete_line(&mut self, line: usize) {
        if line >= self.line_count() {
            return;
        }
        let start = self.text.line_to_char(line);
        let end = if line + 1 < self.line_count() {
            self.text.line_to_char(line + 1)
        } else {
            self.text.len_chars()
        };
        // Last line: also take the newline that ends the previous one
        let start = if end == self.text.len_chars() && start > 0 && line + 1 == self.line_count()
        {
            start - 1
        } else {
            start
        };
        self.text.remove(start..end);
    }

    /// Insert a newline at the given position
    pub fn insert_newline(&mut self, line: usize, col: usize) {
        self.insert_char(line, col, '\n');
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}
