use std::{io, path::Path};

use super::{Buffer, Cursor, Mode};
use crate::lint::Annotation;

/// Work the editor hands back to the playground because it needs the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Run,
}

pub struct Editor {
    pub buffer: Buffer,
    pub cursor: Cursor,
    pub mode: Mode,
    pub command_buffer: String,
    pub running: bool,
    pub message: Option<String>,
    pub scroll_offset: usize,
    tab_width: usize,
    insert_spaces: bool,
    revision: u64,
    annotations: Vec<Annotation>,
}

impl Editor {
    pub fn new() -> Self {
        Self::with_buffer(Buffer::new())
    }

    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::with_buffer(Buffer::from_file(path)?))
    }

    pub fn with_buffer(buffer: Buffer) -> Self {
        Self {
            buffer,
            cursor: Cursor::new(),
            mode: Mode::default(),
            command_buffer: String::new(),
            running: true,
            message: None,
            scroll_offset: 0,
            tab_width: 4,
            insert_spaces: true,
            revision: 0,
            annotations: Vec::new(),
        }
    }

    pub fn set_indent(&mut self, tab_width: usize, insert_spaces: bool) {
        self.tab_width = tab_width;
        self.insert_spaces = insert_spaces;
    }

    /// Current buffer contents
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Bumped on every edit. Observers compare it to the last value they saw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn changed(&mut self) {
        self.revision += 1;
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    /// First annotation touching `line`, for the gutter marker
    pub fn annotation_on(&self, line: usize) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.covers_line(line))
    }

    /// Adjust scroll offset to keep cursor visible within viewport
    pub fn adjust_scroll(&mut self, viewport_height: usize) {
        // Cursor above viewport - scroll up
        if self.cursor.line < self.scroll_offset {
            self.scroll_offset = self.cursor.line;
        }
        // Cursor below viewport - scroll down
        if viewport_height > 0 && self.cursor.line >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.cursor.line - viewport_height + 1;
        }
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn move_left(&mut self) {
        self.cursor.move_left();
    }

    pub fn move_right(&mut self) {
        self.cursor.move_right(&self.buffer);
    }

    pub fn move_up(&mut self) {
        self.cursor.move_up(&self.buffer);
    }

    pub fn move_down(&mut self) {
        self.cursor.move_down(&self.buffer);
    }

    /// Move to start of line (0)
    pub fn move_to_line_start(&mut self) {
        self.cursor.col = 0;
    }

    /// Move to end of line ($)
    pub fn move_to_line_end(&mut self) {
        self.cursor.col = self.buffer.line_len(self.cursor.line).saturating_sub(1);
    }

    /// Move to first line (g)
    pub fn move_to_first_line(&mut self) {
        self.cursor.line = 0;
        self.cursor.clamp(&self.buffer);
    }

    /// Move to last line (G)
    pub fn move_to_last_line(&mut self) {
        self.cursor.line = self.buffer.line_count().saturating_sub(1);
        self.cursor.clamp(&self.buffer);
    }

    /// Jump to an annotation, e.g. the current syntax error
    pub fn jump_to(&mut self, annotation: &Annotation) {
        self.cursor.line = annotation.from.line;
        self.cursor.col = annotation.from.col.unwrap_or(0);
        self.cursor.clamp(&self.buffer);
    }

    fn is_word_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    /// Move to start of next word (w)
    pub fn move_word_forward(&mut self) {
        let line_count = self.buffer.line_count();

        while let Some(c) = self.buffer.char_at(self.cursor.line, self.cursor.col) {
            if !Self::is_word_char(c) {
                break;
            }
            self.cursor.col += 1;
        }

        loop {
            match self.buffer.char_at(self.cursor.line, self.cursor.col) {
                Some(c) if Self::is_word_char(c) => break,
                Some(_) => self.cursor.col += 1,
                None if self.cursor.line + 1 < line_count => {
                    self.cursor.line += 1;
                    self.cursor.col = 0;
                }
                None => break,
            }
        }
        self.cursor.clamp(&self.buffer);
    }

    /// Move to start of previous word (b)
    pub fn move_word_backward(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.col = self.buffer.line_len(self.cursor.line).saturating_sub(1);
        }

        loop {
            match self.buffer.char_at(self.cursor.line, self.cursor.col) {
                Some(c) if Self::is_word_char(c) => break,
                Some(_) if self.cursor.col > 0 => self.cursor.col -= 1,
                _ if self.cursor.line > 0 => {
                    self.cursor.line -= 1;
                    self.cursor.col = self.buffer.line_len(self.cursor.line).saturating_sub(1);
                }
                _ => return,
            }
        }

        while self.cursor.col > 0 {
            match self.buffer.char_at(self.cursor.line, self.cursor.col - 1) {
                Some(c) if Self::is_word_char(c) => self.cursor.col -= 1,
                _ => break,
            }
        }
    }

    pub fn enter_insert_mode(&mut self) {
        self.mode = Mode::Insert;
    }

    /// Append after cursor (a)
    pub fn append(&mut self) {
        if self.cursor.col < self.buffer.line_len(self.cursor.line) {
            self.cursor.col += 1;
        }
        self.enter_insert_mode();
    }

    /// Append at end of line (A)
    pub fn append_end_of_line(&mut self) {
        self.cursor.col = self.buffer.line_len(self.cursor.line);
        self.enter_insert_mode();
    }

    /// Open line below (o)
    pub fn open_line_below(&mut self) {
        let line_len = self.buffer.line_len(self.cursor.line);
        self.buffer.insert_newline(self.cursor.line, line_len);
        self.cursor = Cursor::at(self.cursor.line + 1, 0);
        self.changed();
        self.enter_insert_mode();
    }

    /// Open line above (O)
    pub fn open_line_above(&mut self) {
        self.buffer.insert_newline(self.cursor.line, 0);
        self.cursor.col = 0;
        self.changed();
        self.enter_insert_mode();
    }

    pub fn enter_normal_mode(&mut self) {
        self.mode = Mode::Normal;
        self.command_buffer.clear();
        self.cursor.clamp(&self.buffer);
    }

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_buffer.clear();
    }

    /// Run the `:` command line. Commands that need the interpreter come back as a `Request`.
    pub fn execute_command(&mut self) -> Option<Request> {
        let cmd = self.command_buffer.trim().to_string();
        let request = match cmd.as_str() {
            "q" | "quit" => {
                self.quit();
                None
            }
            "r" | "run" => Some(Request::Run),
            "" => None,
            _ => {
                self.set_message(format!("Unknown command: {}", cmd));
                None
            }
        };
        self.command_buffer.clear();
        self.mode = Mode::Normal;
        request
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    // Text editing
    pub fn insert_char(&mut self, ch: char) {
        self.buffer
            .insert_char(self.cursor.line, self.cursor.col, ch);
        self.cursor.col += 1;
        self.changed();
    }

    /// Insert one level of indentation at the cursor
    pub fn insert_tab(&mut self) {
        if self.insert_spaces {
            let width = self.tab_width - self.cursor.col % self.tab_width.max(1);
            let spaces = " ".repeat(width);
            self.buffer
                .insert_str(self.cursor.line, self.cursor.col, &spaces);
            self.cursor.col += width;
            self.changed();
        } else {
            self.insert_char('\t');
        }
    }

    pub fn delete_char_backward(&mut self) {
        if self.cursor.col > 0 {
            self.buffer
                .delete_char_backward(self.cursor.line, self.cursor.col);
            self.cursor.col -= 1;
            self.changed();
        } else if self.cursor.line > 0 {
            // Join with previous line
            let prev_line_len = self.buffer.line_len(self.cursor.line - 1);
            self.buffer
                .delete_char_backward(self.cursor.line, self.cursor.col);
            self.cursor = Cursor::at(self.cursor.line - 1, prev_line_len);
            self.changed();
        }
    }

    /// Delete the character under the cursor (x)
    pub fn delete_char_under_cursor(&mut self) {
        if self.cursor.col < self.buffer.line_len(self.cursor.line)
            && self.buffer.delete_char(self.cursor.line, self.cursor.col)
        {
            self.cursor.clamp(&self.buffer);
            self.changed();
        }
    }

    /// Delete the current line (dd)
    pub fn delete_line(&mut self) {
        self.buffer.delete_line(self.cursor.line);
        self.cursor.clamp(&self.buffer);
        self.changed();
    }

    pub fn insert_newline(&mut self) {
        self.buffer
            .insert_newline(self.cursor.line, self.cursor.col);
        self.cursor = Cursor::at(self.cursor.line + 1, 0);
        self.changed();
    }

    /// Insert pasted text, which may span several lines
    pub fn insert_text(&mut self, text: &str) {
        for ch in text.chars() {
            match ch {
                '\r' => {}
                '\n' => self.insert_newline(),
                c => self.insert_char(c),
            }
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
