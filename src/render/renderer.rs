use std::io::{self, Write, stdout};

use crossterm::{
    cursor::{Hide, MoveTo, SetCursorStyle, Show},
    execute, queue,
    style::{Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use crate::editor::{Editor, Mode};
use crate::output::LineKind;
use crate::playground::{OutputPanel, RunControl, Surface};
use crate::theme::{Color, Theme};

/// Lint marker column plus a 3-digit line number and a space
const GUTTER_WIDTH: u16 = 5;

/// Display options taken from settings
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub show_line_numbers: bool,
    pub relative_line_numbers: bool,
    pub output_height: u16,
}

pub struct Renderer {
    pub width: u16,
    pub height: u16,
    view: View,
}

impl Renderer {
    pub fn new(view: View) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self {
            width,
            height,
            view,
        })
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn setup() -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All)
        )?;
        Ok(())
    }

    pub fn teardown() -> io::Result<()> {
        execute!(
            stdout(),
            SetCursorStyle::DefaultUserShape,
            Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Rows left for the buffer once the panels and status line are placed
    pub fn text_height(&self, surface: &Surface) -> usize {
        let panel_rows = self.output_rows() + u16::from(surface.syntax_errors.message().is_some());
        self.height.saturating_sub(1 + panel_rows) as usize
    }

    fn text_width(&self) -> usize {
        self.width.saturating_sub(GUTTER_WIDTH) as usize
    }

    fn output_rows(&self) -> u16 {
        // Always leave a few rows for the buffer on small terminals
        self.view
            .output_height
            .min(self.height.saturating_sub(4) / 2)
    }

    pub fn render(
        &self,
        editor: &Editor,
        surface: &Surface,
        title: &str,
        theme: &Theme,
    ) -> io::Result<()> {
        let mut stdout = stdout();

        // Hide cursor during redraw to prevent flicker
        queue!(stdout, Hide)?;
        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;

        let text_height = self.text_height(surface) as u16;
        self.render_editor(&mut stdout, editor, text_height, theme)?;

        let mut row = text_height;
        if let Some(message) = surface.syntax_errors.message() {
            self.render_syntax_panel(&mut stdout, row, message, theme)?;
            row += 1;
        }
        self.render_output_panel(&mut stdout, row, &surface.output, surface.run, theme)?;

        self.render_status_line(&mut stdout, editor, surface.run, title, theme)?;
        self.position_cursor(&mut stdout, editor)?;

        stdout.flush()?;
        Ok(())
    }

    fn render_editor(
        &self,
        stdout: &mut impl Write,
        editor: &Editor,
        rows: u16,
        theme: &Theme,
    ) -> io::Result<()> {
        let line_count = editor.buffer.line_count();
        let text_width = self.text_width();
        let first_col = col_offset(editor.cursor.col, text_width);

        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;

        for row in 0..rows {
            let line_idx = row as usize + editor.scroll_offset;
            queue!(stdout, MoveTo(0, row))?;

            if line_idx >= line_count {
                // Empty line indicator
                queue!(stdout, SetForegroundColor(theme.line_number.to_crossterm()))?;
                queue!(stdout, Print(format!("{:<width$}", "  ~", width = GUTTER_WIDTH as usize)))?;
                queue!(stdout, Print(" ".repeat(text_width)))?;
                continue;
            }

            // Lint marker
            if editor.annotation_on(line_idx).is_some() {
                queue!(stdout, SetForegroundColor(theme.lint_marker.to_crossterm()))?;
                queue!(stdout, Print("●"))?;
            } else {
                queue!(stdout, Print(" "))?;
            }

            // Line number
            let is_cursor_line = line_idx == editor.cursor.line;
            if self.view.show_line_numbers {
                let line_num = if self.view.relative_line_numbers && !is_cursor_line {
                    line_idx.abs_diff(editor.cursor.line)
                } else {
                    line_idx + 1
                };
                let color = if is_cursor_line {
                    theme.line_number_active
                } else {
                    theme.line_number
                };
                queue!(stdout, SetForegroundColor(color.to_crossterm()))?;
                queue!(stdout, Print(format!("{:>3} ", line_num)))?;
            } else {
                queue!(stdout, Print("    "))?;
            }

            // Line content
            let content: String = editor
                .buffer
                .line(line_idx)
                .chars()
                .filter(|c| *c != '\n' && *c != '\r')
                .map(|c| if c == '\t' { ' ' } else { c })
                .skip(first_col)
                .take(text_width)
                .collect();
            queue!(stdout, SetForegroundColor(theme.foreground.to_crossterm()))?;
            queue!(stdout, Print(pad(&content, text_width)))?;
        }

        Ok(())
    }

    fn render_syntax_panel(
        &self,
        stdout: &mut impl Write,
        row: u16,
        message: &str,
        theme: &Theme,
    ) -> io::Result<()> {
        queue!(stdout, MoveTo(0, row))?;
        queue!(stdout, SetBackgroundColor(theme.panel_bg.to_crossterm()))?;
        queue!(stdout, SetForegroundColor(theme.error.to_crossterm()))?;
        queue!(stdout, SetAttribute(Attribute::Bold))?;
        queue!(stdout, Print(pad(&format!(" {}", message), self.width as usize)))?;
        queue!(stdout, SetAttribute(Attribute::Reset))?;
        Ok(())
    }

    fn render_output_panel(
        &self,
        stdout: &mut impl Write,
        top: u16,
        output: &OutputPanel,
        run: RunControl,
        theme: &Theme,
    ) -> io::Result<()> {
        let rows = self.output_rows();
        if rows == 0 {
            return Ok(());
        }
        let width = self.width as usize;

        // Title row
        queue!(stdout, MoveTo(0, top))?;
        queue!(stdout, SetBackgroundColor(theme.panel_bg.to_crossterm()))?;
        queue!(stdout, SetForegroundColor(theme.panel_border.to_crossterm()))?;
        let title = if run.busy { "─ Output (running) " } else { "─ Output " };
        let rule = "─".repeat(width.saturating_sub(title.chars().count()));
        queue!(stdout, Print(format!("{}{}", title, rule)))?;

        let lines: Vec<(String, Color)> = match output {
            OutputPanel::Empty => Vec::new(),
            OutputPanel::Failed(error) => {
                let mut lines = vec![(crate::output::RUN_FAILED.to_string(), theme.warning)];
                lines.extend(error.lines().map(|l| (l.to_string(), theme.error)));
                lines
            }
            OutputPanel::Lines(rendered) => rendered
                .iter()
                .map(|line| {
                    let color = match line.kind {
                        LineKind::Normal => theme.output_fg,
                        LineKind::Error => theme.error,
                        LineKind::Separator => theme.warning,
                    };
                    (line.text.replace('\t', "    "), color)
                })
                .collect(),
        };

        // Show the tail so the latest output stays visible
        let body_rows = (rows - 1) as usize;
        let skip = lines.len().saturating_sub(body_rows);
        let mut visible = lines.into_iter().skip(skip);

        for row in 0..body_rows {
            queue!(stdout, MoveTo(0, top + 1 + row as u16))?;
            match visible.next() {
                Some((text, color)) => {
                    queue!(stdout, SetForegroundColor(color.to_crossterm()))?;
                    queue!(stdout, Print(pad(&format!(" {}", text), width)))?;
                }
                None => queue!(stdout, Print(" ".repeat(width)))?,
            }
        }

        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
        Ok(())
    }

    fn render_status_line(
        &self,
        stdout: &mut impl Write,
        editor: &Editor,
        run: RunControl,
        title: &str,
        theme: &Theme,
    ) -> io::Result<()> {
        let status_row = self.height.saturating_sub(1);
        queue!(stdout, MoveTo(0, status_row))?;

        // Command mode - just show the command
        if editor.mode == Mode::Command {
            queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
            queue!(stdout, SetForegroundColor(theme.foreground.to_crossterm()))?;
            queue!(stdout, Clear(ClearType::CurrentLine))?;
            queue!(stdout, Print(format!(":{}", editor.command_buffer)))?;
            return Ok(());
        }

        // Message - show prominently
        if let Some(ref msg) = editor.message {
            queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
            queue!(stdout, SetForegroundColor(theme.warning.to_crossterm()))?;
            queue!(stdout, Clear(ClearType::CurrentLine))?;
            queue!(stdout, Print(msg))?;
            return Ok(());
        }

        queue!(stdout, SetBackgroundColor(theme.status_bar_bg.to_crossterm()))?;
        queue!(stdout, SetForegroundColor(theme.status_bar_fg.to_crossterm()))?;

        let left = format!(" {} | {} ", editor.mode.display(), title);
        let run_label = run_label(run);
        let right = format!(" {}:{} ", editor.cursor.line + 1, editor.cursor.col + 1);

        let used = left.chars().count() + run_label.chars().count() + right.chars().count();
        let padding = (self.width as usize).saturating_sub(used);

        queue!(stdout, Print(&left))?;
        queue!(stdout, Print(" ".repeat(padding)))?;
        if !run_label.is_empty() {
            let color = if run.enabled && !run.busy {
                theme.run_enabled
            } else {
                theme.run_disabled
            };
            queue!(stdout, SetForegroundColor(color.to_crossterm()))?;
            queue!(stdout, SetAttribute(Attribute::Bold))?;
            queue!(stdout, Print(run_label))?;
            queue!(stdout, SetAttribute(Attribute::Reset))?;
            queue!(stdout, SetBackgroundColor(theme.status_bar_bg.to_crossterm()))?;
            queue!(stdout, SetForegroundColor(theme.status_bar_fg.to_crossterm()))?;
        }
        queue!(stdout, Print(&right))?;
        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;

        Ok(())
    }

    fn position_cursor(&self, stdout: &mut impl Write, editor: &Editor) -> io::Result<()> {
        if editor.mode == Mode::Command {
            let cmd_col = 1 + editor.command_buffer.chars().count() as u16;
            queue!(stdout, MoveTo(cmd_col, self.height.saturating_sub(1)))?;
            queue!(stdout, SetCursorStyle::BlinkingBar)?;
        } else {
            let text_width = self.text_width();
            let col = editor.cursor.col - col_offset(editor.cursor.col, text_width);
            let cursor_x = (GUTTER_WIDTH as usize + col).min(self.width.saturating_sub(1) as usize);
            let cursor_x = cursor_x as u16;
            let cursor_y = editor.cursor.line.saturating_sub(editor.scroll_offset) as u16;
            queue!(stdout, MoveTo(cursor_x, cursor_y))?;

            let cursor_style = match editor.mode {
                Mode::Insert => SetCursorStyle::BlinkingBar,
                _ => SetCursorStyle::SteadyBlock,
            };
            queue!(stdout, cursor_style)?;
        }
        queue!(stdout, Show)?;
        Ok(())
    }
}

/// Status line text for the run control. Empty when the control is hidden.
fn run_label(run: RunControl) -> &'static str {
    if !run.visible {
        ""
    } else if run.busy {
        "[ Running… ]"
    } else if run.enabled {
        "[ ▶ Run F5 ]"
    } else {
        "[ Run ✗ ]"
    }
}

/// First visible column of every buffer line, scrolled so the cursor stays on screen
fn col_offset(cursor_col: usize, text_width: usize) -> usize {
    (cursor_col + 1).saturating_sub(text_width.max(1))
}

/// Pad or cut `text` to exactly `width` characters
fn pad(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}
