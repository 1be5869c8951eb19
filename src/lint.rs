//! Syntax checker
//!
//! Runs after buffer edits. Asks the interpreter to parse the buffer and turns
//! a parse failure into an editor annotation plus a summary in the syntax
//! error panel. Checker failures never block editing.

use crate::interpreter::{Interpreter, Runtime, SyntaxError};
use crate::playground::Surface;

/// Editor position, 0-indexed. A `None` column means the end of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub col: Option<usize>,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Self {
            line,
            col: Some(col),
        }
    }

    pub fn end_of_line(line: usize) -> Self {
        Self { line, col: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub from: Pos,
    pub to: Pos,
    pub message: String,
    pub severity: Severity,
}

impl Annotation {
    /// Span from the reported column to the end of the failing line.
    pub fn from_syntax_error(err: &SyntaxError) -> Self {
        let line = (err.line_number - 1).max(0) as usize;
        let col = match err.column_offset {
            Some(offset) if offset > 0 => (offset - 1) as usize,
            _ => 0,
        };
        Self {
            from: Pos::new(line, col),
            to: Pos::end_of_line(line),
            message: err.message.clone(),
            severity: Severity::Error,
        }
    }

    /// Whether this annotation covers any part of `line`.
    pub fn covers_line(&self, line: usize) -> bool {
        (self.from.line..=self.to.line).contains(&line)
    }
}

/// Summary shown in the syntax error panel, using the interpreter's 1-indexed numbers.
pub fn panel_message(err: &SyntaxError) -> String {
    format!(
        "Line {}, Column {}: {}",
        err.line_number,
        err.column_offset.unwrap_or(0),
        err.message
    )
}

/// Check `text` and update the error panel and run control to match.
pub async fn lint<R: Runtime>(
    interpreter: &mut Interpreter<R>,
    text: &str,
    surface: &mut Surface,
) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    surface.syntax_errors.hide();
    surface.run.enabled = true;

    match interpreter.check_syntax(text).await {
        Ok(None) => {}
        Ok(Some(err)) => {
            tracing::debug!(line = err.line_number, message = %err.message, "syntax error");
            annotations.push(Annotation::from_syntax_error(&err));
            surface.syntax_errors.show(panel_message(&err));
            surface.run.enabled = false;
        }
        Err(e) => {
            tracing::error!(error = %e, "syntax check failed");
        }
    }

    annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::fake::{FakeRuntime, Script};

    fn syntax_error(line_number: i64, column_offset: Option<i64>) -> SyntaxError {
        SyntaxError {
            line_number,
            column_offset,
            message: "invalid syntax".to_string(),
        }
    }

    #[test]
    fn annotation_is_zero_indexed() {
        let annotation = Annotation::from_syntax_error(&syntax_error(3, Some(7)));
        assert_eq!(annotation.from, Pos::new(2, 6));
        assert_eq!(annotation.to, Pos::end_of_line(2));
        assert_eq!(annotation.severity, Severity::Error);
        assert!(annotation.covers_line(2));
        assert!(!annotation.covers_line(3));
    }

    #[test]
    fn missing_or_zero_offset_starts_at_column_zero() {
        assert_eq!(
            Annotation::from_syntax_error(&syntax_error(1, None)).from,
            Pos::new(0, 0)
        );
        assert_eq!(
            Annotation::from_syntax_error(&syntax_error(1, Some(0))).from,
            Pos::new(0, 0)
        );
    }

    #[test]
    fn panel_message_uses_reported_numbers() {
        assert_eq!(
            panel_message(&syntax_error(1, Some(7))),
            "Line 1, Column 7: invalid syntax"
        );
    }

    #[tokio::test]
    async fn valid_buffer_clears_panel_and_enables_run() {
        let mut interp = Interpreter::with_runtime(FakeRuntime::new(Script::default()));
        let mut surface = Surface::default();
        surface.syntax_errors.show("Line 1, Column 1: stale");
        surface.run.enabled = false;

        let annotations = lint(&mut interp, "print('hi')", &mut surface).await;

        assert!(annotations.is_empty());
        assert!(surface.syntax_errors.message().is_none());
        assert!(surface.run.enabled);
    }

    #[tokio::test]
    async fn invalid_buffer_annotates_and_disables_run() {
        let mut interp = Interpreter::with_runtime(FakeRuntime::new(Script {
            syntax_error: Some((1, Some(7), "invalid syntax")),
            ..Script::default()
        }));
        let mut surface = Surface::default();

        let annotations = lint(&mut interp, "def f(:", &mut surface).await;

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].from, Pos::new(0, 6));
        assert_eq!(annotations[0].message, "invalid syntax");
        assert_eq!(
            surface.syntax_errors.message(),
            Some("Line 1, Column 7: invalid syntax")
        );
        assert!(!surface.run.enabled);
    }

    #[tokio::test]
    async fn checker_failure_fails_open() {
        let mut interp = Interpreter::with_runtime(FakeRuntime::new(Script {
            broken: true,
            ..Script::default()
        }));
        let mut surface = Surface::default();
        surface.run.enabled = false;

        let annotations = lint(&mut interp, "x = 1", &mut surface).await;

        assert!(annotations.is_empty());
        assert!(surface.syntax_errors.message().is_none());
        assert!(surface.run.enabled);
    }

    #[tokio::test]
    async fn scenario_b_with_real_interpreter() {
        if !crate::interpreter::python_available() {
            return;
        }
        let runtime = crate::interpreter::PythonProcess::load("python3")
            .await
            .unwrap();
        let mut interp = Interpreter::with_runtime(runtime);
        let mut surface = Surface::default();

        let annotations = lint(&mut interp, "def f(:", &mut surface).await;

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].from.line, 0);
        let message = surface.syntax_errors.message().unwrap_or_default();
        assert!(message.starts_with("Line 1, Column "), "{message}");
        assert!(!surface.run.enabled);

        let annotations = lint(&mut interp, "def f():\n    return 1\n", &mut surface).await;
        assert!(annotations.is_empty());
        assert!(surface.run.enabled);
    }
}
