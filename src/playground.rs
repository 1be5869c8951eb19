//! The playground - editor, interpreter, and the panels they drive
//!
//! Everything the user sees besides the buffer lives in [`Surface`]: the
//! syntax error panel, the output panel, and the run control. The playground
//! sequences the checker and the run action against one interpreter session.

use std::time::Duration;

use crate::editor::Editor;
use crate::interpreter::{Interpreter, PythonProcess, Runtime};
use crate::lint;
use crate::output::{self, RenderedLine};

/// Summary panel above the output. Hidden unless the buffer fails to parse.
#[derive(Debug, Default)]
pub struct SyntaxPanel {
    message: Option<String>,
}

impl SyntaxPanel {
    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn hide(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// What the last run left in the output panel.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum OutputPanel {
    #[default]
    Empty,
    Lines(Vec<RenderedLine>),
    /// The run itself failed; holds the error text.
    Failed(String),
}

impl OutputPanel {
    /// Page markup for the panel, matching what a browser host would insert.
    pub fn to_html(&self) -> String {
        match self {
            OutputPanel::Empty => String::new(),
            OutputPanel::Lines(lines) => output::to_html(lines),
            OutputPanel::Failed(error) => output::failure_html(error),
        }
    }
}

/// The run button. Visibility follows buffer content, `enabled` follows the
/// last syntax check, and `busy` is set while a run is outstanding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunControl {
    pub visible: bool,
    pub enabled: bool,
    pub busy: bool,
}

impl RunControl {
    pub fn can_run(&self) -> bool {
        self.visible && self.enabled && !self.busy
    }
}

#[derive(Debug, Default)]
pub struct Surface {
    pub syntax_errors: SyntaxPanel,
    pub output: OutputPanel,
    pub run: RunControl,
}

pub struct Playground<R = PythonProcess> {
    pub editor: Editor,
    pub surface: Surface,
    interpreter: Interpreter<R>,
    lint_delay: Duration,
    seen_revision: u64,
    linted_revision: Option<u64>,
}

impl<R: Runtime> Playground<R> {
    pub fn new(editor: Editor, interpreter: Interpreter<R>, lint_delay: Duration) -> Self {
        let mut playground = Self {
            editor,
            surface: Surface::default(),
            interpreter,
            lint_delay,
            seen_revision: 0,
            linted_revision: None,
        };
        // A seeded buffer counts as an edit.
        playground.on_change();
        playground
    }

    pub fn lint_delay(&self) -> Duration {
        self.lint_delay
    }

    /// Pick up edits since the last call. Returns true if the buffer changed.
    pub fn poll_change(&mut self) -> bool {
        let revision = self.editor.revision();
        if revision == self.seen_revision {
            return false;
        }
        self.seen_revision = revision;
        self.on_change();
        true
    }

    /// Change notification: the run control is shown whenever there is code.
    fn on_change(&mut self) {
        self.surface.run.visible = !self.editor.buffer.is_blank();
    }

    /// True when the buffer changed since the last syntax check.
    pub fn needs_lint(&self) -> bool {
        self.linted_revision != Some(self.editor.revision())
    }

    /// Check the current buffer and push the annotations into the editor.
    pub async fn lint(&mut self) {
        let revision = self.editor.revision();
        let text = self.editor.text();
        let annotations = lint::lint(&mut self.interpreter, &text, &mut self.surface).await;
        self.editor.set_annotations(annotations);
        self.linted_revision = Some(revision);
    }

    /// Run the buffer and render its output. Ignored unless the run control allows it.
    pub async fn run(&mut self) -> bool {
        if !self.surface.run.can_run() {
            return false;
        }

        let source = self.editor.text();
        self.surface.output = OutputPanel::Empty;
        self.surface.run.busy = true;

        tracing::info!(bytes = source.len(), "running buffer");
        self.surface.output = match self.interpreter.execute(&source).await {
            Ok(captured) => OutputPanel::Lines(output::render(&captured)),
            Err(e) => {
                tracing::error!(error = %e, "run failed");
                OutputPanel::Failed(e.to_string())
            }
        };

        self.surface.run.busy = false;
        true
    }
}
