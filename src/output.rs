//! Output renderer
//!
//! Turns the text captured during a run into classified lines. The
//! interpreter's own traceback preamble is dropped, the frame that points into
//! the user's code becomes an "Error on line N:" separator, and everything
//! after the preamble is styled as error output.

/// Header line Python prints before every traceback.
const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";

/// Frame of the execution wrapper's `exec` call. Tied to the wrapper layout.
const WRAPPER_FRAME: &str = "File \"<exec>\", line 4, in <module>";

/// Prefix of frames inside the user's code (run through `exec` on a string).
const USER_FRAME_PREFIX: &str = "File \"<string>\", line";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Normal,
    Error,
    /// Marks where the error originates, e.g. "Error on line 3:".
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub kind: LineKind,
    pub text: String,
}

impl RenderedLine {
    pub fn is_error(&self) -> bool {
        self.kind != LineKind::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    InError,
}

/// Classify captured output line by line. No state carries over between calls.
pub fn render(raw: &str) -> Vec<RenderedLine> {
    let mut state = State::Normal;
    let mut lines = Vec::new();

    for line in raw.split('\n') {
        let trimmed = line.trim();
        if trimmed == TRACEBACK_HEADER || trimmed == WRAPPER_FRAME {
            state = State::InError;
            continue;
        }
        if state == State::InError && trimmed.starts_with(USER_FRAME_PREFIX) {
            let fragment = trimmed.split(',').nth(1).unwrap_or_default().trim();
            lines.push(RenderedLine {
                kind: LineKind::Separator,
                text: format!("Error on {}:", fragment),
            });
            continue;
        }

        let kind = match state {
            State::Normal => LineKind::Normal,
            State::InError => LineKind::Error,
        };
        lines.push(RenderedLine {
            kind,
            text: line.to_string(),
        });
    }

    lines
}

/// Escape the five HTML-significant characters. `&` goes first so entities
/// produced here are never escaped again.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Markup for the output panel of a web page.
pub fn to_html(lines: &[RenderedLine]) -> String {
    let mut html = String::new();
    for line in lines {
        let text = escape_html(&line.text);
        match line.kind {
            LineKind::Normal => {
                html.push_str(&text);
                html.push_str("<br />");
            }
            LineKind::Error => {
                html.push_str("<span style='color:red'>");
                html.push_str(&text);
                html.push_str("</span><br />");
            }
            LineKind::Separator => {
                html.push_str("<hr /><span style='color:red'>");
                html.push_str(&text);
                html.push_str("</span><br />");
            }
        }
    }
    html
}

/// Markup shown when the run itself failed rather than the user's program.
pub fn failure_html(error: &str) -> String {
    format!("{}<br />{}", RUN_FAILED, escape_html(error))
}

pub const RUN_FAILED: &str = "Sorry, unable to run code...";

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(lines: &[RenderedLine]) -> Vec<LineKind> {
        lines.iter().map(|l| l.kind).collect()
    }

    #[test]
    fn plain_output_is_normal() {
        let lines = render("hi\n");
        assert_eq!(
            lines,
            vec![
                RenderedLine {
                    kind: LineKind::Normal,
                    text: "hi".to_string()
                },
                RenderedLine {
                    kind: LineKind::Normal,
                    text: String::new()
                },
            ]
        );
        assert!(lines.iter().all(|l| !l.is_error()));
    }

    #[test]
    fn traceback_switches_to_error_and_drops_preamble() {
        let raw = "before\n\
                   Traceback (most recent call last):\n  \
                   File \"<exec>\", line 4, in <module>\n  \
                   File \"<string>\", line 1, in <module>\n\
                   ValueError: boom\n";
        let lines = render(raw);

        assert_eq!(
            kinds(&lines),
            vec![
                LineKind::Normal,
                LineKind::Separator,
                LineKind::Error,
                LineKind::Error,
            ]
        );
        assert_eq!(lines[0].text, "before");
        assert_eq!(lines[1].text, "Error on line 1:");
        assert_eq!(lines[2].text, "ValueError: boom");
    }

    #[test]
    fn nested_user_frames_each_get_a_separator() {
        let raw = "Traceback (most recent call last):\n  \
                   File \"<exec>\", line 4, in <module>\n  \
                   File \"<string>\", line 5, in <module>\n  \
                   File \"<string>\", line 2, in f\n\
                   ZeroDivisionError: division by zero";
        let lines = render(raw);
        let separators: Vec<&str> = lines
            .iter()
            .filter(|l| l.kind == LineKind::Separator)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(separators, vec!["Error on line 5:", "Error on line 2:"]);
        assert_eq!(lines.last().map(|l| l.kind), Some(LineKind::Error));
    }

    #[test]
    fn state_does_not_carry_between_calls() {
        render("Traceback (most recent call last):\nboom");
        let lines = render("fine");
        assert_eq!(kinds(&lines), vec![LineKind::Normal]);
    }

    #[test]
    fn frame_text_before_a_traceback_is_ordinary_output() {
        let lines = render("File \"<string>\", line 9, printed by the user");
        assert_eq!(kinds(&lines), vec![LineKind::Normal]);
    }

    #[test]
    fn lines_are_kept_verbatim() {
        let lines = render("  indented  ");
        assert_eq!(lines[0].text, "  indented  ");
    }

    #[test]
    fn escape_html_produces_one_entity_per_character() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn escape_html_does_not_double_escape() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn to_html_matches_page_markup() {
        let lines = render(
            "<b>\nTraceback (most recent call last):\n  File \"<string>\", line 1, in <module>\nValueError: 'x'",
        );
        assert_eq!(
            to_html(&lines),
            "&lt;b&gt;<br />\
             <hr /><span style='color:red'>Error on line 1:</span><br />\
             <span style='color:red'>ValueError: &#039;x&#039;</span><br />"
        );
    }

    #[test]
    fn failure_html_prefixes_apology() {
        assert_eq!(
            failure_html("interpreter exited unexpectedly"),
            "Sorry, unable to run code...<br />interpreter exited unexpectedly"
        );
    }

    #[test]
    fn failure_html_escapes_error_text() {
        assert_eq!(
            failure_html("unexpected value for `x`: <object at 0x1>"),
            "Sorry, unable to run code...<br />unexpected value for `x`: &lt;object at 0x1&gt;"
        );
    }
}
