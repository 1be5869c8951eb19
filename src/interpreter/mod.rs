//! Interpreter bridge - the session object in front of the embedded runtime
//!
//! The bridge owns the runtime and exposes the three things the playground
//! needs from it:
//! - `initialize` - start and warm the interpreter
//! - `check_syntax` - parse the buffer without running it
//! - `execute` - run the buffer with stdout/stderr captured

mod python;
mod runtime;

pub use python::PythonProcess;
pub use runtime::{Proxy, Runtime, RuntimeError};

#[cfg(test)]
pub(crate) use python::python_available;

use serde_json::Value;
use thiserror::Error;

use crate::config::Settings;

/// Global the buffer is bound to before every check or run.
pub const SOURCE_VARIABLE: &str = "user_code";

/// Parse-only routine. Leaves `result` as a dict on failure, `None` otherwise.
const CHECK_SYNTAX: &str = "
def check_syntax(code):
    import ast
    try:
        ast.parse(code)
    except SyntaxError as e:
        return {'lineno': e.lineno, 'offset': e.offset, 'message': e.msg}
    return None

result = check_syntax(user_code)
";

// The stream snippets import `sys` under a private alias so user code that
// rebinds `sys` cannot break the capture or the restore.
const REDIRECT_STREAMS: &str = "
import sys as _pyground_sys
from io import StringIO as _PygroundStringIO
_pyground_sys.stdout = _pyground_sys.stderr = _PygroundStringIO()
";

/// Execution wrapper. The `exec` call must stay on line 4: the output renderer
/// drops the traceback frame `File \"<exec>\", line 4, in <module>`.
const EXECUTE: &str = "
code = user_code
try:
    exec(code, globals())
except Exception:
    import traceback
    traceback.print_exc()
";

const READ_CAPTURE: &str = "
import sys as _pyground_sys
_pyground_sys.stdout.getvalue()
";

const RESTORE_STREAMS: &str = "
import sys as _pyground_sys
_pyground_sys.stdout = _pyground_sys.__stdout__
_pyground_sys.stderr = _pyground_sys.__stderr__
";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("unexpected value for `{field}`: {value}")]
    Unexpected { field: &'static str, value: Value },
}

/// A parse failure reported by the interpreter, 1-indexed as Python reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line_number: i64,
    pub column_offset: Option<i64>,
    pub message: String,
}

/// A live interpreter session.
pub struct Interpreter<R = PythonProcess> {
    runtime: R,
}

impl Interpreter<PythonProcess> {
    /// Load the interpreter configured in `settings`. Suspends until it is ready.
    pub async fn initialize(settings: &Settings) -> Result<Self, BridgeError> {
        let runtime = PythonProcess::load(&settings.python).await?;
        Ok(Self::with_runtime(runtime))
    }

    pub fn version(&self) -> &str {
        self.runtime.version()
    }
}

impl<R: Runtime> Interpreter<R> {
    pub fn with_runtime(runtime: R) -> Self {
        Self { runtime }
    }

    #[cfg(test)]
    pub(crate) fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Parse `source` and report the first syntax error, if any.
    pub async fn check_syntax(&mut self, source: &str) -> Result<Option<SyntaxError>, BridgeError> {
        self.runtime
            .set_global(SOURCE_VARIABLE, Value::from(source))
            .await?;
        self.runtime.run_python(CHECK_SYNTAX).await?;

        // The proxy is released when it goes out of scope.
        let Some(result) = self.runtime.get_global("result").await? else {
            return Ok(None);
        };

        let line_number = match self.runtime.get_item(&result, "lineno").await? {
            Value::Number(n) if n.is_i64() => n.as_i64().unwrap_or_default(),
            value => {
                return Err(BridgeError::Unexpected {
                    field: "lineno",
                    value,
                });
            }
        };
        let column_offset = self.runtime.get_item(&result, "offset").await?.as_i64();
        let message = match self.runtime.get_item(&result, "message").await? {
            Value::String(s) => s,
            Value::Null => String::new(),
            value => value.to_string(),
        };

        Ok(Some(SyntaxError {
            line_number,
            column_offset,
            message,
        }))
    }

    /// Run `source` and return everything it wrote to stdout and stderr.
    ///
    /// Exceptions raised by the program are printed into the capture as a
    /// traceback. An `Err` means the runtime itself failed. The original
    /// stream bindings are restored on every path once redirection happened.
    pub async fn execute(&mut self, source: &str) -> Result<String, BridgeError> {
        self.runtime
            .set_global(SOURCE_VARIABLE, Value::from(source))
            .await?;
        self.runtime.run_python(REDIRECT_STREAMS).await?;

        let captured = self.run_captured().await;
        let restored = self.runtime.run_python(RESTORE_STREAMS).await;
        if let Err(e) = &restored {
            tracing::error!(error = %e, "failed to restore interpreter streams");
        }

        let output = captured?;
        restored?;
        Ok(output)
    }

    async fn run_captured(&mut self) -> Result<String, BridgeError> {
        self.runtime.run_python_async(EXECUTE).await?;
        match self.runtime.run_python(READ_CAPTURE).await? {
            Value::String(output) => Ok(output),
            value => Err(BridgeError::Unexpected {
                field: "captured output",
                value,
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{FakeRuntime, Script};
    use super::*;

    fn interpreter(script: Script) -> Interpreter<FakeRuntime> {
        Interpreter::with_runtime(FakeRuntime::new(script))
    }

    #[test]
    fn execute_wrapper_keeps_exec_on_line_four() {
        let line = EXECUTE
            .lines()
            .position(|l| l.trim() == "exec(code, globals())")
            .map(|idx| idx + 1);
        assert_eq!(line, Some(4));
    }

    #[tokio::test]
    async fn check_syntax_returns_none_for_valid_source() {
        let mut interp = interpreter(Script::default());
        assert_eq!(interp.check_syntax("print('hi')").await.unwrap(), None);
        assert_eq!(
            interp.runtime().globals.get(SOURCE_VARIABLE),
            Some(&Value::from("print('hi')"))
        );
    }

    #[tokio::test]
    async fn check_syntax_reads_structured_failure_and_releases_handle() {
        let mut interp = interpreter(Script {
            syntax_error: Some((1, Some(7), "invalid syntax")),
            ..Script::default()
        });
        let err = interp.check_syntax("def f(:").await.unwrap().unwrap();
        assert_eq!(
            err,
            SyntaxError {
                line_number: 1,
                column_offset: Some(7),
                message: "invalid syntax".to_string(),
            }
        );

        // Any later call drains the release queue.
        interp.check_syntax("def f(:").await.unwrap();
        interp.runtime.run_python("pass").await.unwrap();
        assert_eq!(interp.runtime().live_handles(), 0);
    }

    #[tokio::test]
    async fn check_syntax_keeps_missing_offset() {
        let mut interp = interpreter(Script {
            syntax_error: Some((2, None, "unexpected EOF")),
            ..Script::default()
        });
        let err = interp.check_syntax("x = (").await.unwrap().unwrap();
        assert_eq!(err.column_offset, None);
        assert_eq!(err.line_number, 2);
    }

    #[tokio::test]
    async fn check_syntax_surfaces_runtime_failure() {
        let mut interp = interpreter(Script {
            broken: true,
            ..Script::default()
        });
        assert!(interp.check_syntax("x").await.is_err());
    }

    #[tokio::test]
    async fn execute_returns_capture_and_restores_streams() {
        let mut interp = interpreter(Script {
            output: "hi\n",
            ..Script::default()
        });
        assert_eq!(interp.execute("print('hi')").await.unwrap(), "hi\n");
        assert!(!interp.runtime().redirected);
        assert_eq!(interp.runtime().calls.last().map(String::as_str), Some(RESTORE_STREAMS));
    }

    #[tokio::test]
    async fn execute_restores_streams_when_runtime_fails() {
        let mut interp = interpreter(Script {
            broken_exec: true,
            ..Script::default()
        });
        assert!(interp.execute("while True: pass").await.is_err());
        assert!(!interp.runtime().redirected);
    }

    #[tokio::test]
    async fn consecutive_runs_start_with_clean_capture() {
        let mut interp = interpreter(Script {
            output: "once\n",
            ..Script::default()
        });
        interp.execute("print('once')").await.unwrap();
        assert_eq!(interp.execute("print('once')").await.unwrap(), "once\n");
    }

    mod python {
        use super::super::*;

        const STREAMS_RESTORED: &str = "import sys as _s\n_s.stdout is _s.__stdout__ and _s.stderr is _s.__stderr__";

        async fn session() -> Option<Interpreter> {
            if !python_available() {
                return None;
            }
            let runtime = PythonProcess::load("python3").await.unwrap();
            Some(Interpreter::with_runtime(runtime))
        }

        #[tokio::test]
        async fn valid_buffer_has_no_syntax_error() {
            let Some(mut interp) = session().await else {
                return;
            };
            assert_eq!(interp.check_syntax("print('hi')").await.unwrap(), None);
        }

        #[tokio::test]
        async fn invalid_buffer_reports_line_and_column() {
            let Some(mut interp) = session().await else {
                return;
            };
            let err = interp.check_syntax("def f(:").await.unwrap().unwrap();
            assert_eq!(err.line_number, 1);
            assert!(err.column_offset.is_some());
            assert!(!err.message.is_empty());
        }

        #[tokio::test]
        async fn check_syntax_is_idempotent() {
            let Some(mut interp) = session().await else {
                return;
            };
            let first = interp.check_syntax("x = [1,\n2").await.unwrap();
            let second = interp.check_syntax("x = [1,\n2").await.unwrap();
            assert!(first.is_some());
            assert_eq!(first, second);
        }

        #[tokio::test]
        async fn check_syntax_does_not_execute() {
            let Some(mut interp) = session().await else {
                return;
            };
            interp.check_syntax("marker = 1").await.unwrap();
            let value = interp.runtime.run_python("'marker' in globals()").await.unwrap();
            assert_eq!(value, Value::Bool(false));
        }

        #[tokio::test]
        async fn execute_captures_print() {
            let Some(mut interp) = session().await else {
                return;
            };
            assert_eq!(interp.execute("print('hi')").await.unwrap(), "hi\n");
        }

        #[tokio::test]
        async fn execute_prints_traceback_for_user_exception() {
            let Some(mut interp) = session().await else {
                return;
            };
            let output = interp.execute("raise ValueError('boom')").await.unwrap();
            assert!(output.contains("Traceback (most recent call last):"));
            assert!(output.contains("File \"<exec>\", line 4, in <module>"));
            assert!(output.contains("File \"<string>\", line 1, in <module>"));
            assert!(output.contains("ValueError: boom"));
        }

        #[tokio::test]
        async fn streams_are_restored_between_runs() {
            let Some(mut interp) = session().await else {
                return;
            };
            interp.execute("raise ValueError('boom')").await.unwrap();
            let value = interp
                .runtime
                .run_python(STREAMS_RESTORED)
                .await
                .unwrap();
            assert_eq!(value, Value::Bool(true));

            assert_eq!(interp.execute("print('clean')").await.unwrap(), "clean\n");
        }

        #[tokio::test]
        async fn rebinding_sys_does_not_block_restore() {
            let Some(mut interp) = session().await else {
                return;
            };
            assert_eq!(interp.execute("sys = 0\nprint('shadowed')").await.unwrap(), "shadowed\n");
            let value = interp.runtime.run_python(STREAMS_RESTORED).await.unwrap();
            assert_eq!(value, Value::Bool(true));

            assert_eq!(interp.execute("print(sys)").await.unwrap(), "0\n");
        }

        #[tokio::test]
        async fn lone_surrogate_in_output_is_replaced() {
            let Some(mut interp) = session().await else {
                return;
            };
            let output = interp.execute("print('a\\ud800b')").await.unwrap();
            assert_eq!(output, "a?b\n");

            // The session keeps working afterwards
            assert_eq!(interp.execute("print('ok')").await.unwrap(), "ok\n");
        }

        #[tokio::test]
        async fn lone_surrogate_in_nested_value_is_replaced() {
            let Some(mut interp) = session().await else {
                return;
            };
            let value = interp.runtime.run_python("['x\\ud800']").await.unwrap();
            assert_eq!(value, serde_json::json!(["x?"]));
        }

        #[tokio::test]
        async fn lone_surrogate_in_traceback_is_replaced() {
            let Some(mut interp) = session().await else {
                return;
            };
            let output = interp.execute("raise ValueError('\\udfff')").await.unwrap();
            assert!(output.contains("ValueError: ?"), "{output}");
        }

        #[tokio::test]
        async fn stderr_is_captured_with_stdout() {
            let Some(mut interp) = session().await else {
                return;
            };
            let output = interp
                .execute("import sys\nprint('a')\nprint('b', file=sys.stderr)")
                .await
                .unwrap();
            assert_eq!(output, "a\nb\n");
        }

        #[tokio::test]
        async fn system_exit_is_a_bridge_failure() {
            let Some(mut interp) = session().await else {
                return;
            };
            assert!(interp.execute("raise SystemExit(3)").await.is_err());
            assert_eq!(interp.execute("print('after')").await.unwrap(), "after\n");
        }
    }
}
