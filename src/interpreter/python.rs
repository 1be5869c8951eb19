//! CPython hosted in a child process.
//!
//! The child runs `driver.py`, which owns the session namespace and answers
//! one JSON request per line on its stdin/stdout. The process is started once
//! and kept for the whole session.
//!
//! The driver is run from a temporary file rather than `-c`: newer Pythons
//! register `-c` source under `<string>`, the same name user code runs under,
//! and tracebacks would quote driver lines.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::runtime::{Proxy, Runtime, RuntimeError};

const DRIVER: &str = include_str!("driver.py");

static DRIVER_SEQ: AtomicU64 = AtomicU64::new(0);

fn driver_path() -> PathBuf {
    let seq = DRIVER_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("pyground-driver-{}-{}.py", std::process::id(), seq))
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Op<'a> {
    Set { name: &'a str, value: Value },
    Get { name: &'a str },
    Item { handle: u64, key: &'a str },
    Destroy { handle: u64 },
    Run { code: &'a str, allow_await: bool },
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    id: u64,
    #[serde(flatten)]
    op: Op<'a>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    handle: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

pub struct PythonProcess {
    // Held so the child is killed when the session is dropped.
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    version: String,
    release_tx: UnboundedSender<u64>,
    release_rx: UnboundedReceiver<u64>,
}

impl PythonProcess {
    /// Start `executable` with the driver and wait until it reports ready.
    pub async fn load(executable: &str) -> Result<Self, RuntimeError> {
        let driver = driver_path();
        tokio::fs::write(&driver, DRIVER).await?;
        let loaded = Self::spawn(executable, &driver).await;
        // The interpreter has read the script once it answers (or failed to start).
        if let Err(e) = tokio::fs::remove_file(&driver).await {
            tracing::warn!(path = %driver.display(), error = %e, "could not remove driver script");
        }
        loaded
    }

    async fn spawn(executable: &str, driver: &Path) -> Result<Self, RuntimeError> {
        let mut child = Command::new(executable)
            .arg("-u")
            .arg(driver)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                executable: executable.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(RuntimeError::Closed)?;
        let stdout = child.stdout.take().ok_or(RuntimeError::Closed)?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "pyground::python", "{}", line);
                }
            });
        }

        let (release_tx, release_rx) = mpsc::unbounded_channel();
        let mut process = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            version: String::new(),
            release_tx,
            release_rx,
        };

        let ready = process.read_reply(0).await?;
        process.version = ready.value.as_str().unwrap_or_default().to_string();
        tracing::info!(version = %process.version, "python interpreter ready");
        Ok(process)
    }

    /// The interpreter's `sys.version` string.
    pub fn version(&self) -> &str {
        &self.version
    }

    async fn read_reply(&mut self, id: u64) -> Result<Reply, RuntimeError> {
        let line = self.stdout.next_line().await?.ok_or(RuntimeError::Closed)?;
        let reply: Reply =
            serde_json::from_str(&line).map_err(|e| RuntimeError::Protocol(e.to_string()))?;
        if reply.id != id {
            return Err(RuntimeError::Protocol(format!(
                "expected reply {}, got {}",
                id, reply.id
            )));
        }
        if !reply.ok {
            return Err(RuntimeError::Python(reply.error.unwrap_or_default()));
        }
        Ok(reply)
    }

    async fn send(&mut self, op: Op<'_>) -> Result<Reply, RuntimeError> {
        let id = self.next_id;
        self.next_id += 1;

        let mut line = serde_json::to_string(&Request { id, op })
            .map_err(|e| RuntimeError::Protocol(e.to_string()))?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        self.read_reply(id).await
    }

    /// Free handles whose proxies were dropped since the last request.
    async fn release_dropped(&mut self) -> Result<(), RuntimeError> {
        while let Ok(handle) = self.release_rx.try_recv() {
            self.send(Op::Destroy { handle }).await?;
        }
        Ok(())
    }

    async fn request(&mut self, op: Op<'_>) -> Result<Reply, RuntimeError> {
        self.release_dropped().await?;
        self.send(op).await
    }
}

impl Runtime for PythonProcess {
    async fn set_global(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        self.request(Op::Set { name, value }).await?;
        Ok(())
    }

    async fn get_global(&mut self, name: &str) -> Result<Option<Proxy>, RuntimeError> {
        let reply = self.request(Op::Get { name }).await?;
        Ok(reply
            .handle
            .map(|handle| Proxy::new(handle, self.release_tx.clone())))
    }

    async fn get_item(&mut self, proxy: &Proxy, key: &str) -> Result<Value, RuntimeError> {
        let reply = self
            .request(Op::Item {
                handle: proxy.handle(),
                key,
            })
            .await?;
        Ok(reply.value)
    }

    async fn run_python(&mut self, code: &str) -> Result<Value, RuntimeError> {
        let reply = self
            .request(Op::Run {
                code,
                allow_await: false,
            })
            .await?;
        Ok(reply.value)
    }

    async fn run_python_async(&mut self, code: &str) -> Result<Value, RuntimeError> {
        let reply = self
            .request(Op::Run {
                code,
                allow_await: true,
            })
            .await?;
        Ok(reply.value)
    }
}

/// Whether `python3` can be started; tests that need a real interpreter skip otherwise.
#[cfg(test)]
pub(crate) fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_reports_version() {
        if !python_available() {
            return;
        }
        let py = PythonProcess::load("python3").await.unwrap();
        assert!(py.version().starts_with('3'));
    }

    #[tokio::test]
    async fn load_fails_for_missing_executable() {
        let result = PythonProcess::load("definitely-not-a-python-binary").await;
        assert!(matches!(result, Err(RuntimeError::Spawn { .. })));
    }

    #[tokio::test]
    async fn run_returns_trailing_expression() {
        if !python_available() {
            return;
        }
        let mut py = PythonProcess::load("python3").await.unwrap();
        let value = py.run_python("x = 20\nx + 22").await.unwrap();
        assert_eq!(value, Value::from(42));

        let value = py.run_python("y = 1").await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn globals_round_trip_through_namespace() {
        if !python_available() {
            return;
        }
        let mut py = PythonProcess::load("python3").await.unwrap();
        py.set_global("user_code", Value::from("print('hi')"))
            .await
            .unwrap();
        let value = py.run_python("len(user_code)").await.unwrap();
        assert_eq!(value, Value::from(11));
    }

    #[tokio::test]
    async fn get_global_returns_none_for_unbound_and_none() {
        if !python_available() {
            return;
        }
        let mut py = PythonProcess::load("python3").await.unwrap();
        assert!(py.get_global("missing").await.unwrap().is_none());
        py.run_python("nothing = None").await.unwrap();
        assert!(py.get_global("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn proxy_reads_items_and_is_released_on_drop() {
        if !python_available() {
            return;
        }
        let mut py = PythonProcess::load("python3").await.unwrap();
        py.run_python("result = {'lineno': 3, 'message': 'bad'}")
            .await
            .unwrap();

        let proxy = py.get_global("result").await.unwrap().unwrap();
        assert_eq!(py.get_item(&proxy, "lineno").await.unwrap(), Value::from(3));
        assert_eq!(
            py.get_item(&proxy, "message").await.unwrap(),
            Value::from("bad")
        );
        let handle = proxy.handle();
        drop(proxy);

        // The next request frees the handle first, so a stale handle no longer resolves.
        let stale = Proxy::new(handle, py.release_tx.clone());
        let err = py.get_item(&stale, "lineno").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Python(_)));
    }

    #[tokio::test]
    async fn python_exception_becomes_error_and_session_survives() {
        if !python_available() {
            return;
        }
        let mut py = PythonProcess::load("python3").await.unwrap();
        let err = py.run_python("1 / 0").await.unwrap_err();
        match err {
            RuntimeError::Python(tb) => assert!(tb.contains("ZeroDivisionError")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(py.run_python("2 + 2").await.unwrap(), Value::from(4));
    }

    #[tokio::test]
    async fn async_run_allows_top_level_await() {
        if !python_available() {
            return;
        }
        let mut py = PythonProcess::load("python3").await.unwrap();
        let value = py
            .run_python_async("import asyncio\nawait asyncio.sleep(0)\n'done'")
            .await
            .unwrap();
        assert_eq!(value, Value::from("done"));
    }

    #[tokio::test]
    async fn user_print_does_not_corrupt_protocol() {
        if !python_available() {
            return;
        }
        let mut py = PythonProcess::load("python3").await.unwrap();
        py.run_python("print('noise')").await.unwrap();
        assert_eq!(py.run_python("'still ok'").await.unwrap(), Value::from("still ok"));
    }
}
