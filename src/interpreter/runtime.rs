//! The embedded runtime seam.
//!
//! A [`Runtime`] is the small call surface the bridge needs from a language
//! runtime: bind a global, look one up, run a snippet. Objects that stay on the
//! runtime side are reached through [`Proxy`] handles.

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Failures raised by the runtime itself, as opposed to the user's program.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to start interpreter `{executable}`: {source}")]
    Spawn {
        executable: String,
        source: std::io::Error,
    },

    #[error("interpreter I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("interpreter exited unexpectedly")]
    Closed,

    #[error("malformed interpreter reply: {0}")]
    Protocol(String),

    /// A snippet raised inside the runtime. Carries the formatted traceback.
    #[error("{0}")]
    Python(String),
}

/// Owned handle to an object living inside the runtime.
///
/// Dropping the proxy queues the handle for release; the runtime frees it
/// before serving its next request.
#[derive(Debug)]
pub struct Proxy {
    handle: u64,
    release: UnboundedSender<u64>,
}

impl Proxy {
    pub fn new(handle: u64, release: UnboundedSender<u64>) -> Self {
        Self { handle, release }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        // The runtime may already be gone, in which case there is nothing to free.
        let _ = self.release.send(self.handle);
    }
}

/// Call surface of an embedded language runtime.
///
/// All calls take `&mut self`: the runtime's global namespace and stream
/// bindings are shared state, so only one call may be in flight at a time.
#[allow(async_fn_in_trait)]
pub trait Runtime {
    /// Bind `value` to the global `name`.
    async fn set_global(&mut self, name: &str, value: Value) -> Result<(), RuntimeError>;

    /// Look up the global `name`. `None` when unbound or bound to `None`.
    async fn get_global(&mut self, name: &str) -> Result<Option<Proxy>, RuntimeError>;

    /// Read `key` from the object behind `proxy`.
    async fn get_item(&mut self, proxy: &Proxy, key: &str) -> Result<Value, RuntimeError>;

    /// Run `code` synchronously, returning the value of a trailing expression.
    async fn run_python(&mut self, code: &str) -> Result<Value, RuntimeError>;

    /// Like [`Runtime::run_python`], but top-level `await` is allowed.
    async fn run_python_async(&mut self, code: &str) -> Result<Value, RuntimeError>;
}
