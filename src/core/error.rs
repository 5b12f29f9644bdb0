//! Error types for Lua services discovery
//!
//! One enum covers activation, worker and descriptor failures. Only
//! activation and descriptor requests surface these to the host; failures
//! inside the worker loop are journaled and swallowed.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for services discovery operations
pub type SdResult<T> = Result<T, SdError>;

/// Services discovery errors
#[derive(Debug, Error)]
pub enum SdError {
    /// The interpreter (or the host) ran out of memory
    #[error("Resource exhaustion: {0}")]
    ResourceExhaustion(String),

    /// No script with that name on any search path
    #[error("Couldn't find lua services discovery script \"{name}\"")]
    ScriptNotFound { name: String },

    /// The script file failed to parse or to run top-to-bottom
    #[error("Error loading script {}: {message}", path.display())]
    ScriptLoad { path: PathBuf, message: String },

    /// `package.path` could not be extended for the script
    #[error("Error while setting the module search path: {0}")]
    ModulePath(String),

    /// A designated global is absent or not callable
    #[error("The script '{}' does not define any '{function}' function", path.display())]
    NotAFunction {
        path: PathBuf,
        function: &'static str,
    },

    /// A designated function raised while running
    #[error("Error while running script {}, function {function}(): {message}", path.display())]
    ScriptRuntime {
        path: PathBuf,
        function: &'static str,
        message: String,
    },

    /// `descriptor()` returned something other than a table
    #[error("The descriptor of '{}' is not a table", path.display())]
    InvalidDescriptor { path: PathBuf },

    /// Interpreter setup failed outside of any script code
    #[error("Lua error: {0}")]
    Lua(String),

    /// Configuration is incomplete or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker thread could not be started
    #[error("Failed to spawn the search worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render an `mlua::Error` as the message a script author would see.
///
/// Callback errors carry the interesting part in their cause, so unwrap
/// those instead of printing the traceback wrapper.
pub fn lua_message(err: &mlua::Error) -> String {
    match err {
        mlua::Error::CallbackError { cause, .. } => lua_message(cause),
        mlua::Error::MemoryError(msg) => msg.clone(),
        mlua::Error::RuntimeError(msg) | mlua::Error::SyntaxError { message: msg, .. } => {
            msg.clone()
        }
        other => other.to_string(),
    }
}

/// Whether an `mlua::Error` is an allocation failure, looking through callbacks
pub fn is_memory_error(err: &mlua::Error) -> bool {
    match err {
        mlua::Error::MemoryError(_) => true,
        mlua::Error::CallbackError { cause, .. } => is_memory_error(cause),
        _ => false,
    }
}

impl From<mlua::Error> for SdError {
    fn from(err: mlua::Error) -> Self {
        if is_memory_error(&err) {
            SdError::ResourceExhaustion(lua_message(&err))
        } else {
            SdError::Lua(lua_message(&err))
        }
    }
}
