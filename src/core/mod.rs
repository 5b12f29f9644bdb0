//! Core module for Lua services discovery
//!
//! # Architecture
//!
//! - `config`: Instance configuration and script lookup
//! - `error`: Error types using thiserror
//! - `journal`: Per-instance diagnostics (tracing + recorded entries)
//! - `host`: Explicit per-instance context reachable from script code
//! - `catalog`: Nodes and items published by a script
//! - `bridges`: `sd.*` and `msg.*` tables installed into the interpreter
//! - `context`: Script Execution Context around one interpreter
//! - `capability`: Capability name table and bitmask
//! - `descriptor`: Descriptor Loader (isolated interpreter)
//! - `worker`: Search worker thread and query queue
//! - `discovery`: Instance lifecycle and control surface

pub mod bridges;
pub mod capability;
pub mod catalog;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod host;
pub mod journal;
pub mod worker;

// Re-export commonly used types
pub use capability::{Capabilities, CAPABILITY_NAMES};
pub use catalog::{Catalog, Item, Node, SharedCatalog};
pub use config::{ScriptFinder, SdConfig, GENERIC_MODULE};
pub use context::{ScriptContext, DESCRIPTOR_FUNCTION, ENTRY_FUNCTION, SEARCH_FUNCTION};
pub use descriptor::{load_descriptor, DescriptorRecord};
pub use discovery::{SdCommand, SdReply, ServicesDiscovery};
pub use error::{SdError, SdResult};
pub use host::SdHost;
pub use journal::{Journal, LogEntry, Severity, SharedJournal};
pub use worker::{SearchWorker, WorkerState};
