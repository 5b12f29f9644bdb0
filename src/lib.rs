//! lua_sd - Services discovery driven by Lua scripts
//!
//! A discovery script enumerates or searches a media source (network
//! shares, streaming catalogs, ...) and publishes what it finds through the
//! `sd.*` bridge. This crate hosts such scripts:
//! - a dedicated worker thread runs `main()` once, then serves queued
//!   `search(query)` calls one at a time, newest query first
//! - descriptor requests load the script into a separate interpreter and
//!   call `descriptor()`, without touching the worker
//!
//! # Example
//!
//! ```rust,no_run
//! use lua_sd::{SdCommand, SdConfig, ServicesDiscovery};
//! use std::time::Duration;
//!
//! let sd = ServicesDiscovery::open(&SdConfig::for_script("jamendo"))?;
//! sd.control(SdCommand::Search("ambient".into()))?;
//! sd.wait_idle(Duration::from_secs(5));
//! sd.with_catalog(|catalog| println!("{} items", catalog.items.len()));
//! sd.close();
//! # Ok::<(), lua_sd::SdError>(())
//! ```

pub mod core;

pub use crate::core::{
    load_descriptor, Capabilities, Catalog, DescriptorRecord, Item, LogEntry, Node, ScriptFinder,
    SdCommand, SdConfig, SdError, SdReply, SdResult, ServicesDiscovery, Severity, WorkerState,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
