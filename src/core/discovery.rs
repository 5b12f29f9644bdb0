//! Services Discovery - instance lifecycle and control surface
//!
//! Activation resolves and loads the script, then starts the search worker.
//! The host talks to a running instance through [`SdCommand`]s:
//! searches are queued for the worker, descriptor requests are answered
//! synchronously from an isolated interpreter.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::catalog::{Catalog, SharedCatalog};
use super::config::SdConfig;
use super::context::ScriptContext;
use super::descriptor::{load_descriptor, DescriptorRecord};
use super::error::SdResult;
use super::host::SdHost;
use super::journal::{LogEntry, SharedJournal};
use super::worker::{SearchWorker, WorkerState};

/// Commands the host can issue to a running instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdCommand {
    /// Queue a search for the worker
    Search(String),
    /// Build the descriptor from a fresh interpreter
    GetDescriptor,
}

/// Reply to an [`SdCommand`]
#[derive(Debug, Clone, PartialEq)]
pub enum SdReply {
    Queued,
    Descriptor(DescriptorRecord),
}

/// One active Lua services discovery instance
pub struct ServicesDiscovery {
    host: SdHost,
    worker: SearchWorker,
    memory_limit: Option<usize>,
}

impl ServicesDiscovery {
    /// Activate from configuration: resolve the script name, find the file
    /// and start it.
    pub fn open(config: &SdConfig) -> SdResult<Self> {
        let name = config.script_name()?;
        let script = config.finder().find(name).map_err(|e| {
            tracing::error!(script = %name, "{}", e);
            e
        })?;
        Self::start(script, config.memory_limit)
    }

    /// Activate a script file directly
    pub fn from_script(script: impl Into<PathBuf>) -> SdResult<Self> {
        Self::start(script.into(), None)
    }

    fn start(script: PathBuf, memory_limit: Option<usize>) -> SdResult<Self> {
        let host = SdHost::new(script);

        let context = ScriptContext::open(&host, memory_limit).map_err(|e| {
            host.journal().error(e.to_string());
            e
        })?;

        // On spawn failure the context has already been dropped with the
        // closure, nothing else to unwind.
        let worker = SearchWorker::spawn(context).map_err(|e| {
            host.journal().error(e.to_string());
            e
        })?;

        Ok(Self {
            host,
            worker,
            memory_limit,
        })
    }

    /// Dispatch a host command
    pub fn control(&self, command: SdCommand) -> SdResult<SdReply> {
        match command {
            SdCommand::Search(query) => {
                self.request_search(&query);
                Ok(SdReply::Queued)
            }
            SdCommand::GetDescriptor => self.request_descriptor().map(SdReply::Descriptor),
        }
    }

    /// Queue a search; returns immediately
    pub fn request_search(&self, query: &str) {
        self.worker.enqueue(query);
    }

    /// Load the descriptor in a separate interpreter. Does not wait for,
    /// or hold up, the worker.
    pub fn request_descriptor(&self) -> SdResult<DescriptorRecord> {
        load_descriptor(self.host.script(), self.host.journal(), self.memory_limit)
    }

    pub fn script(&self) -> &Path {
        self.host.script()
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    /// Queries queued but not yet picked up
    pub fn pending(&self) -> usize {
        self.worker.pending()
    }

    /// See [`SearchWorker::wait_idle`]
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.worker.wait_idle(timeout)
    }

    pub fn catalog(&self) -> &SharedCatalog {
        self.host.catalog()
    }

    pub fn journal(&self) -> &SharedJournal {
        self.host.journal()
    }

    /// Recorded diagnostics
    pub fn logs(&self) -> Vec<LogEntry> {
        self.host.journal().entries()
    }

    /// Run `f` over the current catalog
    pub fn with_catalog<R>(&self, f: impl FnOnce(&Catalog) -> R) -> R {
        let catalog = self
            .host
            .catalog()
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&catalog)
    }

    /// Deactivate: stop and join the worker (which releases the
    /// interpreter), then discard unserved queries. Returns how many were
    /// discarded.
    pub fn close(mut self) -> usize {
        self.worker.shutdown()
    }
}
