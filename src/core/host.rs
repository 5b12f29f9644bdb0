//! Host context handed to every script execution context
//!
//! Bridge functions capture clones of this instead of looking up a
//! process-wide "current instance", so several instances (and the isolated
//! descriptor context) never see each other's state.

use std::path::{Path, PathBuf};

use super::catalog::{Catalog, SharedCatalog};
use super::journal::{Journal, SharedJournal};

/// Per-instance state reachable from script code
#[derive(Debug, Clone)]
pub struct SdHost {
    script: PathBuf,
    journal: SharedJournal,
    catalog: SharedCatalog,
}

impl SdHost {
    /// Fresh journal and catalog for `script`
    pub fn new(script: impl Into<PathBuf>) -> Self {
        let script = script.into();
        Self {
            journal: Journal::new(script.clone()),
            catalog: Catalog::shared(),
            script,
        }
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn journal(&self) -> &SharedJournal {
        &self.journal
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }
}
