//! Configuration and script lookup
//!
//! A discovery instance is configured with a module name. The generic
//! module `"lua"` takes the script name from the `sd` option, any other
//! module name is itself the script name. Scripts are looked up as
//! `<dir>/<name>.lua` across the search paths:
//! 1. Paths listed in the configuration
//! 2. `.lua-sd/sd/` - Project-local scripts
//! 3. `~/.config/lua-sd/sd/` - User scripts
//! 4. `~/.local/share/lua-sd/sd/` - Installed scripts

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{SdError, SdResult};

/// Module name that defers to the `sd` option
pub const GENERIC_MODULE: &str = "lua";

/// Script file extension
pub const SCRIPT_EXTENSION: &str = "lua";

/// Per-instance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdConfig {
    /// Host module name
    #[serde(default = "default_module")]
    pub module: String,
    /// Script name, used when `module` is the generic module
    #[serde(default)]
    pub sd: Option<String>,
    /// Extra directories searched before the defaults
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    /// Interpreter memory cap in bytes
    #[serde(default)]
    pub memory_limit: Option<usize>,
}

fn default_module() -> String {
    GENERIC_MODULE.to_string()
}

impl Default for SdConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            sd: None,
            search_paths: Vec::new(),
            memory_limit: None,
        }
    }
}

impl SdConfig {
    /// Configuration for a builtin script module
    pub fn for_module(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    /// Configuration for the generic module pointed at `script`
    pub fn for_script(script: impl Into<String>) -> Self {
        Self {
            sd: Some(script.into()),
            ..Self::default()
        }
    }

    /// Read a JSON configuration file
    pub fn from_file(path: &Path) -> SdResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The name of the script to load
    pub fn script_name(&self) -> SdResult<&str> {
        let name = if self.module == GENERIC_MODULE {
            self.sd.as_deref().ok_or_else(|| {
                SdError::InvalidConfig(format!(
                    "module '{}' requires the 'sd' option",
                    GENERIC_MODULE
                ))
            })?
        } else {
            self.module.as_str()
        };

        if name.is_empty() {
            return Err(SdError::InvalidConfig("empty script name".to_string()));
        }
        Ok(name)
    }

    /// Finder over the configured paths followed by the default ones
    pub fn finder(&self) -> ScriptFinder {
        let mut finder = ScriptFinder::with_paths(self.search_paths.clone());
        for path in ScriptFinder::default_paths() {
            finder.add_path(path);
        }
        finder
    }
}

/// Resolves script names to files
#[derive(Debug, Clone)]
pub struct ScriptFinder {
    search_paths: Vec<PathBuf>,
}

impl ScriptFinder {
    /// Finder over the default search paths
    pub fn new() -> Self {
        Self::with_paths(Self::default_paths())
    }

    /// Finder over exactly `paths`
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
        }
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(".lua-sd/sd"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("lua-sd/sd"));
        }
        if let Some(data_dir) = dirs::data_dir() {
            paths.push(data_dir.join("lua-sd/sd"));
        }

        paths
    }

    pub fn add_path(&mut self, path: PathBuf) {
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// First `<dir>/<name>.lua` that exists
    pub fn find(&self, name: &str) -> SdResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(SdError::InvalidConfig(format!(
                "invalid script name \"{}\"",
                name
            )));
        }

        let file = format!("{}.{}", name, SCRIPT_EXTENSION);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&file))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| SdError::ScriptNotFound {
                name: name.to_string(),
            })
    }
}

impl Default for ScriptFinder {
    fn default() -> Self {
        Self::new()
    }
}
