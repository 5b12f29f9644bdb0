//! Script Execution Context
//!
//! Owns one Lua interpreter with a discovery script loaded into it and
//! calls the script's well-known globals:
//! - `main()` once when the instance starts
//! - `search(query)` once per queued query
//! - `descriptor()` from an isolated context, see [`crate::core::descriptor`]
//!
//! A context is never shared between threads; the worker owns the live one.

use mlua::{Function, Lua, Table, Value};
use std::path::{Path, PathBuf};

use super::bridges::{create_msg_table, create_sd_table};
use super::error::{is_memory_error, lua_message, SdError, SdResult};
use super::host::SdHost;
use super::journal::SharedJournal;

/// Entry function, run once at startup
pub const ENTRY_FUNCTION: &str = "main";

/// Search function, run per query
pub const SEARCH_FUNCTION: &str = "search";

/// Descriptor function, run by the descriptor loader
pub const DESCRIPTOR_FUNCTION: &str = "descriptor";

/// A loaded discovery script
pub struct ScriptContext {
    lua: Lua,
    script: PathBuf,
    journal: SharedJournal,
}

impl ScriptContext {
    /// Create the live context for `host`: standard libraries, `sd` and
    /// `msg` bridges, the script's module directories, then the script body.
    pub fn open(host: &SdHost, memory_limit: Option<usize>) -> SdResult<Self> {
        let lua = Lua::new();

        if let Some(limit) = memory_limit {
            lua.set_memory_limit(limit)?;
        }

        let globals = lua.globals();
        globals.set("sd", create_sd_table(&lua, host)?)?;
        globals.set("msg", create_msg_table(&lua, host.journal().clone())?)?;
        Self::add_modules_path(&lua, host.script())?;

        let context = Self {
            lua,
            script: host.script().to_path_buf(),
            journal: host.journal().clone(),
        };
        context.load_script()?;
        Ok(context)
    }

    /// Create a context that only sees `msg`, for one-off calls that must
    /// not touch the instance catalog. The memory cap is the same as the
    /// live context's.
    pub fn open_isolated(
        script: &Path,
        journal: SharedJournal,
        memory_limit: Option<usize>,
    ) -> SdResult<Self> {
        let lua = Lua::new();

        if let Some(limit) = memory_limit {
            lua.set_memory_limit(limit)?;
        }

        lua.globals()
            .set("msg", create_msg_table(&lua, journal.clone())?)?;

        let context = Self {
            lua,
            script: script.to_path_buf(),
            journal,
        };
        context.load_script()?;
        Ok(context)
    }

    /// Let `require` find modules shipped next to the script
    fn add_modules_path(lua: &Lua, script: &Path) -> SdResult<()> {
        let dir = script
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let extra = format!(
            "{};{}",
            dir.join("modules").join("?.lua").display(),
            dir.join("..").join("modules").join("?.lua").display()
        );

        let package: Table = lua
            .globals()
            .get("package")
            .map_err(|e| SdError::ModulePath(lua_message(&e)))?;
        let current: String = package
            .get("path")
            .map_err(|e| SdError::ModulePath(lua_message(&e)))?;
        package
            .set("path", format!("{};{}", extra, current))
            .map_err(|e| SdError::ModulePath(lua_message(&e)))?;

        Ok(())
    }

    /// Run the script file top-to-bottom
    fn load_script(&self) -> SdResult<()> {
        let source = std::fs::read_to_string(&self.script).map_err(|e| SdError::ScriptLoad {
            path: self.script.clone(),
            message: e.to_string(),
        })?;

        self.lua
            .load(source)
            .set_name(format!("@{}", self.script.display()))
            .exec()
            .map_err(|e| {
                if is_memory_error(&e) {
                    SdError::ResourceExhaustion(lua_message(&e))
                } else {
                    SdError::ScriptLoad {
                        path: self.script.clone(),
                        message: lua_message(&e),
                    }
                }
            })
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn journal(&self) -> &SharedJournal {
        &self.journal
    }

    /// Look up a global that must be a function
    fn function(&self, name: &'static str) -> SdResult<Function> {
        match self.lua.globals().get::<Value>(name) {
            Ok(Value::Function(f)) => Ok(f),
            _ => Err(SdError::NotAFunction {
                path: self.script.clone(),
                function: name,
            }),
        }
    }

    fn runtime_error(&self, function: &'static str, err: mlua::Error) -> SdError {
        if is_memory_error(&err) {
            return SdError::ResourceExhaustion(lua_message(&err));
        }
        SdError::ScriptRuntime {
            path: self.script.clone(),
            function,
            message: lua_message(&err),
        }
    }

    /// Call `main()`, drop whatever it returns, then collect garbage
    pub fn call_entry(&self) -> SdResult<()> {
        let main = self.function(ENTRY_FUNCTION)?;
        main.call::<()>(())
            .map_err(|e| self.runtime_error(ENTRY_FUNCTION, e))?;
        self.collect_garbage();
        Ok(())
    }

    /// Call `search(query)`, dropping any return value
    pub fn call_search(&self, query: &str) -> SdResult<()> {
        let search = self.function(SEARCH_FUNCTION)?;
        search
            .call::<()>(query)
            .map_err(|e| self.runtime_error(SEARCH_FUNCTION, e))
    }

    /// Call `descriptor()` and hand back its first return value
    pub fn call_descriptor(&self) -> SdResult<Value> {
        let descriptor = self.function(DESCRIPTOR_FUNCTION)?;
        descriptor
            .call::<Value>(())
            .map_err(|e| self.runtime_error(DESCRIPTOR_FUNCTION, e))
    }

    /// Coerce a Lua value to a string the way `tostring` would for
    /// strings and numbers; anything else yields `None`.
    pub fn coerce_string(&self, value: Value) -> Option<String> {
        match self.lua.coerce_string(value) {
            Ok(Some(s)) => Some(s.to_string_lossy().to_string()),
            _ => None,
        }
    }

    /// Full garbage collection cycle
    pub fn collect_garbage(&self) {
        match self.lua.gc_collect() {
            Ok(()) => self.journal.debug(format!(
                "interpreter holds {} bytes after collection",
                self.memory_used()
            )),
            Err(e) => self
                .journal
                .debug(format!("garbage collection failed: {}", lua_message(&e))),
        }
    }

    /// Bytes currently held by the interpreter
    pub fn memory_used(&self) -> usize {
        self.lua.used_memory()
    }
}
