//! Descriptor Loader
//!
//! Reads a discovery script's static metadata by loading the file into a
//! fresh interpreter, calling `descriptor()` and marshalling the returned
//! table. The live worker's interpreter is never touched, so this can run
//! while a search is in flight.

use mlua::{Table, Value};
use serde::Serialize;
use std::path::Path;

use super::capability::Capabilities;
use super::context::ScriptContext;
use super::error::{SdError, SdResult};
use super::journal::SharedJournal;

/// Static metadata about a discovery source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DescriptorRecord {
    pub short_description: Option<String>,
    pub icon: Option<String>,
    pub url: Option<String>,
    pub capabilities: Capabilities,
}

impl DescriptorRecord {
    pub fn supports(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Load `script` into a throwaway context and build its descriptor.
///
/// Diagnostics go to `journal`; the context is dropped on every return path.
pub fn load_descriptor(
    script: &Path,
    journal: &SharedJournal,
    memory_limit: Option<usize>,
) -> SdResult<DescriptorRecord> {
    let context =
        ScriptContext::open_isolated(script, journal.clone(), memory_limit).map_err(|e| {
            journal.error(e.to_string());
            e
        })?;

    let value = context.call_descriptor().map_err(|e| {
        journal.warn(format!(
            "Error getting the descriptor in '{}': {}",
            script.display(),
            e
        ));
        e
    })?;

    let Value::Table(table) = value else {
        let err = SdError::InvalidDescriptor {
            path: script.to_path_buf(),
        };
        journal.warn(err.to_string());
        return Err(err);
    };

    Ok(DescriptorRecord {
        short_description: string_field(&context, &table, "short_description"),
        icon: string_field(&context, &table, "icon"),
        url: string_field(&context, &table, "url"),
        capabilities: capabilities_field(&context, &table, script, journal),
    })
}

/// A string or number field as text; absent or any other type reads as `None`
fn string_field(context: &ScriptContext, table: &Table, key: &str) -> Option<String> {
    let value = table.get::<Value>(key).ok()?;
    context.coerce_string(value)
}

/// Fold the `capabilities` list into a bitmask, skipping unknown names
fn capabilities_field(
    context: &ScriptContext,
    table: &Table,
    script: &Path,
    journal: &SharedJournal,
) -> Capabilities {
    let mut capabilities = Capabilities::empty();

    let Ok(Value::Table(list)) = table.get::<Value>("capabilities") else {
        return capabilities;
    };

    for pair in list.pairs::<Value, Value>() {
        let Ok((_, entry)) = pair else {
            continue;
        };

        let Some(name) = context.coerce_string(entry) else {
            journal.warn(format!(
                "Services discovery capability in script '{}' is not a string",
                script.display()
            ));
            continue;
        };

        match Capabilities::from_name(&name) {
            Some(capability) => capabilities.insert(capability),
            None => journal.warn(format!(
                "Services discovery capability '{}' unknown in script '{}'",
                name,
                script.display()
            )),
        }
    }

    capabilities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::journal::{Journal, Severity};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn load(body: &str) -> (SdResult<DescriptorRecord>, SharedJournal) {
        load_with_limit(body, None)
    }

    fn load_with_limit(
        body: &str,
        memory_limit: Option<usize>,
    ) -> (SdResult<DescriptorRecord>, SharedJournal) {
        let dir = TempDir::new().unwrap();
        let path: PathBuf = dir.path().join("desc.lua");
        std::fs::write(&path, body).unwrap();
        let journal = Journal::new(&path);
        (load_descriptor(&path, &journal, memory_limit), journal)
    }

    #[test]
    fn test_full_descriptor() {
        let (result, journal) = load(
            r#"
            function descriptor()
                return {
                    short_description = "X",
                    icon = "Y",
                    url = "Z",
                    capabilities = { "search", "bogus" },
                }
            end
        "#,
        );

        let record = result.unwrap();
        assert_eq!(record.short_description.as_deref(), Some("X"));
        assert_eq!(record.icon.as_deref(), Some("Y"));
        assert_eq!(record.url.as_deref(), Some("Z"));
        assert_eq!(record.capabilities, Capabilities::SEARCH);

        let warnings = journal.entries_at(Severity::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("'bogus' unknown"));
    }

    #[test]
    fn test_number_fields_read_as_text() {
        let (result, journal) = load(
            r#"
            function descriptor()
                return { short_description = 12, url = 3.5, capabilities = { "search" } }
            end
        "#,
        );

        let record = result.unwrap();
        assert_eq!(record.short_description.as_deref(), Some("12"));
        assert_eq!(record.url.as_deref(), Some("3.5"));
        assert!(record.supports(Capabilities::SEARCH));
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_missing_and_non_string_fields_are_none() {
        let (result, journal) = load(
            r#"function descriptor() return { icon = {}, url = true } end"#,
        );

        let record = result.unwrap();
        assert_eq!(record, DescriptorRecord::default());
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_memory_limit_caps_descriptor_load() {
        let body = r#"
            local t = {}
            for i = 1, 100000 do t[i] = string.rep("x", 1024) .. i end
            function descriptor() return { short_description = "big" } end
        "#;

        let (result, journal) = load_with_limit(body, Some(1024 * 1024));
        assert!(matches!(result, Err(SdError::ResourceExhaustion(_))));
        assert_eq!(journal.entries_at(Severity::Error).len(), 1);

        let (result, _journal) = load_with_limit(body, None);
        assert_eq!(result.unwrap().short_description.as_deref(), Some("big"));
    }

    #[test]
    fn test_capabilities_not_a_list_is_ignored() {
        let (result, _journal) =
            load(r#"function descriptor() return { capabilities = "search" } end"#);
        assert!(result.unwrap().capabilities.is_empty());
    }

    #[test]
    fn test_capability_match_is_case_sensitive() {
        let (result, journal) =
            load(r#"function descriptor() return { capabilities = { "SEARCH" } } end"#);
        assert!(!result.unwrap().supports(Capabilities::SEARCH));
        assert_eq!(journal.entries_at(Severity::Warn).len(), 1);
    }

    #[test]
    fn test_non_string_capability_warns_and_continues() {
        let (result, journal) = load(
            r#"function descriptor() return { capabilities = { {}, "search" } } end"#,
        );
        assert!(result.unwrap().supports(Capabilities::SEARCH));
        assert_eq!(journal.entries_at(Severity::Warn).len(), 1);
    }

    #[test]
    fn test_missing_descriptor_function() {
        let (result, journal) = load("function main() end");
        assert!(matches!(result, Err(SdError::NotAFunction { .. })));
        assert_eq!(journal.entries_at(Severity::Warn).len(), 1);
    }

    #[test]
    fn test_raising_descriptor_function() {
        let (result, journal) = load(r#"function descriptor() error("nope") end"#);
        assert!(matches!(result, Err(SdError::ScriptRuntime { .. })));
        assert!(journal.entries_at(Severity::Warn)[0].message.contains("nope"));
    }

    #[test]
    fn test_non_table_descriptor() {
        let (result, _journal) = load(r#"function descriptor() return "meta" end"#);
        assert!(matches!(result, Err(SdError::InvalidDescriptor { .. })));
    }

    #[test]
    fn test_broken_script_is_load_error() {
        let (result, journal) = load("this is not lua");
        assert!(matches!(result, Err(SdError::ScriptLoad { .. })));
        assert_eq!(journal.entries_at(Severity::Error).len(), 1);
    }

    #[test]
    fn test_top_level_code_cannot_reach_catalog() {
        let (result, _journal) = load(
            r#"
            sd.add_node({ title = "side effect" })
            function descriptor() return {} end
        "#,
        );
        assert!(matches!(result, Err(SdError::ScriptLoad { .. })));
    }
}
