//! sd.* Bridge API
//!
//! Lets a discovery script publish what it found:
//!
//! ```lua
//! local node = sd.add_node({ title = "Radios" })
//! sd.add_item({ path = "http://example/stream", title = "Example", node = node })
//! ```

use mlua::{Function, Lua, Result as LuaResult, Table};

use crate::core::catalog::{Catalog, SharedCatalog};
use crate::core::host::SdHost;

/// Create the `sd` global table bound to `host`'s catalog
pub fn create_sd_table(lua: &Lua, host: &SdHost) -> LuaResult<Table> {
    let sd = lua.create_table()?;

    sd.set("add_node", create_add_node_function(lua, host.catalog().clone())?)?;
    sd.set("add_item", create_add_item_function(lua, host.clone())?)?;
    sd.set(
        "remove_item",
        create_remove_function(lua, host.catalog().clone(), Catalog::remove_item)?,
    )?;
    sd.set(
        "remove_node",
        create_remove_function(lua, host.catalog().clone(), Catalog::remove_node)?,
    )?;

    Ok(sd)
}

fn lock_catalog(catalog: &SharedCatalog) -> LuaResult<std::sync::MutexGuard<'_, Catalog>> {
    catalog
        .lock()
        .map_err(|_| mlua::Error::RuntimeError("catalog is unavailable".to_string()))
}

fn create_add_node_function(lua: &Lua, catalog: SharedCatalog) -> LuaResult<Function> {
    lua.create_function(move |_, spec: Table| {
        let title: Option<String> = spec.get("title")?;
        let Some(title) = title else {
            return Err(mlua::Error::RuntimeError(
                "sd.add_node: missing 'title'".to_string(),
            ));
        };
        let arturl: Option<String> = spec.get("arturl")?;

        Ok(lock_catalog(&catalog)?.add_node(title, arturl))
    })
}

fn create_add_item_function(lua: &Lua, host: SdHost) -> LuaResult<Function> {
    lua.create_function(move |_, spec: Table| {
        let path: Option<String> = spec.get("path")?;
        let Some(path) = path else {
            return Err(mlua::Error::RuntimeError(
                "sd.add_item: missing 'path'".to_string(),
            ));
        };
        let title: Option<String> = spec.get("title")?;
        let arturl: Option<String> = spec.get("arturl")?;
        let duration: Option<f64> = spec.get("duration")?;
        let node: Option<u32> = spec.get("node")?;

        let id = lock_catalog(host.catalog())?
            .add_item(path.clone(), title, arturl, duration, node)
            .map_err(|e| mlua::Error::RuntimeError(format!("sd.add_item: {}", e)))?;

        host.journal().debug(format!("item {} added: {}", id, path));
        Ok(id)
    })
}

fn create_remove_function(
    lua: &Lua,
    catalog: SharedCatalog,
    remove: fn(&mut Catalog, u32) -> bool,
) -> LuaResult<Function> {
    lua.create_function(move |_, id: u32| Ok(remove(&mut *lock_catalog(&catalog)?, id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lua_with_sd() -> (Lua, SdHost) {
        let lua = Lua::new();
        let host = SdHost::new("sd_test.lua");
        let sd = create_sd_table(&lua, &host).unwrap();
        lua.globals().set("sd", sd).unwrap();
        (lua, host)
    }

    #[test]
    fn test_add_node_and_item() {
        let (lua, host) = lua_with_sd();
        lua.load(
            r#"
            local node = sd.add_node({ title = "Radios", arturl = "http://art" })
            sd.add_item({ path = "http://a", title = "A", duration = 60, node = node })
        "#,
        )
        .exec()
        .unwrap();

        let catalog = host.catalog().lock().unwrap();
        assert_eq!(catalog.nodes.len(), 1);
        let item = catalog.items_in_order()[0];
        assert_eq!(item.title, "A");
        assert_eq!(item.duration, Some(60.0));
        assert!(item.node.is_some());
    }

    #[test]
    fn test_add_item_requires_path() {
        let (lua, host) = lua_with_sd();
        let result = lua.load(r#"sd.add_item({ title = "no path" })"#).exec();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("missing 'path'"));
        assert!(host.catalog().lock().unwrap().is_empty());
    }

    #[test]
    fn test_add_item_rejects_unknown_node() {
        let (lua, _host) = lua_with_sd();
        let result = lua.load(r#"sd.add_item({ path = "x", node = 99 })"#).exec();
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_returns_presence() {
        let (lua, _host) = lua_with_sd();
        let removed: (bool, bool) = lua
            .load(
                r#"
                local id = sd.add_item({ path = "x" })
                local first = sd.remove_item(id)
                return first, sd.remove_item(id)
            "#,
            )
            .eval()
            .unwrap();
        assert_eq!(removed, (true, false));
    }

    #[test]
    fn test_remove_node_from_script() {
        let (lua, host) = lua_with_sd();
        lua.load(
            r#"
            local n = sd.add_node({ title = "N" })
            sd.add_item({ path = "inside", node = n })
            assert(sd.remove_node(n))
        "#,
        )
        .exec()
        .unwrap();
        assert!(host.catalog().lock().unwrap().is_empty());
    }
}
