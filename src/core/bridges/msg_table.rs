//! msg.* Bridge API
//!
//! `msg.dbg`, `msg.info`, `msg.warn` and `msg.err` join their arguments
//! with spaces (using Lua's `tostring`) and record them in the journal.

use mlua::{Function, Lua, Result as LuaResult, Table, Value, Variadic};

use crate::core::journal::{SharedJournal, Severity};

/// Create the `msg` global table
pub fn create_msg_table(lua: &Lua, journal: SharedJournal) -> LuaResult<Table> {
    let msg = lua.create_table()?;

    msg.set("dbg", create_log_function(lua, journal.clone(), Severity::Debug)?)?;
    msg.set("info", create_log_function(lua, journal.clone(), Severity::Info)?)?;
    msg.set("warn", create_log_function(lua, journal.clone(), Severity::Warn)?)?;
    msg.set("err", create_log_function(lua, journal, Severity::Error)?)?;

    Ok(msg)
}

fn create_log_function(lua: &Lua, journal: SharedJournal, level: Severity) -> LuaResult<Function> {
    lua.create_function(move |lua, args: Variadic<Value>| {
        let tostring: Function = lua.globals().get("tostring")?;

        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(tostring.call::<String>(arg)?);
        }

        journal.record(level, parts.join(" "));
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::journal::Journal;

    fn lua_with_msg() -> (Lua, SharedJournal) {
        let lua = Lua::new();
        let journal = Journal::new("msg_test.lua");
        let msg = create_msg_table(&lua, journal.clone()).unwrap();
        lua.globals().set("msg", msg).unwrap();
        (lua, journal)
    }

    #[test]
    fn test_levels_map_to_severity() {
        let (lua, journal) = lua_with_msg();
        lua.load(
            r#"
            msg.dbg("d")
            msg.info("i")
            msg.warn("w")
            msg.err("e")
        "#,
        )
        .exec()
        .unwrap();

        let levels: Vec<Severity> = journal.entries().iter().map(|e| e.level).collect();
        assert_eq!(
            levels,
            vec![Severity::Debug, Severity::Info, Severity::Warn, Severity::Error]
        );
    }

    #[test]
    fn test_arguments_joined_with_tostring() {
        let (lua, journal) = lua_with_msg();
        lua.load(r#"msg.info("found", 3, "streams", true)"#)
            .exec()
            .unwrap();

        assert_eq!(journal.entries()[0].message, "found 3 streams true");
    }
}
