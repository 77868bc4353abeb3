// SPDX-License-Identifier: MIT
//
// Lua page actions.
//
// Each `<action>` body is a Lua 5.4 chunk. A chunk runs in a fresh
// environment table that falls back to the globals, so locals and stray
// assignments of one action never leak into the next. The browser's
// capabilities are bound into that environment for the duration of one
// call only:
//
//   visit(url)              navigate once the action returns
//   getvar(name)            browser variable, the string "None" if unset
//   var(name, value)        set a browser variable (and log it)
//   action(name)            run another action once this one returns
//   encode(text)            percent-encode for a query string
//   debug(text)             append to the debug log
//   geturlparam(name)       query parameter of the current URL, or nil
//   setvalue(id, value)     replace an element's value
//
// The functions are scoped: they borrow the host and stop existing when
// the call ends, so a script can't stash one and call it later.
//
// Pages come from the network, so the state is a sandbox. Only the
// string, table, math and utf8 libraries are loaded; the base functions
// that reach the file system or stdout are removed. An instruction hook
// gives every action a fixed budget and aborts it once that is spent.
//
// A new evaluator (and with it a new Lua state) is created for every page.
// The state itself is built on the first action.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mlua::{HookTriggers, Lua, LuaOptions, StdLib, Table, Value, VmState};
use piko_page::script::Names;
use piko_page::{Evaluator, ScriptError, ScriptHost};

/// Base library functions a page must not see.
const REMOVED_GLOBALS: [&str; 5] = ["dofile", "loadfile", "load", "collectgarbage", "print"];

/// Instructions between two budget checks.
const HOOK_INTERVAL: u32 = 1_000;

/// Budget checks one action may pass, so `HOOK_INTERVAL` times this many
/// instructions in total.
const MAX_HOOK_CALLS: u32 = 5_000;

/// Message of the error that stops an action over budget.
pub const BUDGET_EXCEEDED: &str = "instruction limit reached";

fn sandbox(budget: Rc<Cell<u32>>) -> mlua::Result<Lua> {
    let lua = Lua::new_with(
        StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8,
        LuaOptions::default(),
    )?;
    {
        let globals = lua.globals();
        for name in REMOVED_GLOBALS {
            globals.set(name, Value::Nil)?;
        }
    }
    lua.set_hook(
        HookTriggers::new().every_nth_instruction(HOOK_INTERVAL),
        move |_, _| {
            let left = budget.get();
            if left == 0 {
                return Err(mlua::Error::runtime(BUDGET_EXCEEDED));
            }
            budget.set(left - 1);
            Ok(VmState::Continue)
        },
    )?;
    Ok(lua)
}

pub struct LuaEvaluator {
    lua: Option<Lua>,
    /// Budget checks left for the running action.
    budget: Rc<Cell<u32>>,
}

impl LuaEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lua: None,
            budget: Rc::new(Cell::new(MAX_HOOK_CALLS)),
        }
    }

    fn state(&mut self) -> mlua::Result<&Lua> {
        let lua = match self.lua.take() {
            Some(lua) => lua,
            None => sandbox(Rc::clone(&self.budget))?,
        };
        Ok(self.lua.insert(lua))
    }

    fn environment(lua: &Lua, names: &Names) -> mlua::Result<Table> {
        let env: Table = lua
            .load("return setmetatable({}, { __index = _G })")
            .set_name("=env")
            .eval()?;
        for (name, value) in names {
            env.set(name.as_str(), value.as_str())?;
        }
        Ok(env)
    }

    fn run(&mut self, code: &str, names: &Names, host: &mut dyn ScriptHost) -> mlua::Result<()> {
        self.budget.set(MAX_HOOK_CALLS);
        let lua = self.state()?;
        let env = Self::environment(lua, names)?;
        let host = RefCell::new(host);

        lua.scope(|scope| {
            env.set(
                "visit",
                scope.create_function(|_, url: String| {
                    host.borrow_mut().visit(&url);
                    Ok(())
                })?,
            )?;
            env.set(
                "getvar",
                scope.create_function(|_, name: String| {
                    Ok(host.borrow().var(&name).unwrap_or_else(|| "None".to_owned()))
                })?,
            )?;
            env.set(
                "var",
                scope.create_function(|_, (name, value): (String, String)| {
                    let mut h = host.borrow_mut();
                    h.debug(&format!("{name}: {value}"));
                    h.set_var(&name, &value);
                    Ok(())
                })?,
            )?;
            env.set(
                "action",
                scope.create_function(|_, name: String| {
                    host.borrow_mut().action(&name);
                    Ok(())
                })?,
            )?;
            env.set(
                "encode",
                scope.create_function(|_, text: String| Ok(urlencoding::encode(&text).into_owned()))?,
            )?;
            env.set(
                "debug",
                scope.create_function(|_, text: String| {
                    host.borrow_mut().debug(&text);
                    Ok(())
                })?,
            )?;
            env.set(
                "geturlparam",
                scope.create_function(|_, name: String| Ok(host.borrow().url_param(&name)))?,
            )?;
            env.set(
                "setvalue",
                scope.create_function(|_, (id, value): (String, String)| {
                    Ok(host.borrow_mut().set_value(&id, &value))
                })?,
            )?;

            lua.load(code).set_name("=action").set_environment(env.clone()).exec()
        })
    }
}

impl Default for LuaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for LuaEvaluator {
    fn eval(&mut self, code: &str, names: &Names, host: &mut dyn ScriptHost) -> Result<(), ScriptError> {
        self.run(code, names, host)
            .map_err(|e| ScriptError::Runtime(e.to_string()))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
