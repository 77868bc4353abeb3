//! Interfaces between page actions and whatever runs them.
//!
//! Pages carry `<action>` blocks of code. The engine does not know the
//! language; it hands the code to an [`Evaluator`] together with a set of
//! named string values and a [`ScriptHost`], the table of things a script
//! may ask the browser to do.

use thiserror::Error;

/// How deep `action()` calls may nest before the chain is cut off.
pub const MAX_ACTION_DEPTH: usize = 16;

/// Named string values visible to one evaluation, e.g. `value`.
pub type Names = [(String, String)];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The code failed to compile or raised an error.
    #[error("script error: {0}")]
    Runtime(String),

    /// `action()` calls nested past [`MAX_ACTION_DEPTH`].
    #[error("action `{0}` nested too deep")]
    TooDeep(String),
}

/// What a script may ask of the browser.
pub trait ScriptHost {
    /// Navigate to `url` once the script returns.
    fn visit(&mut self, url: &str);

    /// A browser-wide variable, surviving navigation.
    fn var(&self, name: &str) -> Option<String>;

    fn set_var(&mut self, name: &str, value: &str);

    /// Run another action of the current page once the script returns.
    fn action(&mut self, name: &str);

    /// Append a line to the debug log.
    fn debug(&mut self, text: &str);

    /// Replace the value of the element with `id`; `false` if none.
    fn set_value(&mut self, id: &str, value: &str) -> bool;

    /// A query parameter of the current URL.
    fn url_param(&self, name: &str) -> Option<String>;
}

/// Runs action code.
pub trait Evaluator {
    /// Evaluate `code` with `names` bound.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Runtime`] when the code cannot be compiled or
    /// fails while running.
    fn eval(&mut self, code: &str, names: &Names, host: &mut dyn ScriptHost) -> Result<(), ScriptError>;
}
