//! Variable context used to template entity fields.
//!
//! A [`Context`] is built from the document's `vars`. Evaluating a string
//! first renders `{{.key}}` references from the context, then expands
//! `$NAME` / `${NAME}` from the process environment. Rendering never fails:
//! a malformed template, or one that references an unknown variable, is
//! returned exactly as written.

pub mod env;
pub mod template;

use std::collections::BTreeMap;

use maestro_common::constants::{LIVE_LABEL, LIVE_MODE, TEST_LABEL};

pub use self::env::expand_env;

/// The live/test switch, in the form it was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeFlag {
    /// A textual boolean such as `"true"` or `"0"`, taken from `vars`.
    Text(String),
    /// A numeric flag set programmatically; zero means test mode.
    Numeric(i64),
}

impl ModeFlag {
    /// Returns true when the flag selects test mode.
    #[must_use]
    pub fn is_test(&self) -> bool {
        match self {
            Self::Text(raw) => parse_bool(raw).is_none_or(|live| !live),
            Self::Numeric(n) => *n == 0,
        }
    }
}

/// Boolean spellings accepted for `LIVE_MODE`.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Entities whose string fields can be templated.
///
/// Implementors list the fields in the same order from both methods. Names
/// and cross-reference keys are never part of the list.
pub trait Bindable {
    /// Returns the current value of every templatable field.
    fn fields(&self) -> Vec<&str>;

    /// Returns mutable access to every templatable field.
    fn fields_mut(&mut self) -> Vec<&mut String>;
}

/// String-keyed variables plus the resolved live/test flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: BTreeMap<String, String>,
    mode: Option<ModeFlag>,
}

impl Context {
    /// Creates an empty context (test mode).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from document variables.
    ///
    /// Each value has its environment references expanded. The `LIVE_MODE`
    /// variable, when present, becomes the mode flag.
    #[must_use]
    pub fn from_vars(vars: &BTreeMap<String, String>) -> Self {
        let mut context = Self::new();
        for (key, value) in vars {
            let _ = context.insert(key.clone(), expand_env(value));
        }
        context
    }

    /// Overrides the mode flag.
    #[must_use]
    pub fn with_mode(mut self, flag: ModeFlag) -> Self {
        self.mode = Some(flag);
        self
    }

    /// Sets a variable, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if key == LIVE_MODE {
            self.mode = Some(ModeFlag::Text(value.clone()));
        }
        self.values.insert(key, value)
    }

    /// Returns the value of a variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when no variable is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the mode flag, if any was supplied.
    #[must_use]
    pub const fn mode_flag(&self) -> Option<&ModeFlag> {
        self.mode.as_ref()
    }

    /// Returns true unless live mode was explicitly requested.
    #[must_use]
    pub fn test_mode(&self) -> bool {
        self.mode.as_ref().is_none_or(ModeFlag::is_test)
    }

    /// Returns the log label for the current mode.
    #[must_use]
    pub fn mode_label(&self) -> &'static str {
        if self.test_mode() { TEST_LABEL } else { LIVE_LABEL }
    }

    /// Evaluates a template against this context.
    ///
    /// Returns `input` unchanged if it cannot be rendered.
    #[must_use]
    pub fn eval(&self, input: &str) -> String {
        match template::render(input, |name| self.get(name)) {
            Ok(rendered) => expand_env(&rendered),
            Err(err) => {
                tracing::debug!(template = input, ?err, "template left unexpanded");
                input.to_owned()
            }
        }
    }

    /// Replaces every templatable field of `target` with its evaluated form.
    ///
    /// A field is only written when evaluation changed it. Returns the number
    /// of fields rewritten.
    pub fn bind_vars<B: Bindable + ?Sized>(&self, target: &mut B) -> usize {
        let mut changed = 0;
        for field in target.fields_mut() {
            let evaluated = self.eval(field);
            if evaluated != *field {
                *field = evaluated;
                changed += 1;
            }
        }
        changed
    }
}
