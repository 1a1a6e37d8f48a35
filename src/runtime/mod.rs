//! Variable semantics shared with the emitted program.
//!
//! The compiler uses [`placeholders`] to find the variables a message reads;
//! the CLI `preview` command uses [`VariableTiers`] and [`substitute`] to show
//! what a user would see.

use ahash::AHashMap;
use itertools::Itertools;
use serde_json::Value;

/// Variables every user record is seeded with on first contact.
pub const BUILTIN_VARIABLES: &[&str] = &["user_id", "user_name", "first_name", "last_name", "username"];

pub type Variables = AHashMap<String, Value>;

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_VARIABLES.contains(&name)
}

/// Distinct `{name}` placeholders in `text`, in order of first appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    tokens(text).map(|(_, name)| name.to_string()).unique().collect()
}

/// Replaces every placeholder with a value from `variables`; unknown ones stay as written.
pub fn substitute(text: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, name) in tokens(text) {
        if let Some(value) = variables.get(name) {
            out.push_str(&text[last..start]);
            out.push_str(&render_value(value));
            last = start + name.len() + 2;
        }
    }
    out.push_str(&text[last..]);
    out
}

/// A value as Python's `str()` would print it.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// The two variable sources of one user.
#[derive(Debug, Clone, Default)]
pub struct VariableTiers {
    /// Values loaded from the durable store.
    pub durable: Variables,
    /// Values held by the running process.
    pub local: Variables,
}

impl VariableTiers {
    /// Durable values first, local values on top; local wins on conflict.
    pub fn merged(&self) -> Variables {
        let mut merged = self.durable.clone();
        merged.extend(self.local.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    pub fn render(&self, text: &str) -> String {
        substitute(text, &self.merged())
    }
}

/// Yields `(byte offset of '{', name)` for each well-formed placeholder.
fn tokens(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.match_indices('{').filter_map(move |(start, _)| {
        let rest = &text[start + 1..];
        let end = rest.find('}')?;
        let name = &rest[..end];
        is_identifier(name).then_some((start, name))
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
