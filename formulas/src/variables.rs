//! # variables
//!
//! Named numeric values a formula can refer to, kept in insertion order on
//! top of [`indexmap::IndexMap`].
//!
//! ## Example
//! ```rust
//! # use formulas::VariableTable;
//! let mut vars = VariableTable::new();
//! vars.set("x", 5.0);
//! vars.set("y", -1.0);
//! assert_eq!(vars.get("x"), Some(5.0));
//! vars.set("x", 6.0); // same slot, new value
//! assert_eq!(vars.names().collect::<Vec<_>>(), ["x", "y"]);
//! assert_eq!(vars.get("z"), None);
//! ```

use indexmap::IndexMap;
use smartstring::alias::String;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTable {
    tab: IndexMap<String, f64>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, returning the previous value if any.
    pub fn set(&mut self, name: &str, value: f64) -> Option<f64> {
        self.tab.insert(String::from(name), value)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.tab.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.tab.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tab.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tab.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tab.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.tab.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<'a> FromIterator<(&'a str, f64)> for VariableTable {
    fn from_iter<T: IntoIterator<Item = (&'a str, f64)>>(iter: T) -> Self {
        let mut vars = Self::new();
        for (name, value) in iter {
            vars.set(name, value);
        }
        vars
    }
}
