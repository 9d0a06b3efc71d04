//! Named parameter mappings for submodel calls.
//!
//! A [`Params`] value is an ordered name → value mapping, one of which is
//! routed to each submodel when a composite distribution is evaluated,
//! sampled, or frozen. Lookups of required names fail with
//! [`CompositeError::MissingParameter`] rather than panicking, so atom
//! factories surface bad parameter sets as ordinary errors at freeze or
//! call time.
//!
//! Iteration order is the lexicographic order of parameter names, which
//! keeps error messages and renaming passes deterministic.
use std::collections::BTreeMap;

use crate::composite::errors::{CompositeError, CompositeResult};

/// Ordered mapping from parameter name to scalar value.
///
/// An empty mapping is the conventional "no parameters" value used when a
/// frozen submodel is evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: BTreeMap<String, f64>,
}

impl Params {
    /// An empty parameter mapping.
    pub fn new() -> Params {
        Params::default()
    }

    /// Build a mapping from name/value pairs.
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Params {
        pairs.iter().map(|&(name, value)| (name.to_string(), value)).collect()
    }

    /// Insert or replace one parameter, builder-style.
    pub fn with(mut self, name: &str, value: f64) -> Params {
        self.insert(name, value);
        self
    }

    /// Insert or replace one parameter.
    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Look up a parameter that must be present.
    ///
    /// # Errors
    /// Returns [`CompositeError::MissingParameter`] if `name` is absent.
    pub fn require(&self, name: &str) -> CompositeResult<f64> {
        self.get(name).ok_or_else(|| CompositeError::MissingParameter { name: name.to_string() })
    }

    /// The parameter names, in iteration order.
    pub fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Iterate over name/value pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.values.iter()
    }

    /// Number of parameters in the mapping.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the mapping holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Params {
        Params { values: iter.into_iter().collect() }
    }
}
