//! Named static arguments bound to every invocation of a target function.

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Immutable name -> value mapping shared read-only by all workers.
///
/// Build it up front with `with(..)`, then hand a reference to the mapper.
/// Workers only ever see `&StaticArgs`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticArgs {
    values: BTreeMap<String, Value>,
}

impl StaticArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`. Later bindings for the same name replace earlier ones.
    pub fn with<V: Serialize>(mut self, name: impl Into<String>, value: V) -> Result<Self> {
        let name = name.into();
        let v = serde_json::to_value(value).with_context(|| format!("serialize static arg {name:?}"))?;
        self.values.insert(name, v);
        Ok(self)
    }

    /// Parse a JSON object (`{"scale": 2, "offset": 1}`) into static arguments.
    pub fn from_json(s: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(s).context("parse static args JSON")?;
        match v {
            Value::Object(map) => Ok(Self { values: map.into_iter().collect() }),
            other => Err(anyhow!("static args must be a JSON object, got {other}")),
        }
    }

    /// Typed lookup; `Ok(None)` when the name is unbound.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .with_context(|| format!("static arg {name:?} has unexpected type")),
        }
    }

    /// Typed lookup that errors when the name is unbound.
    pub fn require<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.get(name)?.ok_or_else(|| anyhow!("missing static arg {name:?}"))
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
