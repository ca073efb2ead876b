use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ConfigError;

/// Environment variables handed to a task instance.
///
/// Stored as an ordered list of key–value pairs and serialized as an array of
/// `[key, value]` arrays, which is what the host expects on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvVars(Vec<(String, String)>);

impl EnvVars {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Get the value for a key, returning the last matching entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append a pair. Later entries override earlier ones in [`EnvVars::get`].
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push((key.into(), value.into()));
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K, V> FromIterator<(K, V)> for EnvVars
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Raw `env_vars` option as supplied at registration time.
///
/// A mapping has no inherent order, so it is normalized into pairs sorted by
/// key. A pair sequence is kept exactly as given, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvVarsInput {
    Pairs(Vec<(String, String)>),
    Map(BTreeMap<String, String>),
}

impl EnvVarsInput {
    pub fn normalize(self) -> EnvVars {
        match self {
            EnvVarsInput::Pairs(pairs) => EnvVars(pairs),
            EnvVarsInput::Map(map) => EnvVars(map.into_iter().collect()),
        }
    }
}

impl<K, V> From<Vec<(K, V)>> for EnvVarsInput
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        EnvVarsInput::Pairs(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for EnvVarsInput
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        EnvVarsInput::Pairs(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V> From<HashMap<K, V>> for EnvVarsInput
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(map: HashMap<K, V>) -> Self {
        EnvVarsInput::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V> From<BTreeMap<K, V>> for EnvVarsInput
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        EnvVarsInput::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<EnvVars> for EnvVarsInput {
    fn from(env: EnvVars) -> Self {
        EnvVarsInput::Pairs(env.0)
    }
}

impl TryFrom<&Value> for EnvVarsInput {
    type Error = ConfigError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    let v = v.as_str().ok_or_else(|| {
                        ConfigError::InvalidEnvVars(format!("value for '{k}' is not a string"))
                    })?;
                    out.insert(k.clone(), v.to_string());
                }
                Ok(EnvVarsInput::Map(out))
            }
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| pair_from_value(i, item))
                .collect::<Result<Vec<_>, _>>()
                .map(EnvVarsInput::Pairs),
            other => Err(ConfigError::InvalidEnvVars(format!(
                "expected a mapping or a sequence of pairs, got {}",
                kind_of(other)
            ))),
        }
    }
}

fn pair_from_value(index: usize, item: &Value) -> Result<(String, String), ConfigError> {
    match item.as_array().map(Vec::as_slice) {
        Some([Value::String(k), Value::String(v)]) => Ok((k.clone(), v.clone())),
        _ => Err(ConfigError::InvalidEnvVars(format!(
            "entry {index} is not a [key, value] pair of strings"
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
