// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

/// Mapping from argument name to an arbitrary JSON value, as sent by a caller.
///
/// Values are never type-checked by the portal: a wrapped function binds them
/// to Rust types on its own through [`Arguments::get`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Arguments(serde_json::Map<String, serde_json::Value>);

/// A wrapped function could not bind one of its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    Absent(String),
    Mismatch { name: String, detail: String },
}

impl std::fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgumentError::Absent(name) => write!(f, "argument '{}' is absent", name),
            ArgumentError::Mismatch { name, detail } => write!(f, "argument '{}' cannot be bound: {}", name, detail),
        }
    }
}

impl std::error::Error for ArgumentError {}

impl Arguments {
    pub fn new() -> Self {
        Self(serde_json::Map::new())
    }

    /// Bind the argument `name` to `T`.
    pub fn get<T>(&self, name: &str) -> Result<T, ArgumentError>
    where
        T: serde::de::DeserializeOwned,
    {
        let value = self.0.get(name).ok_or_else(|| ArgumentError::Absent(name.to_string()))?;
        T::deserialize(value).map_err(|err| ArgumentError::Mismatch {
            name: name.to_string(),
            detail: err.to_string(),
        })
    }

    pub fn raw(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: &str, value: serde_json::Value) -> Option<serde_json::Value> {
        self.0.insert(name.to_string(), value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|name| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> serde_json::Map<String, serde_json::Value> {
        self.0
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Arguments {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<serde_json::Value> for Arguments {
    type Error = anyhow::Error;

    fn try_from(value: serde_json::Value) -> anyhow::Result<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(Self(map)),
            other => Err(anyhow::anyhow!("arguments must be a JSON object, got: {}", other)),
        }
    }
}
