// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

/// One declared parameter of a wrapped function.
///
/// A parameter is required if and only if no default was declared for it.
/// A default of JSON `null` still makes the parameter optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    default: Option<serde_json::Value>,
}

impl Parameter {
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            default: None,
        }
    }

    pub fn optional(name: &str, default: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            default: Some(default),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn default(&self) -> Option<&serde_json::Value> {
        self.default.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RequiredArgument {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OptionalArgument {
    pub name: String,
    pub default: serde_json::Value,
}

/// Diagnostic view of a signature, sent to callers along with missing-argument errors.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ArgumentsDescription {
    pub required: Vec<RequiredArgument>,
    pub optional: Vec<OptionalArgument>,
}

/// Ordered parameter list of a function, in declaration order.
///
/// ```
/// let signature = funcportal_api::Signature::new().param("base").param_with_default("power", 2);
/// assert_eq!(1, signature.describe().required.len());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new() -> Self {
        Self { parameters: vec![] }
    }

    /// Declare a required parameter.
    pub fn param(mut self, name: &str) -> Self {
        self.parameters.push(Parameter::required(name));
        self
    }

    /// Declare an optional parameter with its default value.
    pub fn param_with_default<V: Into<serde_json::Value>>(mut self, name: &str, default: V) -> Self {
        self.parameters.push(Parameter::optional(name, default.into()));
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().filter(|p| p.is_required()).map(|p| p.name())
    }

    /// Required names absent from `names`, in declaration order.
    pub fn missing<'a>(&self, names: impl Iterator<Item = &'a str>) -> Vec<String> {
        let provided = names.collect::<std::collections::HashSet<&str>>();
        self.required_names()
            .filter(|name| !provided.contains(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Names in `names` that match no declared parameter, sorted.
    pub fn unknown<'a>(&self, names: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut unknown = names
            .filter(|name| !self.parameters.iter().any(|p| p.name() == *name))
            .map(|name| name.to_string())
            .collect::<Vec<String>>();
        unknown.sort();
        unknown
    }

    pub fn describe(&self) -> ArgumentsDescription {
        let mut description = ArgumentsDescription::default();
        for parameter in &self.parameters {
            match parameter.default() {
                None => description.required.push(RequiredArgument {
                    name: parameter.name().to_string(),
                }),
                Some(default) => description.optional.push(OptionalArgument {
                    name: parameter.name().to_string(),
                    default: default.clone(),
                }),
            }
        }
        description
    }

    /// Check that parameter names are non-empty and unique.
    pub fn check(&self) -> anyhow::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for parameter in &self.parameters {
            if parameter.name().is_empty() {
                anyhow::bail!("empty parameter name");
            }
            if !seen.insert(parameter.name()) {
                anyhow::bail!("duplicate parameter: {}", parameter.name());
            }
        }
        Ok(())
    }
}
