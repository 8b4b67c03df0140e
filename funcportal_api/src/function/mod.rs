// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use crate::arguments::{ArgumentError, Arguments};
use crate::signature::{ArgumentsDescription, Parameter, Signature};

mod finite;

/// What to do with caller-supplied arguments that match no declared parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraArguments {
    /// Forward them silently.
    Accept,
    /// Forward them and log a warning.
    #[default]
    Warn,
    /// Refuse the call as invalid.
    Reject,
}

/// Classification of a failed invocation.
#[derive(Debug)]
pub enum InvocationError {
    /// Required parameters were not supplied; all of them are listed, in declaration order.
    MissingArguments { function: String, missing: Vec<String> },
    /// The arguments could not be bound for a reason other than missing names.
    InvalidArguments(String),
    /// The wrapped function failed while running.
    RuntimeFailure(anyhow::Error),
    /// The function returned a value that cannot be represented as JSON.
    SerializationFailure(serde_json::Error),
}

impl std::fmt::Display for InvocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationError::MissingArguments { function, missing } => write!(
                f,
                "{}() missing {} required argument{}: {}",
                function,
                missing.len(),
                if missing.len() == 1 { "" } else { "s" },
                missing.iter().map(|name| format!("'{}'", name)).collect::<Vec<String>>().join(", ")
            ),
            InvocationError::InvalidArguments(detail) => write!(f, "invalid arguments: {}", detail),
            InvocationError::RuntimeFailure(err) => write!(f, "runtime failure: {:#}", err),
            InvocationError::SerializationFailure(err) => write!(f, "serialization failure: {}", err),
        }
    }
}

impl std::error::Error for InvocationError {}

type Callable = dyn Fn(&Arguments) -> Result<serde_json::Value, InvocationError> + Send + Sync;

/// A callable together with its parameter signature.
///
/// The signature is fixed at construction. Cloning an adapter is cheap and
/// every clone shares the same immutable callable and signature, so `invoke`
/// may run concurrently from any number of tasks.
#[derive(Clone)]
pub struct FunctionAdapter {
    name: String,
    signature: std::sync::Arc<Signature>,
    extra_arguments: ExtraArguments,
    callable: std::sync::Arc<Callable>,
}

impl std::fmt::Debug for FunctionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionAdapter")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("extra_arguments", &self.extra_arguments)
            .finish()
    }
}

impl FunctionAdapter {
    /// Wrap `function`, declared with `signature`, under the display name `name`.
    ///
    /// The function receives the caller's arguments with the defaults of
    /// omitted optional parameters filled in. An [`ArgumentError`] returned by
    /// the function is reported as invalid arguments, any other error as a
    /// runtime failure.
    pub fn new<F, T>(name: &str, signature: Signature, function: F) -> anyhow::Result<Self>
    where
        F: Fn(&Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
        T: serde::Serialize,
    {
        if name.is_empty() {
            anyhow::bail!("empty function name");
        }
        if let Err(err) = signature.check() {
            anyhow::bail!("invalid signature of function {}: {}", name, err);
        }

        let callable = move |arguments: &Arguments| -> Result<serde_json::Value, InvocationError> {
            let output = function(arguments).map_err(|err| match err.downcast::<ArgumentError>() {
                Ok(binding_err) => InvocationError::InvalidArguments(binding_err.to_string()),
                Err(err) => InvocationError::RuntimeFailure(err),
            })?;
            finite::check(&output).map_err(InvocationError::SerializationFailure)?;
            serde_json::to_value(output).map_err(InvocationError::SerializationFailure)
        };

        Ok(Self {
            name: name.to_string(),
            signature: std::sync::Arc::new(signature),
            extra_arguments: ExtraArguments::default(),
            callable: std::sync::Arc::new(callable),
        })
    }

    pub fn with_extra_arguments(mut self, policy: ExtraArguments) -> Self {
        self.extra_arguments = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        self.signature.parameters()
    }

    pub fn describe(&self) -> ArgumentsDescription {
        self.signature.describe()
    }

    /// True if a request body has to be parsed before calling the function.
    pub fn requires_arguments(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Check argument names against the signature without calling the function.
    pub fn validate(&self, arguments: &Arguments) -> Result<(), InvocationError> {
        let missing = self.signature.missing(arguments.names());
        if !missing.is_empty() {
            return Err(InvocationError::MissingArguments {
                function: self.name.clone(),
                missing,
            });
        }

        if self.extra_arguments != ExtraArguments::Accept {
            let unknown = self.signature.unknown(arguments.names());
            if !unknown.is_empty() {
                match self.extra_arguments {
                    ExtraArguments::Reject => {
                        return Err(InvocationError::InvalidArguments(format!(
                            "{}() got unexpected arguments: {}",
                            self.name,
                            unknown.join(", ")
                        )));
                    }
                    _ => {
                        log::warn!("{}() called with unexpected arguments: {}", self.name, unknown.join(", "));
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate `arguments`, fill in defaults and call the function.
    pub fn invoke(&self, arguments: Arguments) -> Result<serde_json::Value, InvocationError> {
        self.validate(&arguments)?;

        let mut arguments = arguments;
        for parameter in self.signature.parameters() {
            if let Some(default) = parameter.default() {
                if !arguments.contains(parameter.name()) {
                    arguments.insert(parameter.name(), default.clone());
                }
            }
        }

        (self.callable)(&arguments)
    }
}
