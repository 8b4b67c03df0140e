// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use crate::jobs::JobLifecycle;
use crate::outcome::Outcome;
use funcportal_api::job::{JobView, Token};
use funcportal_api::{Arguments, FunctionAdapter, InvocationError};

#[cfg(test)]
mod test;

/// Dispatches the requests of one route to its function adapter.
///
/// A synchronous handler invokes the function inline, on tokio's blocking
/// pool, and answers with its result. An asynchronous handler submits the
/// call to the job lifecycle manager and answers with a token, which can be
/// redeemed later through [`FunctionHandler::retrieve`].
pub struct FunctionHandler {
    route: String,
    adapter: FunctionAdapter,
    jobs: Option<JobLifecycle>,
}

impl FunctionHandler {
    pub fn synchronous(route: &str, adapter: FunctionAdapter) -> Self {
        Self {
            route: route.to_string(),
            adapter,
            jobs: None,
        }
    }

    pub fn asynchronous(route: &str, adapter: FunctionAdapter, jobs: JobLifecycle) -> Self {
        Self {
            route: route.to_string(),
            adapter,
            jobs: Some(jobs),
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn adapter(&self) -> &FunctionAdapter {
        &self.adapter
    }

    pub fn is_asynchronous(&self) -> bool {
        self.jobs.is_some()
    }

    /// Handle a call with the raw request body.
    pub async fn call(&self, body: Option<&[u8]>) -> Outcome {
        let arguments = match parse_arguments(&self.adapter, body) {
            Ok(arguments) => arguments,
            Err(outcome) => {
                log::debug!("Malformed payload received on route {}", self.route);
                return outcome;
            }
        };

        match &self.jobs {
            None => self.invoke(arguments).await,
            Some(jobs) => match jobs.submit(&self.adapter, arguments).await {
                Ok(token) => Outcome::Accepted(token),
                Err(err) => self.classify(err),
            },
        }
    }

    /// Report the status of a job submitted through this route.
    pub async fn retrieve(&self, token: &Token) -> Outcome {
        let jobs = match &self.jobs {
            Some(jobs) => jobs,
            None => return Outcome::NoRoute,
        };

        match jobs.fetch(&self.adapter, token).await {
            Ok(JobView::Absent) => Outcome::JobNotFound,
            Ok(JobView::Pending) => Outcome::JobPending,
            Ok(JobView::Completed(value)) => Outcome::Success(value),
            Ok(JobView::Failed(reason)) => {
                log::error!(
                    "Job {} of function {} on route {} failed: {}",
                    token,
                    self.adapter.name(),
                    self.route,
                    reason
                );
                Outcome::JobFailed
            }
            Err(err) => {
                log::error!("Could not fetch job {} on route {}: {:#}", token, self.route, err);
                Outcome::RuntimeFailure
            }
        }
    }

    async fn invoke(&self, arguments: Arguments) -> Outcome {
        let adapter = self.adapter.clone();
        match tokio::task::spawn_blocking(move || adapter.invoke(arguments)).await {
            Ok(Ok(value)) => Outcome::Success(value),
            Ok(Err(err)) => self.classify(err),
            Err(err) => {
                log::error!("Error evaluating the function {} on route {}: {}", self.adapter.name(), self.route, err);
                Outcome::RuntimeFailure
            }
        }
    }

    fn classify(&self, err: InvocationError) -> Outcome {
        match err {
            InvocationError::MissingArguments { .. } => Outcome::MissingArguments {
                message: err.to_string(),
                arguments: self.adapter.describe(),
            },
            InvocationError::InvalidArguments(detail) => {
                log::debug!("Invalid arguments for function {} on route {}: {}", self.adapter.name(), self.route, detail);
                Outcome::InvalidArguments
            }
            InvocationError::RuntimeFailure(err) => {
                log::error!("Error evaluating the function {} on route {}: {:#}", self.adapter.name(), self.route, err);
                Outcome::RuntimeFailure
            }
            InvocationError::SerializationFailure(err) => {
                log::error!(
                    "Error serialising output from function {} on route {} as JSON: {}",
                    self.adapter.name(),
                    self.route,
                    err
                );
                Outcome::SerializationFailure
            }
        }
    }
}

/// Turn a request body into arguments for `adapter`.
///
/// Functions without parameters never look at the body. An empty body is an
/// empty argument set, anything else must be a JSON object.
pub fn parse_arguments(adapter: &FunctionAdapter, body: Option<&[u8]>) -> Result<Arguments, Outcome> {
    if !adapter.requires_arguments() {
        return Ok(Arguments::new());
    }

    let body = match body {
        Some(body) if !body.iter().all(|b| b.is_ascii_whitespace()) => body,
        _ => return Ok(Arguments::new()),
    };

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => Ok(Arguments::from(map)),
        _ => Err(Outcome::MalformedPayload),
    }
}
