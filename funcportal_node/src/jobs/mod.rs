// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use funcportal_api::job::{JobStoreAPI, JobView, Token};
use funcportal_api::{Arguments, FunctionAdapter, InvocationError};

pub mod memory;
pub mod redis;


/// Submits invocations to a job store and reads their results back.
///
/// The store is an explicit handle: several portals may share one, and the
/// workers executing the jobs only need the matching `JobWorkerAPI`.
#[derive(Clone)]
pub struct JobLifecycle {
    store: std::sync::Arc<dyn JobStoreAPI>,
}

impl JobLifecycle {
    pub fn new(store: std::sync::Arc<dyn JobStoreAPI>) -> Self {
        Self { store }
    }

    /// Queue an invocation of `adapter` without waiting for it to run.
    ///
    /// Argument names are validated before anything is queued, so a caller
    /// gets the same diagnostics as on a synchronous route.
    pub async fn submit(&self, adapter: &FunctionAdapter, arguments: Arguments) -> Result<Token, InvocationError> {
        adapter.validate(&arguments)?;
        let token = self
            .store
            .enqueue(adapter.name(), arguments)
            .await
            .map_err(|err| InvocationError::RuntimeFailure(err.context(format!("could not enqueue a call to {}", adapter.name()))))?;
        log::debug!("Enqueued job {} for function {}", token, adapter.name());
        Ok(token)
    }

    /// Status of a job submitted through `adapter`.
    pub async fn fetch(&self, adapter: &FunctionAdapter, token: &Token) -> anyhow::Result<JobView> {
        self.store.fetch(adapter.name(), token).await
    }
}
