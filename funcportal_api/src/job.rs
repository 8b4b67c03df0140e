// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use crate::arguments::Arguments;

/// Opaque identifier of a queued invocation.
///
/// New tokens are hyphenated UUID v4 strings, which can be embedded as-is in
/// a URL path segment. Any string received from a caller is accepted as a
/// token: stores simply report unknown ones as absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Status of a job as seen by a reader.
#[derive(Debug, Clone, PartialEq)]
pub enum JobView {
    Absent,
    Pending,
    Completed(serde_json::Value),
    /// The function failed in the worker; the reason is for logs only.
    Failed(String),
}

/// Final result written back by a worker.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobResult {
    Completed(serde_json::Value),
    Failed(String),
}

impl From<JobResult> for JobView {
    fn from(result: JobResult) -> Self {
        match result {
            JobResult::Completed(value) => JobView::Completed(value),
            JobResult::Failed(reason) => JobView::Failed(reason),
        }
    }
}

/// A unit of work waiting for a worker.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QueuedJob {
    pub token: Token,
    /// Name of the function adapter to invoke.
    pub function: String,
    pub arguments: Arguments,
}

/// Capability used by the portal to hand work over and read results back.
#[async_trait::async_trait]
pub trait JobStoreAPI: Send + Sync {
    /// Queue an invocation of `function` and return immediately.
    async fn enqueue(&self, function: &str, arguments: Arguments) -> anyhow::Result<Token>;

    /// Read the status of a job queued for `function`. Must not change it.
    ///
    /// A job queued for another function is reported as absent.
    async fn fetch(&self, function: &str, token: &Token) -> anyhow::Result<JobView>;
}

/// Capability used by workers to pull work and store results.
#[async_trait::async_trait]
pub trait JobWorkerAPI: Send + Sync {
    /// Next job in queue order, or `None` if nothing arrived for a while.
    async fn next_job(&self) -> anyhow::Result<Option<QueuedJob>>;

    async fn complete(&self, token: &Token, result: JobResult) -> anyhow::Result<()>;
}
