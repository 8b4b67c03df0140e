// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use funcportal_api::job::{JobResult, JobStoreAPI, JobView, JobWorkerAPI, QueuedJob, Token};
use funcportal_api::Arguments;

/// Job store living in the memory of the portal process.
///
/// Workers must run in the same process, as tasks sharing a clone of the store.
#[derive(Clone)]
pub struct MemoryJobStore {
    inner: std::sync::Arc<tokio::sync::Mutex<MemoryJobStoreInner>>,
    notify: std::sync::Arc<tokio::sync::Notify>,
    poll_interval: std::time::Duration,
}

struct MemoryJobStoreInner {
    records: std::collections::HashMap<Token, JobRecord>,
    queue: std::collections::VecDeque<QueuedJob>,
}

struct JobRecord {
    function: String,
    view: JobView,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self {
            inner: std::sync::Arc::new(tokio::sync::Mutex::new(MemoryJobStoreInner {
                records: std::collections::HashMap::new(),
                queue: std::collections::VecDeque::new(),
            })),
            notify: std::sync::Arc::new(tokio::sync::Notify::new()),
            poll_interval: std::time::Duration::from_secs(1),
        }
    }

    /// Maximum time `next_job` waits for new work before returning `None`.
    pub fn with_poll_interval(mut self, poll_interval: std::time::Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn queued(&self) -> usize {
        self.inner.lock().await.queue.len()
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl JobStoreAPI for MemoryJobStore {
    async fn enqueue(&self, function: &str, arguments: Arguments) -> anyhow::Result<Token> {
        let token = Token::new();
        {
            let mut lck = self.inner.lock().await;
            lck.records.insert(
                token.clone(),
                JobRecord {
                    function: function.to_string(),
                    view: JobView::Pending,
                },
            );
            lck.queue.push_back(QueuedJob {
                token: token.clone(),
                function: function.to_string(),
                arguments,
            });
        }
        self.notify.notify_one();
        Ok(token)
    }

    async fn fetch(&self, function: &str, token: &Token) -> anyhow::Result<JobView> {
        Ok(match self.inner.lock().await.records.get(token) {
            Some(record) if record.function == function => record.view.clone(),
            _ => JobView::Absent,
        })
    }
}

#[async_trait::async_trait]
impl JobWorkerAPI for MemoryJobStore {
    async fn next_job(&self) -> anyhow::Result<Option<QueuedJob>> {
        if let Some(job) = self.inner.lock().await.queue.pop_front() {
            return Ok(Some(job));
        }
        let _ = tokio::time::timeout(self.poll_interval, self.notify.notified()).await;
        Ok(self.inner.lock().await.queue.pop_front())
    }

    async fn complete(&self, token: &Token, result: JobResult) -> anyhow::Result<()> {
        let mut lck = self.inner.lock().await;
        match lck.records.get_mut(token) {
            Some(record) if matches!(record.view, JobView::Pending) => {
                record.view = JobView::from(result);
                Ok(())
            }
            Some(_) => anyhow::bail!("job {} already completed", token),
            None => anyhow::bail!("completing an unknown job: {}", token),
        }
    }
}
