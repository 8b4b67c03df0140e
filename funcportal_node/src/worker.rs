// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use funcportal_api::job::{JobResult, JobWorkerAPI, QueuedJob};
use funcportal_api::FunctionAdapter;

/// Executes queued jobs and writes their results back to the store.
///
/// Functions are resolved by adapter name, so a worker can run in a
/// different process than the portal that accepted the job, as long as it
/// knows the same functions.
#[derive(Clone)]
pub struct Worker {
    queue: std::sync::Arc<dyn JobWorkerAPI>,
    functions: std::sync::Arc<std::collections::HashMap<String, FunctionAdapter>>,
}

impl Worker {
    pub fn new(queue: std::sync::Arc<dyn JobWorkerAPI>, functions: std::collections::HashMap<String, FunctionAdapter>) -> Self {
        Self {
            queue,
            functions: std::sync::Arc::new(functions),
        }
    }

    pub async fn run(self) {
        log::info!("Starting worker for functions: {:?}", self.functions.keys().collect::<Vec<&String>>());
        loop {
            if let Err(err) = self.process_next().await {
                log::warn!("Worker could not process the next job: {:#}", err);
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }

    /// Process at most one job. Returns false if the queue had nothing to offer.
    pub async fn process_next(&self) -> anyhow::Result<bool> {
        let job = match self.queue.next_job().await? {
            Some(job) => job,
            None => return Ok(false),
        };
        let token = job.token.clone();
        let result = self.execute(job).await;
        self.queue.complete(&token, result).await?;
        Ok(true)
    }

    async fn execute(&self, job: QueuedJob) -> JobResult {
        let adapter = match self.functions.get(&job.function) {
            Some(adapter) => adapter.clone(),
            None => {
                log::error!("Job {} refers to an unknown function: {}", job.token, job.function);
                return JobResult::Failed(format!("unknown function: {}", job.function));
            }
        };

        log::debug!("Executing job {} of function {}", job.token, job.function);
        let arguments = job.arguments;
        match tokio::task::spawn_blocking(move || adapter.invoke(arguments)).await {
            Ok(Ok(value)) => JobResult::Completed(value),
            Ok(Err(err)) => {
                log::error!("Job {} of function {} failed: {}", job.token, job.function, err);
                JobResult::Failed(err.to_string())
            }
            Err(err) => {
                log::error!("Job {} of function {} aborted: {}", job.token, job.function, err);
                JobResult::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::memory::MemoryJobStore;
    use funcportal_api::job::{JobStoreAPI, JobView};
    use funcportal_api::{Arguments, Signature};

    fn worker(store: &MemoryJobStore) -> Worker {
        let failing = FunctionAdapter::new("failing", Signature::new(), |_| -> anyhow::Result<i32> { anyhow::bail!("always fails") }).unwrap();
        let panicking = FunctionAdapter::new("panicking", Signature::new(), |_| -> anyhow::Result<i32> { panic!("unexpected") }).unwrap();
        let functions = std::collections::HashMap::from([
            ("multiply".to_string(), crate::demo::multiply().unwrap()),
            ("failing".to_string(), failing),
            ("panicking".to_string(), panicking),
        ]);
        Worker::new(std::sync::Arc::new(store.clone()), functions)
    }

    #[tokio::test]
    async fn test_process_next() {
        let store = MemoryJobStore::new().with_poll_interval(std::time::Duration::from_millis(10));
        let worker = worker(&store);

        assert!(!worker.process_next().await.unwrap());

        let token = store
            .enqueue("multiply", Arguments::try_from(serde_json::json!({"x": 2, "y": 3})).unwrap())
            .await
            .unwrap();
        assert_eq!(JobView::Pending, store.fetch("multiply", &token).await.unwrap());

        assert!(worker.process_next().await.unwrap());
        assert_eq!(JobView::Completed(serde_json::json!(6)), store.fetch("multiply", &token).await.unwrap());
        assert_eq!(0, store.queued().await);
    }

    #[tokio::test]
    async fn test_failures_complete_the_job() {
        let store = MemoryJobStore::new().with_poll_interval(std::time::Duration::from_millis(10));
        let worker = worker(&store);

        let unknown = store.enqueue("unknown", Arguments::new()).await.unwrap();
        let failing = store.enqueue("failing", Arguments::new()).await.unwrap();
        let missing = store.enqueue("multiply", Arguments::new()).await.unwrap();
        for _ in 0..3 {
            assert!(worker.process_next().await.unwrap());
        }

        for (function, token) in [("unknown", unknown), ("failing", failing), ("multiply", missing)] {
            assert!(matches!(store.fetch(function, &token).await.unwrap(), JobView::Failed(_)));
        }
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_stop_the_worker() {
        let store = MemoryJobStore::new().with_poll_interval(std::time::Duration::from_millis(10));
        let worker = worker(&store);

        let panicking = store.enqueue("panicking", Arguments::new()).await.unwrap();
        let later = store
            .enqueue("multiply", Arguments::try_from(serde_json::json!({"x": 4, "y": 5})).unwrap())
            .await
            .unwrap();

        assert!(worker.process_next().await.unwrap());
        assert!(matches!(store.fetch("panicking", &panicking).await.unwrap(), JobView::Failed(_)));

        assert!(worker.process_next().await.unwrap());
        assert_eq!(JobView::Completed(serde_json::json!(20)), store.fetch("multiply", &later).await.unwrap());
    }
}
