// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use funcportal_api::job::{JobResult, JobStoreAPI, JobView, JobWorkerAPI, QueuedJob, Token};
use funcportal_api::Arguments;
use redis::Commands;

/// Job store shared through a Redis server, so that workers can run in other processes.
///
/// The following keys are used, where NS is the configured namespace:
/// - NS:queue, a list of JSON-encoded jobs waiting for a worker
/// - NS:job:TOKEN, a hash with the `function` the job was queued for and
///   its JSON-encoded `state`
///
/// Records are never expired by the store.
#[derive(Clone)]
pub struct RedisJobStore {
    client: redis::Client,
    namespace: String,
    block_timeout: f64,
}

const FIELD_FUNCTION: &str = "function";
const FIELD_STATE: &str = "state";

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum JobRecord {
    Pending,
    Completed { result: serde_json::Value },
    Failed { reason: String },
}

impl From<JobRecord> for JobView {
    fn from(record: JobRecord) -> Self {
        match record {
            JobRecord::Pending => JobView::Pending,
            JobRecord::Completed { result } => JobView::Completed(result),
            JobRecord::Failed { reason } => JobView::Failed(reason),
        }
    }
}

impl From<JobResult> for JobRecord {
    fn from(result: JobResult) -> Self {
        match result {
            JobResult::Completed(result) => JobRecord::Completed { result },
            JobResult::Failed(reason) => JobRecord::Failed { reason },
        }
    }
}

impl RedisJobStore {
    pub fn new(redis_url: &str, namespace: &str) -> anyhow::Result<Self> {
        log::info!("creating Redis job store at URL {} with namespace {}", redis_url, namespace);
        Ok(Self {
            client: redis::Client::open(redis_url)?,
            namespace: namespace.to_string(),
            block_timeout: 1.0,
        })
    }

    fn queue_key(&self) -> String {
        format!("{}:queue", self.namespace)
    }

    fn job_key(&self, token: &Token) -> String {
        format!("{}:job:{}", self.namespace, token)
    }

    /// Run a blocking Redis operation off the async executor.
    async fn with_connection<F, R>(&self, operation: F) -> anyhow::Result<R>
    where
        F: FnOnce(&mut redis::Connection) -> anyhow::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = client.get_connection()?;
            operation(&mut connection)
        })
        .await?
    }
}

#[async_trait::async_trait]
impl JobStoreAPI for RedisJobStore {
    async fn enqueue(&self, function: &str, arguments: Arguments) -> anyhow::Result<Token> {
        let token = Token::new();
        let record = serde_json::to_string(&JobRecord::Pending)?;
        let job = serde_json::to_string(&QueuedJob {
            token: token.clone(),
            function: function.to_string(),
            arguments,
        })?;
        let job_key = self.job_key(&token);
        let queue_key = self.queue_key();
        let fields = [(FIELD_FUNCTION, function.to_string()), (FIELD_STATE, record)];

        self.with_connection(move |connection| {
            redis::pipe()
                .atomic()
                .hset_multiple(&job_key, &fields)
                .ignore()
                .lpush(&queue_key, job)
                .ignore()
                .query::<()>(connection)?;
            Ok(())
        })
        .await?;
        Ok(token)
    }

    async fn fetch(&self, function: &str, token: &Token) -> anyhow::Result<JobView> {
        let job_key = self.job_key(token);
        let (queued_for, record) = self
            .with_connection(move |connection| {
                Ok(redis::cmd("HMGET")
                    .arg(&job_key)
                    .arg(FIELD_FUNCTION)
                    .arg(FIELD_STATE)
                    .query::<(Option<String>, Option<String>)>(connection)?)
            })
            .await?;
        match (queued_for, record) {
            (Some(queued_for), Some(record)) if queued_for == function => Ok(JobView::from(serde_json::from_str::<JobRecord>(&record)?)),
            _ => Ok(JobView::Absent),
        }
    }
}

#[async_trait::async_trait]
impl JobWorkerAPI for RedisJobStore {
    async fn next_job(&self) -> anyhow::Result<Option<QueuedJob>> {
        let queue_key = self.queue_key();
        let block_timeout = self.block_timeout;
        let popped = self
            .with_connection(move |connection| Ok(connection.brpop::<&str, Option<(String, String)>>(&queue_key, block_timeout)?))
            .await?;
        match popped {
            Some((_, job)) => Ok(Some(serde_json::from_str::<QueuedJob>(&job)?)),
            None => Ok(None),
        }
    }

    async fn complete(&self, token: &Token, result: JobResult) -> anyhow::Result<()> {
        let job_key = self.job_key(token);
        let record = serde_json::to_string(&JobRecord::from(result))?;
        self.with_connection(move |connection| {
            connection.hset::<&str, &str, String, ()>(&job_key, FIELD_STATE, record)?;
            Ok(())
        })
        .await
    }
}
