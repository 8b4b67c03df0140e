// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use funcportal_api::job::{JobStoreAPI, JobWorkerAPI};

pub mod client;
pub mod demo;
pub mod handler;
pub mod ingress;
pub mod jobs;
pub mod outcome;
pub mod portal;
pub mod worker;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FuncPortalSettings {
    pub http_ingress_url: String,
    /// Number of workers executing asynchronous calls in this process.
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub extra_arguments: funcportal_api::ExtraArguments,
    #[serde(default)]
    pub job_store: JobStoreSettings,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobStoreSettings {
    #[default]
    Memory,
    Redis {
        url: String,
        #[serde(default = "default_namespace")]
        namespace: String,
    },
}

fn default_workers() -> usize {
    1
}

fn default_namespace() -> String {
    String::from("funcportal")
}

/// Both sides of a job store: the portal submits through `store`, workers pull from `queue`.
#[derive(Clone)]
pub struct JobStoreHandles {
    pub store: std::sync::Arc<dyn JobStoreAPI>,
    pub queue: std::sync::Arc<dyn JobWorkerAPI>,
}

pub fn create_job_store(settings: &JobStoreSettings) -> anyhow::Result<JobStoreHandles> {
    Ok(match settings {
        JobStoreSettings::Memory => {
            log::info!("Creating in-memory job store");
            let store = std::sync::Arc::new(jobs::memory::MemoryJobStore::new());
            JobStoreHandles {
                store: store.clone(),
                queue: store,
            }
        }
        JobStoreSettings::Redis { url, namespace } => {
            let store = std::sync::Arc::new(jobs::redis::RedisJobStore::new(url, namespace)?);
            JobStoreHandles {
                store: store.clone(),
                queue: store,
            }
        }
    })
}

/// Run the workers and, if `with_ingress` is set, the HTTP ingress of `portal`.
///
/// Returns only if the ingress stops.
pub async fn funcportal_node_main(
    settings: FuncPortalSettings,
    portal: portal::Portal,
    queue: std::sync::Arc<dyn JobWorkerAPI>,
    with_ingress: bool,
) -> anyhow::Result<()> {
    log::info!("Starting funcportal node");
    log::debug!("Settings: {:?}", settings);

    let functions = portal.async_functions();
    let mut worker_tasks = vec![];
    if functions.is_empty() {
        log::info!("No asynchronous routes: workers not started");
    } else {
        for _ in 0..settings.workers {
            worker_tasks.push(tokio::spawn(worker::Worker::new(queue.clone(), functions.clone()).run()));
        }
    }

    if with_ingress {
        let ingress = ingress::ingress_task(std::sync::Arc::new(portal), &settings.http_ingress_url).await?;
        let res = ingress.await?;
        for task in worker_tasks {
            task.abort();
        }
        res
    } else {
        if worker_tasks.is_empty() {
            anyhow::bail!("nothing to run: no workers configured");
        }
        let _ = futures::future::join_all(worker_tasks).await;
        Ok(())
    }
}

pub fn funcportal_node_default_conf() -> String {
    String::from(
        r##"http_ingress_url = "http://127.0.0.1:7035"
workers = 2
extra_arguments = "warn"

[job_store]
type = "memory"
# type = "redis"
# url = "redis://127.0.0.1:6379"
# namespace = "funcportal"
"##,
    )
}

pub fn create_template(path: &str, content: &str) -> anyhow::Result<()> {
    if path.is_empty() {
        anyhow::bail!("empty configuration file path");
    }
    match std::path::Path::new(&path).exists() {
        true => anyhow::bail!("cannot overwrite configuration file: {}", path),
        false => {
            std::fs::write(path, content)?;
            Ok(())
        }
    }
}
