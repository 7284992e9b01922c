// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes implementation of [`ClusterAdapter`].

use super::{ClusterAdapter, ClusterError, LogLines};
use async_trait::async_trait;
use futures::{AsyncBufReadExt, StreamExt, TryStreamExt};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams, LogParams, PostParams};
use kube::Client;
use tokio::sync::mpsc;

/// Lines buffered between the log reader task and the consumer.
const LOG_BUFFER: usize = 256;

#[derive(Clone)]
pub struct KubeClusterAdapter {
    client: Client,
    namespace: String,
}

impl KubeClusterAdapter {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Connect using in-cluster config or the local kubeconfig.
    pub async fn connect(namespace: impl Into<String>) -> Result<Self, ClusterError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::Api(e.to_string()))?;
        Ok(Self::new(client, namespace))
    }

    fn jobs(&self) -> Api<Job> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

fn api_error(name: &str, e: kube::Error) -> ClusterError {
    match e {
        kube::Error::Api(resp) if resp.code == 404 => ClusterError::NotFound(name.to_string()),
        other => ClusterError::Api(other.to_string()),
    }
}

#[async_trait]
impl ClusterAdapter for KubeClusterAdapter {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn submit_job(&self, job: &Job) -> Result<Job, ClusterError> {
        let name = job.metadata.name.clone().unwrap_or_default();
        self.jobs()
            .create(&PostParams::default(), job)
            .await
            .map_err(|e| api_error(&name, e))
    }

    async fn get_job(&self, name: &str) -> Result<Option<Job>, ClusterError> {
        self.jobs()
            .get_opt(name)
            .await
            .map_err(|e| api_error(name, e))
    }

    async fn list_jobs(&self, selector: &str) -> Result<Vec<Job>, ClusterError> {
        let list = self
            .jobs()
            .list(&ListParams::default().labels(selector))
            .await
            .map_err(|e| api_error(selector, e))?;
        Ok(list.items)
    }

    async fn delete_job(&self, name: &str) -> Result<(), ClusterError> {
        self.jobs()
            .delete(name, &DeleteParams::background())
            .await
            .map_err(|e| api_error(name, e))?;
        Ok(())
    }

    async fn list_pods(&self, selector: &str) -> Result<Vec<Pod>, ClusterError> {
        let list = self
            .pods()
            .list(&ListParams::default().labels(selector))
            .await
            .map_err(|e| api_error(selector, e))?;
        Ok(list.items)
    }

    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, ClusterError> {
        self.pods()
            .get_opt(name)
            .await
            .map_err(|e| api_error(name, e))
    }

    async fn stream_logs(&self, pod: &str, container: &str) -> Result<LogLines, ClusterError> {
        let pods = self.pods();
        let pod = pod.to_string();
        let params = LogParams {
            container: Some(container.to_string()),
            follow: true,
            ..Default::default()
        };

        let (tx, rx) = mpsc::channel(LOG_BUFFER);
        tokio::spawn(async move {
            let reader = match pods.log_stream(&pod, &params).await {
                Ok(reader) => reader,
                Err(e) => {
                    let _ = tx.send(Err(api_error(&pod, e))).await;
                    return;
                }
            };
            let lines = reader
                .lines()
                .map_err(|e| ClusterError::Stream(e.to_string()));
            futures::pin_mut!(lines);
            while let Some(line) = lines.next().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        Ok(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed())
    }
}
