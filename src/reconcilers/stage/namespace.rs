// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Target namespace of a stage when tenant spaces are off.

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::chain::StageHandler;
use crate::cluster::ClusterClient;
use crate::constants::ACTION_CREATE_NAMESPACE;
use crate::crd::Stage;
use crate::labels::{K8S_MANAGED_BY, MANAGED_BY_CD_PIPELINE_OPERATOR, TENANT_LABEL};
use crate::naming::target_namespace;
use crate::reconcilers::status::record_stage_failure;

/// Build the target namespace `name` labelled with its source namespace.
#[must_use]
pub fn build_namespace(name: &str, source_namespace: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([
                (TENANT_LABEL.to_string(), source_namespace.to_string()),
                (
                    K8S_MANAGED_BY.to_string(),
                    MANAGED_BY_CD_PIPELINE_OPERATOR.to_string(),
                ),
            ])),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn stage_target(stage: &Stage) -> (String, String) {
    let source = stage.namespace().unwrap_or_default();
    let target = target_namespace(&source, &stage.spec.name);
    (source, target)
}

/// Creates `{sourceNs}-{stage}`.
pub struct PutNamespace {
    client: Arc<dyn ClusterClient>,
}

impl PutNamespace {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }

    async fn ensure(&self, source: &str, target: &str) -> Result<()> {
        if self.client.get_namespace(target).await?.is_some() {
            debug!("Namespace {target} already exists");
            return Ok(());
        }
        self.client
            .create_namespace(&build_namespace(target, source))
            .await?;
        info!("Created namespace {target} for source namespace {source}");
        Ok(())
    }
}

#[async_trait]
impl StageHandler for PutNamespace {
    fn name(&self) -> &'static str {
        "put_namespace"
    }

    async fn serve(&self, stage: &Stage) -> Result<()> {
        let (source, target) = stage_target(stage);
        if let Err(err) = self.ensure(&source, &target).await {
            record_stage_failure(self.client.as_ref(), stage, ACTION_CREATE_NAMESPACE, &err).await;
            return Err(err.context(format!("failed to create namespace {target}")));
        }
        Ok(())
    }
}

/// Deletes `{sourceNs}-{stage}`.
pub struct DeleteNamespace {
    client: Arc<dyn ClusterClient>,
}

impl DeleteNamespace {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StageHandler for DeleteNamespace {
    fn name(&self) -> &'static str {
        "delete_namespace"
    }

    async fn serve(&self, stage: &Stage) -> Result<()> {
        let (_, target) = stage_target(stage);
        self.client.delete_namespace(&target).await?;
        info!(stage = %stage.spec.name, "Namespace {target} removed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "namespace_tests.rs"]
mod namespace_tests;
