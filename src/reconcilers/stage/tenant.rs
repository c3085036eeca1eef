// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kiosk space of a stage when tenant spaces are on.

use anyhow::Result;
use async_trait::async_trait;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::info;

use super::chain::StageHandler;
use crate::cluster::{ClusterClient, CreateOutcome};
use crate::constants::ACTION_CREATE_SPACE;
use crate::crd::Stage;
use crate::naming::target_namespace;
use crate::reconcilers::status::record_stage_failure;
use crate::space::{delete_space, ensure_space};

/// Creates the space `{sourceNs}-{stage}` for the source namespace account.
pub struct PutTenant {
    client: Arc<dyn ClusterClient>,
}

impl PutTenant {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StageHandler for PutTenant {
    fn name(&self) -> &'static str {
        "put_tenant"
    }

    async fn serve(&self, stage: &Stage) -> Result<()> {
        let source = stage.namespace().unwrap_or_default();
        let target = target_namespace(&source, &stage.spec.name);

        match ensure_space(self.client.as_ref(), &target, &source).await {
            Ok(CreateOutcome::Created) => {
                info!("Created space {target} for account {source}");
                Ok(())
            }
            Ok(CreateOutcome::AlreadyExists) => Ok(()),
            Err(err) => {
                record_stage_failure(self.client.as_ref(), stage, ACTION_CREATE_SPACE, &err).await;
                Err(err.context(format!("failed to create space {target}")))
            }
        }
    }
}

/// Deletes the space of a stage.
pub struct DeleteSpace {
    client: Arc<dyn ClusterClient>,
}

impl DeleteSpace {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StageHandler for DeleteSpace {
    fn name(&self) -> &'static str {
        "delete_space"
    }

    async fn serve(&self, stage: &Stage) -> Result<()> {
        let target = target_namespace(&stage.namespace().unwrap_or_default(), &stage.spec.name);
        delete_space(self.client.as_ref(), &target).await?;
        info!(stage = %stage.spec.name, "Space {target} removed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tenant_tests.rs"]
mod tenant_tests;
