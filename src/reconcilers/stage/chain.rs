// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Linear handler chains run by the Stage reconciler.
//!
//! A chain is a list of [`StageHandler`]s where each node owns its successor.
//! The chain shape is fixed when it is built: trigger type, platform and tenant
//! mode select which handlers are linked, so handlers never branch on them.
//!
//! Create chain:
//!
//! ```text
//! PutCodebaseImageStream
//!   -> PutTenant | PutNamespace
//!   -> ConfigureRbac
//!   -> PutCIJob
//!   -> PutEnvironmentLabel            (Auto trigger only)
//! ```
//!
//! Delete chain:
//!
//! ```text
//! DeleteEnvironmentLabel
//!   -> DeleteSpace | DeleteNamespace
//! ```

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::cluster::ClusterClient;
use crate::crd::{Stage, TriggerType};
use crate::metrics;
use crate::platform::PlatformConfig;

use super::ci_job::PutCIJob;
use super::env_labels::{DeleteEnvironmentLabel, PutEnvironmentLabel};
use super::image_streams::PutCodebaseImageStream;
use super::namespace::{DeleteNamespace, PutNamespace};
use super::rbac::ConfigureRbac;
use super::tenant::{DeleteSpace, PutTenant};

/// One step of a chain.
#[async_trait]
pub trait StageHandler: Send + Sync {
    /// Stable name used in logs and the handler metric.
    fn name(&self) -> &'static str;

    async fn serve(&self, stage: &Stage) -> Result<()>;
}

/// A handler and the rest of the chain after it.
pub struct ChainNode {
    handler: Box<dyn StageHandler>,
    next: Option<Box<ChainNode>>,
}

impl ChainNode {
    /// Link `first` and `rest` in order.
    #[must_use]
    pub fn link(first: Box<dyn StageHandler>, rest: Vec<Box<dyn StageHandler>>) -> Self {
        let next = rest
            .into_iter()
            .rev()
            .fold(None, |next: Option<Box<ChainNode>>, handler| {
                Some(Box::new(ChainNode { handler, next }))
            });
        Self {
            handler: first,
            next,
        }
    }

    /// Run every handler in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing handler unchanged.
    pub async fn serve(&self, stage: &Stage) -> Result<()> {
        let mut node = Some(self);
        while let Some(current) = node {
            let name = current.handler.name();
            debug!(handler = name, stage = %stage.spec.name, "Running stage handler");
            let result = current.handler.serve(stage).await;
            metrics::record_handler(name, result.is_ok());
            result?;
            node = current.next.as_deref();
        }
        Ok(())
    }

    /// Handler names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut node = Some(self);
        while let Some(current) = node {
            names.push(current.handler.name());
            node = current.next.as_deref();
        }
        names
    }
}

/// Inputs deciding the chain shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainOptions {
    pub trigger_type: TriggerType,
    pub platform: PlatformConfig,
}

impl ChainOptions {
    #[must_use]
    pub fn for_stage(stage: &Stage, platform: PlatformConfig) -> Self {
        Self {
            trigger_type: stage.spec.trigger_type,
            platform,
        }
    }
}

/// Build the chain provisioning a stage.
#[must_use]
pub fn create_chain(client: &Arc<dyn ClusterClient>, options: ChainOptions) -> ChainNode {
    let target: Box<dyn StageHandler> = if options.platform.kiosk_enabled {
        Box::new(PutTenant::new(client.clone()))
    } else {
        Box::new(PutNamespace::new(client.clone()))
    };

    let mut rest: Vec<Box<dyn StageHandler>> = vec![
        target,
        Box::new(ConfigureRbac::new(client.clone(), options.platform.platform)),
        Box::new(PutCIJob::new(client.clone())),
    ];
    if options.trigger_type == TriggerType::Auto {
        rest.push(Box::new(PutEnvironmentLabel::new(client.clone())));
    }

    ChainNode::link(Box::new(PutCodebaseImageStream::new(client.clone())), rest)
}

/// Build the chain tearing a stage down.
#[must_use]
pub fn delete_chain(client: &Arc<dyn ClusterClient>, options: ChainOptions) -> ChainNode {
    let target: Box<dyn StageHandler> = if options.platform.kiosk_enabled {
        Box::new(DeleteSpace::new(client.clone()))
    } else {
        Box::new(DeleteNamespace::new(client.clone()))
    };
    ChainNode::link(
        Box::new(DeleteEnvironmentLabel::new(client.clone())),
        vec![target],
    )
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod chain_tests;
