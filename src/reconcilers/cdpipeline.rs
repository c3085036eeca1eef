// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `CDPipeline` reconciliation.
//!
//! A pipeline carries the `foregroundDeletion` and `ownedStages` finalizers.
//! While it is being deleted the reconciler holds `ownedStages` until no stage
//! labelled with the pipeline name remains, then leaves the pipeline to the
//! garbage collector. A live pipeline gets its CI folder (when a
//! Jenkins instance runs in the namespace) and a ready status recording the
//! processed generation.

use anyhow::Result;
use chrono::Utc;
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};
use std::time::Duration;
use tracing::{debug, info};

use crate::cluster::{ClusterClient, CreateOutcome};
use crate::collaborators::{JenkinsFolder, JenkinsFolderSpec};
use crate::constants::{KIND_CD_PIPELINE, OWNED_STAGES_REQUEUE_DURATION_SECS};
use crate::context::Context;
use crate::crd::CDPipeline;
use crate::labels::{FOREGROUND_DELETION_FINALIZER, OWNED_STAGES_FINALIZER};
use crate::metrics;
use crate::naming::cd_pipeline_folder;
use crate::reconcilers::finalizers::{ensure_finalizers, remove_finalizer};
use crate::reconcilers::should_reconcile;
use crate::reconcilers::status::{pipeline_ready_status, write_pipeline_status};

/// Build the CI folder of `pipeline`, owned by the pipeline.
#[must_use]
pub fn build_jenkins_folder(pipeline: &CDPipeline) -> JenkinsFolder {
    let mut folder = JenkinsFolder::new(
        &cd_pipeline_folder(&pipeline.name_any()),
        JenkinsFolderSpec::default(),
    );
    folder.metadata.namespace = pipeline.namespace();
    folder.metadata.owner_references = pipeline.controller_owner_ref(&()).map(|owner| vec![owner]);
    folder
}

async fn release_deleted_pipeline(
    client: &dyn ClusterClient,
    mut pipeline: CDPipeline,
) -> Result<Action> {
    let namespace = pipeline.namespace().unwrap_or_default();
    let name = pipeline.name_any();

    let stages = client.list_stages(&namespace, Some(&name)).await?;
    if !stages.is_empty() {
        info!(
            pipeline = %name,
            namespace = %namespace,
            "CDPipeline deletion waits for {} stage(s)",
            stages.len()
        );
        metrics::record_reconciliation_requeue(KIND_CD_PIPELINE, "owned_stages");
        return Ok(Action::requeue(Duration::from_secs(
            OWNED_STAGES_REQUEUE_DURATION_SECS,
        )));
    }

    // foregroundDeletion belongs to the garbage collector.
    if remove_finalizer(&mut pipeline, OWNED_STAGES_FINALIZER) {
        client.update_pipeline(&pipeline).await?;
        info!(pipeline = %name, namespace = %namespace, "CDPipeline released for deletion");
    }
    Ok(Action::await_change())
}

/// Reconcile a `CDPipeline`.
///
/// # Errors
///
/// Returns an error if a cluster call fails; the caller requeues.
pub async fn reconcile_cdpipeline(ctx: &Context, pipeline: &CDPipeline) -> Result<Action> {
    let client = ctx.client.as_ref();
    let namespace = pipeline.namespace().unwrap_or_default();
    let name = pipeline.name_any();

    let Some(mut pipeline) = client.get_pipeline(&namespace, &name).await? else {
        debug!("CDPipeline {namespace}/{name} no longer exists");
        return Ok(Action::await_change());
    };

    if pipeline.meta().deletion_timestamp.is_some() {
        return release_deleted_pipeline(client, pipeline).await;
    }

    if ensure_finalizers(
        &mut pipeline,
        &[FOREGROUND_DELETION_FINALIZER, OWNED_STAGES_FINALIZER],
    ) {
        pipeline = client.update_pipeline(&pipeline).await?;
    }

    let generation = pipeline.metadata.generation;
    let observed = pipeline
        .status
        .as_ref()
        .and_then(|status| status.observed_generation);
    if !should_reconcile(generation, observed) {
        debug!(pipeline = %name, "CDPipeline generation {generation:?} already processed");
        return Ok(Action::await_change());
    }

    if client.jenkins_enabled(&namespace).await? {
        let folder = build_jenkins_folder(&pipeline);
        if client.create_jenkins_folder(&folder).await? == CreateOutcome::Created {
            info!(pipeline = %name, "Created JenkinsFolder {namespace}/{}", folder.name_any());
        }
    }

    write_pipeline_status(client, &pipeline, pipeline_ready_status(generation, Utc::now())).await?;
    info!(pipeline = %name, namespace = %namespace, "CDPipeline initial structure ready");
    Ok(Action::await_change())
}

#[cfg(test)]
#[path = "cdpipeline_tests.rs"]
mod cdpipeline_tests;
