// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Stage` reconciliation.
//!
//! A reconcile runs these steps, each of which is a no-op when its effect is
//! already in place:
//!
//! 1. Re-fetch the stage; a stage that is gone needs nothing.
//! 2. A deleting stage runs the delete chain and releases `envLabelCleanup`.
//! 3. Wire the stage to its pipeline: controller owner reference,
//!    `pipeline-name` label and, for `order > 0`, the previous-stage annotation
//!    when the sibling with `order - 1` exists.
//! 4. Ensure the `foregroundDeletion` and `envLabelCleanup` finalizers.
//! 5. Require the previous-stage annotation on a promotion stage.
//! 6. Run the create chain and mark the stage registered.
//!
//! Steps 3 and 4 are persisted with a single update, before step 5 can fail.

pub mod chain;
pub mod ci_job;
pub mod env_labels;
pub mod image_streams;
pub mod lookup;
pub mod namespace;
pub mod rbac;
pub mod tenant;

use anyhow::Result;
use chrono::Utc;
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};
use tracing::{debug, info};

use crate::cluster::ClusterClient;
use crate::context::Context;
use crate::crd::{CDPipeline, Stage};
use crate::labels::{
    ENV_LABEL_CLEANUP_FINALIZER, FOREGROUND_DELETION_FINALIZER, PIPELINE_NAME_LABEL,
    PREVIOUS_STAGE_NAME_ANNOTATION,
};
use crate::reconcilers::finalizers::{ensure_finalizers, has_finalizer, remove_finalizer};
use crate::reconcilers::status::{is_registered, stage_registered_status, write_stage_status};

use chain::{create_chain, delete_chain, ChainOptions};
use lookup::{find_previous_stage, parent_pipeline, previous_stage_name};

fn has_pipeline_owner(stage: &Stage) -> bool {
    let kind = CDPipeline::kind(&());
    stage
        .owner_references()
        .iter()
        .any(|owner| owner.kind == kind)
}

/// Bring owner reference, pipeline label and previous-stage annotation in place.
///
/// Returns `true` when the stage was modified and needs to be persisted.
///
/// A missing previous sibling leaves the annotation unset.
///
/// # Errors
///
/// Returns [`crate::errors::StageError::PipelineNotFound`] when the owner reference is
/// missing and the pipeline does not exist.
pub async fn ensure_stage_metadata(client: &dyn ClusterClient, stage: &mut Stage) -> Result<bool> {
    let mut changed = false;

    if !has_pipeline_owner(stage) {
        let pipeline = parent_pipeline(client, stage).await?;
        if let Some(owner) = pipeline.controller_owner_ref(&()) {
            debug!(stage = %stage.name_any(), "Setting owner reference to CDPipeline {}", pipeline.name_any());
            stage.owner_references_mut().push(owner);
            changed = true;
        }
    }

    let pipeline_name = stage.spec.cd_pipeline.clone();
    if stage.labels().get(PIPELINE_NAME_LABEL) != Some(&pipeline_name) {
        stage
            .labels_mut()
            .insert(PIPELINE_NAME_LABEL.to_string(), pipeline_name);
        changed = true;
    }

    if !stage.is_first() && stage.previous_stage_name().is_none() {
        if let Some(previous) = find_previous_stage(client, stage).await? {
            debug!(stage = %stage.name_any(), "Previous stage is {}", previous.spec.name);
            stage.annotations_mut().insert(
                PREVIOUS_STAGE_NAME_ANNOTATION.to_string(),
                previous.spec.name.clone(),
            );
            changed = true;
        } else {
            debug!(
                stage = %stage.name_any(),
                "Previous stage of order {} not found yet",
                stage.spec.order - 1
            );
        }
    }

    Ok(changed)
}

/// Reconcile a `Stage`.
///
/// # Errors
///
/// Returns the first failing step's error; the caller requeues.
pub async fn reconcile_stage(ctx: &Context, stage: &Stage) -> Result<Action> {
    let client = ctx.client.as_ref();
    let namespace = stage.namespace().unwrap_or_default();
    let name = stage.name_any();

    let Some(mut stage) = client.get_stage(&namespace, &name).await? else {
        debug!("Stage {namespace}/{name} no longer exists");
        return Ok(Action::await_change());
    };

    let options = ChainOptions::for_stage(&stage, ctx.platform);

    if stage.is_deleting() {
        if !has_finalizer(&stage, ENV_LABEL_CLEANUP_FINALIZER) {
            debug!(stage = %name, "Stage cleanup already done");
            return Ok(Action::await_change());
        }
        info!(stage = %name, namespace = %namespace, "Stage is being deleted, running cleanup");
        delete_chain(&ctx.client, options).serve(&stage).await?;
        if remove_finalizer(&mut stage, ENV_LABEL_CLEANUP_FINALIZER) {
            client.update_stage(&stage).await?;
        }
        return Ok(Action::await_change());
    }

    let metadata_changed = ensure_stage_metadata(client, &mut stage).await?;
    let finalizers_changed = ensure_finalizers(
        &mut stage,
        &[FOREGROUND_DELETION_FINALIZER, ENV_LABEL_CLEANUP_FINALIZER],
    );
    if metadata_changed || finalizers_changed {
        stage = client.update_stage(&stage).await?;
    }

    if !stage.is_first() {
        previous_stage_name(&stage)?;
    }

    create_chain(&ctx.client, options).serve(&stage).await?;

    if is_registered(stage.status.as_ref()) {
        debug!(stage = %name, "Stage already registered");
    } else {
        write_stage_status(client, &stage, stage_registered_status(Utc::now())).await?;
        info!(stage = %name, namespace = %namespace, "Stage registered");
    }
    Ok(Action::await_change())
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod stage_tests;
