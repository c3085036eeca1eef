// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Parent pipeline and previous stage resolution.

use anyhow::Result;
use kube::ResourceExt;

use crate::cluster::ClusterClient;
use crate::crd::{CDPipeline, Stage};
use crate::errors::StageError;

/// Fetch the `CDPipeline` named by `stage.spec.cdPipeline`.
///
/// # Errors
///
/// Returns [`StageError::PipelineNotFound`] when the pipeline does not exist,
/// or the cluster error of the lookup.
pub async fn parent_pipeline(client: &dyn ClusterClient, stage: &Stage) -> Result<CDPipeline> {
    let namespace = stage.namespace().unwrap_or_default();
    let name = &stage.spec.cd_pipeline;
    client
        .get_pipeline(&namespace, name)
        .await?
        .ok_or_else(|| {
            StageError::PipelineNotFound {
                namespace: namespace.clone(),
                name: name.clone(),
            }
            .into()
        })
}

/// Name of the stage right before `stage`, read from its annotation.
///
/// # Errors
///
/// Returns [`StageError::PreviousStageNotFound`] when the annotation is absent.
pub fn previous_stage_name(stage: &Stage) -> Result<&str> {
    stage.previous_stage_name().ok_or_else(|| {
        StageError::PreviousStageNotFound {
            stage: stage.spec.name.clone(),
            pipeline: stage.spec.cd_pipeline.clone(),
            order: stage.spec.order,
        }
        .into()
    })
}

/// Find the sibling stage of the same pipeline with `order - 1`.
///
/// Siblings are matched on `spec.cdPipeline` rather than on the pipeline label,
/// since a freshly created sibling may not carry the label yet. Returns `None`
/// for a first stage.
///
/// # Errors
///
/// Returns an error if listing stages fails.
pub async fn find_previous_stage(
    client: &dyn ClusterClient,
    stage: &Stage,
) -> Result<Option<Stage>> {
    let Some(previous_order) = stage.spec.order.checked_sub(1) else {
        return Ok(None);
    };
    let namespace = stage.namespace().unwrap_or_default();
    let siblings = client.list_stages(&namespace, None).await?;
    Ok(siblings.into_iter().find(|sibling| {
        sibling.spec.cd_pipeline == stage.spec.cd_pipeline && sibling.spec.order == previous_order
    }))
}

#[cfg(test)]
#[path = "lookup_tests.rs"]
mod lookup_tests;
