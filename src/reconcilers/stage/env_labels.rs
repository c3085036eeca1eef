// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Environment labels on image streams.
//!
//! A stage records that a codebase reached it with the label
//! `{pipeline}/{stage}=""`. For a first stage, or a codebase that is not
//! promoted, the label goes on the input stream. Otherwise it goes on the
//! verified stream of the previous stage, which is what the stage deploys.

use anyhow::Result;
use async_trait::async_trait;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::chain::StageHandler;
use super::lookup::{parent_pipeline, previous_stage_name};
use crate::cluster::ClusterClient;
use crate::collaborators::CodebaseImageStream;
use crate::crd::{CDPipeline, Stage};
use crate::errors::StageError;
use crate::naming::{environment_label, verified_stream_name};

fn stage_label(stage: &Stage) -> String {
    environment_label(&stage.spec.cd_pipeline, &stage.spec.name)
}

/// Verified stream of `codebase` at the stage before `stage`.
async fn previous_verified_stream(
    client: &dyn ClusterClient,
    stage: &Stage,
    codebase: &str,
) -> Result<CodebaseImageStream> {
    let namespace = stage.namespace().unwrap_or_default();
    let previous = previous_stage_name(stage)?;
    let name = verified_stream_name(&stage.spec.cd_pipeline, previous, codebase);
    client
        .get_image_stream(&namespace, &name)
        .await?
        .ok_or_else(|| StageError::VerifiedStreamNotFound { namespace, name }.into())
}

/// Add `label` to the stream; no write when it is already present.
async fn set_label(
    client: &dyn ClusterClient,
    mut stream: CodebaseImageStream,
    label: &str,
) -> Result<()> {
    if stream.labels().contains_key(label) {
        debug!("CodebaseImageStream {} already carries {label}", stream.name_any());
        return Ok(());
    }
    stream.labels_mut().insert(label.to_string(), String::new());
    client.update_image_stream(&stream).await?;
    info!("Set label {label} on CodebaseImageStream {}", stream.name_any());
    Ok(())
}

/// Remove `label` from the stream; no write when it is absent.
async fn remove_label(
    client: &dyn ClusterClient,
    mut stream: CodebaseImageStream,
    label: &str,
) -> Result<()> {
    if stream.labels_mut().remove(label).is_none() {
        return Ok(());
    }
    client.update_image_stream(&stream).await?;
    info!("Removed label {label} from CodebaseImageStream {}", stream.name_any());
    Ok(())
}

/// Labels the streams a stage deploys from.
pub struct PutEnvironmentLabel {
    client: Arc<dyn ClusterClient>,
}

impl PutEnvironmentLabel {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StageHandler for PutEnvironmentLabel {
    fn name(&self) -> &'static str {
        "put_environment_label"
    }

    async fn serve(&self, stage: &Stage) -> Result<()> {
        let client = self.client.as_ref();
        let namespace = stage.namespace().unwrap_or_default();
        let pipeline = parent_pipeline(client, stage).await?;
        let label = stage_label(stage);

        for input_name in &pipeline.spec.input_docker_streams {
            let input = client
                .get_image_stream(&namespace, input_name)
                .await?
                .ok_or_else(|| StageError::InputStreamNotFound {
                    namespace: namespace.clone(),
                    name: input_name.clone(),
                })?;

            let target = if stage.is_first() || !pipeline.promotes(&input.spec.codebase) {
                input
            } else {
                previous_verified_stream(client, stage, &input.spec.codebase).await?
            };
            set_label(client, target, &label).await?;
        }
        Ok(())
    }
}

/// Removes the labels added by [`PutEnvironmentLabel`].
pub struct DeleteEnvironmentLabel {
    client: Arc<dyn ClusterClient>,
}

impl DeleteEnvironmentLabel {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }

    async fn clean_stream(
        &self,
        stage: &Stage,
        pipeline: &CDPipeline,
        input: CodebaseImageStream,
        label: &str,
    ) -> Result<()> {
        let client = self.client.as_ref();
        if stage.is_first() {
            return remove_label(client, input, label).await;
        }

        let verified = previous_verified_stream(client, stage, &input.spec.codebase).await?;
        remove_label(client, verified, label).await?;
        if !pipeline.promotes(&input.spec.codebase) {
            remove_label(client, input, label).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StageHandler for DeleteEnvironmentLabel {
    fn name(&self) -> &'static str {
        "delete_environment_label"
    }

    async fn serve(&self, stage: &Stage) -> Result<()> {
        let client = self.client.as_ref();
        let namespace = stage.namespace().unwrap_or_default();
        let pipeline = match parent_pipeline(client, stage).await {
            Ok(pipeline) => pipeline,
            Err(e) if matches!(
                e.downcast_ref::<StageError>(),
                Some(StageError::PipelineNotFound { .. })
            ) =>
            {
                warn!(
                    stage = %stage.spec.name,
                    "Skipping environment label cleanup: {e:#}"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let label = stage_label(stage);

        for input_name in &pipeline.spec.input_docker_streams {
            let Some(input) = client.get_image_stream(&namespace, input_name).await? else {
                warn!("CodebaseImageStream {namespace}/{input_name} not found, nothing to clean");
                continue;
            };
            self.clean_stream(stage, &pipeline, input, &label).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "env_labels_tests.rs"]
mod env_labels_tests;
