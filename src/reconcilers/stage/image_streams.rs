// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Verified image streams of a stage.
//!
//! For every input stream of the parent pipeline the stage gets a verified
//! stream `{pipeline}-{stage}-{codebase}-verified` whose image points at the
//! docker registry folder of the source namespace. Verified streams carry the
//! pipeline label but no owner reference: the next stage's cleanup still reads
//! them after this stage is gone.

use anyhow::Result;
use async_trait::async_trait;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::chain::StageHandler;
use super::lookup::parent_pipeline;
use crate::cluster::ClusterClient;
use crate::collaborators::{CodebaseImageStream, CodebaseImageStreamSpec};
use crate::constants::DOCKER_REGISTRY_COMPONENT;
use crate::crd::Stage;
use crate::errors::StageError;
use crate::labels::{K8S_MANAGED_BY, MANAGED_BY_CD_PIPELINE_OPERATOR, PIPELINE_NAME_LABEL};
use crate::naming::{verified_image_name, verified_stream_name};

/// Build the verified stream `name` of `codebase` for `stage`.
#[must_use]
pub fn build_verified_stream(
    stage: &Stage,
    name: &str,
    codebase: &str,
    image_name: &str,
) -> CodebaseImageStream {
    let mut stream = CodebaseImageStream::new(
        name,
        CodebaseImageStreamSpec {
            codebase: codebase.to_string(),
            image_name: image_name.to_string(),
            tags: None,
        },
    );
    stream.metadata.namespace = stage.namespace();
    stream.metadata.labels = Some(BTreeMap::from([
        (
            PIPELINE_NAME_LABEL.to_string(),
            stage.spec.cd_pipeline.clone(),
        ),
        (
            K8S_MANAGED_BY.to_string(),
            MANAGED_BY_CD_PIPELINE_OPERATOR.to_string(),
        ),
    ]));
    stream
}

/// Creates the verified streams of a stage.
pub struct PutCodebaseImageStream {
    client: Arc<dyn ClusterClient>,
}

impl PutCodebaseImageStream {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }

    async fn registry_url(&self, namespace: &str) -> Result<String> {
        let component = self
            .client
            .get_edp_component(namespace, DOCKER_REGISTRY_COMPONENT)
            .await?
            .ok_or_else(|| StageError::DockerRegistryNotFound {
                namespace: namespace.to_string(),
                name: DOCKER_REGISTRY_COMPONENT.to_string(),
            })?;
        Ok(component.spec.url)
    }
}

#[async_trait]
impl StageHandler for PutCodebaseImageStream {
    fn name(&self) -> &'static str {
        "put_codebase_image_stream"
    }

    async fn serve(&self, stage: &Stage) -> Result<()> {
        let client = self.client.as_ref();
        let namespace = stage.namespace().unwrap_or_default();
        let pipeline = parent_pipeline(client, stage).await?;

        if pipeline.spec.input_docker_streams.is_empty() {
            return Err(StageError::EmptyInputStreams {
                pipeline: pipeline.name_any(),
            }
            .into());
        }

        let image_name = verified_image_name(&self.registry_url(&namespace).await?, &namespace);

        for input_name in &pipeline.spec.input_docker_streams {
            let input = client
                .get_image_stream(&namespace, input_name)
                .await?
                .ok_or_else(|| StageError::InputStreamNotFound {
                    namespace: namespace.clone(),
                    name: input_name.clone(),
                })?;

            let name = verified_stream_name(
                &stage.spec.cd_pipeline,
                &stage.spec.name,
                &input.spec.codebase,
            );
            if client.get_image_stream(&namespace, &name).await?.is_some() {
                debug!("Verified CodebaseImageStream {namespace}/{name} already exists");
                continue;
            }

            let stream = build_verified_stream(stage, &name, &input.spec.codebase, &image_name);
            client.create_image_stream(&stream).await?;
            info!(
                stage = %stage.spec.name,
                "Created verified CodebaseImageStream {namespace}/{name} with image {image_name}"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "image_streams_tests.rs"]
mod image_streams_tests;
