// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CI job registration of a stage.
//!
//! Every stage owns a `JenkinsJob` of the same name whose `spec.job.config`
//! carries the parameter map consumed by the CI job template:
//!
//! ```json
//! {"PIPELINE_NAME":"p","STAGE_NAME":"dev","QG_STAGES":"{\"name\":\"manual\",\"step_name\":\"m1\"}",
//!  "GIT_SERVER_CR_VERSION":"v2","SOURCE_TYPE":"default","AUTODEPLOY":"true",
//!  "DEPLOYMENT_TYPE":"container"}
//! ```
//!
//! Library-sourced stages add `LIBRARY_URL`, `LIBRARY_BRANCH`,
//! `GIT_CREDENTIALS_ID` and `GIT_SERVER_CR_NAME`. When the library codebase or
//! its git server cannot be resolved the stage falls back to the default
//! source.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use kube::{Resource, ResourceExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::chain::StageHandler;
use super::lookup::parent_pipeline;
use crate::cluster::ClusterClient;
use crate::collaborators::{Job, JenkinsJob, JenkinsJobSpec, JenkinsJobStatus};
use crate::constants::{
    ACTION_ACCEPT_JENKINS_JOB, CODEBASE_STRATEGY_IMPORT, GIT_SERVER_CR_VERSION,
    JENKINS_JOB_AUTO_TRIGGER_PERIOD,
};
use crate::crd::{CDPipeline, Library, SourceType, Stage};
use crate::naming::job_provisioning_path;
use crate::quality_gates::{encode_quality_gates, to_html_safe_json};

/// Parameter map of a stage CI job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct JobParameters {
    pub pipeline_name: String,
    pub stage_name: String,
    pub qg_stages: String,
    pub git_server_cr_version: String,
    pub source_type: String,
    pub autodeploy: String,
    pub deployment_type: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryParameters>,
}

/// Library parameters of a library-sourced stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LibraryParameters {
    pub library_url: String,
    pub library_branch: String,
    pub git_credentials_id: String,
    pub git_server_cr_name: String,
}

/// Resolve the clone URL and credentials of a library codebase.
///
/// # Errors
///
/// Returns an error when the codebase or its git server is missing, or an
/// imported codebase has no repository path.
pub async fn library_parameters(
    client: &dyn ClusterClient,
    namespace: &str,
    library: &Library,
) -> Result<LibraryParameters> {
    let codebase = client
        .get_codebase(namespace, &library.name)
        .await?
        .ok_or_else(|| anyhow!("Codebase {namespace}/{} not found", library.name))?;
    let server_name = &codebase.spec.git_server;
    let server = client
        .get_git_server(namespace, server_name)
        .await?
        .ok_or_else(|| anyhow!("GitServer {namespace}/{server_name} not found"))?;

    let path = if codebase.spec.strategy == CODEBASE_STRATEGY_IMPORT {
        codebase
            .spec
            .git_url_path
            .clone()
            .ok_or_else(|| anyhow!("imported Codebase {} has no gitUrlPath", library.name))?
    } else {
        format!("/{}", library.name)
    };

    Ok(LibraryParameters {
        library_url: format!(
            "ssh://{}@{}:{}{}",
            server.spec.git_user, server.spec.git_host, server.spec.ssh_port, path
        ),
        library_branch: library.branch.clone(),
        git_credentials_id: server.spec.name_ssh_key_secret.clone(),
        git_server_cr_name: server.name_any(),
    })
}

/// Render the parameter map of `stage` as JSON.
///
/// # Errors
///
/// Returns an error if a cluster lookup other than the library resolution
/// fails or the map cannot be serialized.
pub async fn render_job_config(
    client: &dyn ClusterClient,
    stage: &Stage,
    pipeline: &CDPipeline,
) -> Result<String> {
    let namespace = stage.namespace().unwrap_or_default();

    let library = match (stage.spec.source.source_type, &stage.spec.source.library) {
        (SourceType::Library, Some(library)) => {
            match library_parameters(client, &namespace, library).await {
                Ok(parameters) => Some(parameters),
                Err(e) => {
                    warn!(
                        stage = %stage.spec.name,
                        "Library {} not resolvable, using default source: {e:#}",
                        library.name
                    );
                    None
                }
            }
        }
        (SourceType::Library, None) => {
            warn!(stage = %stage.spec.name, "Library source without library reference, using default source");
            None
        }
        (SourceType::Default, _) => None,
    };

    let source_type = if library.is_some() {
        SourceType::Library
    } else {
        SourceType::Default
    };

    let parameters = JobParameters {
        pipeline_name: stage.spec.cd_pipeline.clone(),
        stage_name: stage.spec.name.clone(),
        qg_stages: encode_quality_gates(&stage.spec.quality_gates)?,
        git_server_cr_version: GIT_SERVER_CR_VERSION.to_string(),
        source_type: source_type.as_str().to_string(),
        autodeploy: stage.is_auto_deploy().to_string(),
        deployment_type: pipeline.spec.deployment_type.clone(),
        library,
    };
    to_html_safe_json(&parameters)
}

/// Build the CI job of `stage` carrying `config`.
#[must_use]
pub fn build_jenkins_job(stage: &Stage, config: &str) -> JenkinsJob {
    let mut job = JenkinsJob::new(
        &stage.name_any(),
        JenkinsJobSpec {
            owner_name: None,
            stage_name: stage.name_any(),
            jenkins_folder: stage.spec.cd_pipeline.clone(),
            job: Job {
                name: job_provisioning_path(&stage.spec.job_provisioning),
                config: config.to_string(),
                auto_trigger_period: JENKINS_JOB_AUTO_TRIGGER_PERIOD,
            },
        },
    );
    job.metadata.namespace = stage.namespace();
    job.metadata.owner_references = stage.controller_owner_ref(&()).map(|owner| vec![owner]);
    job.status = Some(JenkinsJobStatus {
        action: ACTION_ACCEPT_JENKINS_JOB.to_string(),
        ..Default::default()
    });
    job
}

/// Creates the stage CI job or refreshes its parameter map.
pub struct PutCIJob {
    client: Arc<dyn ClusterClient>,
}

impl PutCIJob {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StageHandler for PutCIJob {
    fn name(&self) -> &'static str {
        "put_ci_job"
    }

    async fn serve(&self, stage: &Stage) -> Result<()> {
        let client = self.client.as_ref();
        let namespace = stage.namespace().unwrap_or_default();
        let name = stage.name_any();
        let pipeline = parent_pipeline(client, stage).await?;
        let config = render_job_config(client, stage, &pipeline).await?;

        match client.get_jenkins_job(&namespace, &name).await? {
            Some(existing) if existing.spec.job.config == config => {
                debug!("JenkinsJob {namespace}/{name} is up to date");
            }
            Some(_) => {
                client
                    .patch_jenkins_job_config(&namespace, &name, &config)
                    .await?;
                info!("Updated config of JenkinsJob {namespace}/{name}");
            }
            None => {
                client
                    .create_jenkins_job(&build_jenkins_job(stage, &config))
                    .await?;
                info!("Created JenkinsJob {namespace}/{name}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "ci_job_tests.rs"]
mod ci_job_tests;
