// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster access used by the reconcilers and stage handlers.
//!
//! Every read and write the operator performs goes through [`ClusterClient`].
//! The production implementation, [`KubeClusterClient`], talks to the API
//! server through [`kube::Client`]; unit tests substitute an in-memory cluster.
//!
//! Idempotency rules are part of the contract:
//!
//! - `get_*` returns `Ok(None)` when the object does not exist
//! - `create_*` reports an existing object as [`CreateOutcome::AlreadyExists`]
//! - `delete_*` treats a missing object as success
//! - `update_*` is a full object write carrying the object's `resourceVersion`

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};
use serde_json::json;

use crate::collaborators::{
    Codebase, CodebaseImageStream, EDPComponent, GitServer, Jenkins, JenkinsFolder, JenkinsJob,
    Space,
};
use crate::crd::{CDPipeline, Stage};
use crate::labels::PIPELINE_NAME_LABEL;
pub use crate::reconcilers::resources::CreateOutcome;
use crate::reconcilers::resources::{
    create_if_absent, delete_if_present, get_optional, merge_patch, patch_status,
    replace_resource,
};

/// Typed cluster operations consumed by the operator.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    // Stage

    async fn get_stage(&self, namespace: &str, name: &str) -> Result<Option<Stage>>;

    /// List stages in `namespace`; with `pipeline` set, only stages carrying the
    /// pipeline-name label for it.
    async fn list_stages(&self, namespace: &str, pipeline: Option<&str>) -> Result<Vec<Stage>>;

    async fn update_stage(&self, stage: &Stage) -> Result<Stage>;

    async fn update_stage_status(&self, stage: &Stage) -> Result<Stage>;

    // CDPipeline

    async fn get_pipeline(&self, namespace: &str, name: &str) -> Result<Option<CDPipeline>>;

    async fn update_pipeline(&self, pipeline: &CDPipeline) -> Result<CDPipeline>;

    async fn update_pipeline_status(&self, pipeline: &CDPipeline) -> Result<CDPipeline>;

    // CodebaseImageStream

    async fn get_image_stream(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<CodebaseImageStream>>;

    async fn create_image_stream(&self, stream: &CodebaseImageStream) -> Result<CreateOutcome>;

    async fn update_image_stream(
        &self,
        stream: &CodebaseImageStream,
    ) -> Result<CodebaseImageStream>;

    // Read-only collaborators

    async fn get_edp_component(&self, namespace: &str, name: &str)
        -> Result<Option<EDPComponent>>;

    async fn get_codebase(&self, namespace: &str, name: &str) -> Result<Option<Codebase>>;

    async fn get_git_server(&self, namespace: &str, name: &str) -> Result<Option<GitServer>>;

    // Jenkins

    async fn get_jenkins_job(&self, namespace: &str, name: &str) -> Result<Option<JenkinsJob>>;

    async fn create_jenkins_job(&self, job: &JenkinsJob) -> Result<CreateOutcome>;

    /// Replace only `spec.job.config` of an existing job.
    async fn patch_jenkins_job_config(
        &self,
        namespace: &str,
        name: &str,
        config: &str,
    ) -> Result<()>;

    async fn create_jenkins_folder(&self, folder: &JenkinsFolder) -> Result<CreateOutcome>;

    /// Jenkins mode is on when at least one `Jenkins` resource exists in `namespace`.
    async fn jenkins_enabled(&self, namespace: &str) -> Result<bool>;

    // Namespaces and Kiosk spaces

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>>;

    async fn create_namespace(&self, namespace: &Namespace) -> Result<CreateOutcome>;

    async fn delete_namespace(&self, name: &str) -> Result<()>;

    async fn get_space(&self, name: &str) -> Result<Option<Space>>;

    async fn create_space(&self, space: &Space) -> Result<CreateOutcome>;

    async fn delete_space(&self, name: &str) -> Result<()>;

    // RBAC

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Option<Role>>;

    async fn create_role(&self, role: &Role) -> Result<CreateOutcome>;

    async fn get_role_binding(&self, namespace: &str, name: &str) -> Result<Option<RoleBinding>>;

    async fn create_role_binding(&self, binding: &RoleBinding) -> Result<CreateOutcome>;
}

/// [`ClusterClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = kube::core::NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn namespaced_of<K>(&self, resource: &K) -> Api<K>
    where
        K: kube::Resource<Scope = kube::core::NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), &resource.namespace().unwrap_or_default())
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_stage(&self, namespace: &str, name: &str) -> Result<Option<Stage>> {
        get_optional(&self.namespaced::<Stage>(namespace), name).await
    }

    async fn list_stages(&self, namespace: &str, pipeline: Option<&str>) -> Result<Vec<Stage>> {
        let mut params = ListParams::default();
        if let Some(pipeline) = pipeline {
            params = params.labels(&format!("{PIPELINE_NAME_LABEL}={pipeline}"));
        }
        let stages = self.namespaced::<Stage>(namespace).list(&params).await?;
        Ok(stages.items)
    }

    async fn update_stage(&self, stage: &Stage) -> Result<Stage> {
        replace_resource(&self.namespaced_of(stage), stage).await
    }

    async fn update_stage_status(&self, stage: &Stage) -> Result<Stage> {
        patch_status(&self.namespaced_of(stage), &stage.name_any(), &stage.status).await
    }

    async fn get_pipeline(&self, namespace: &str, name: &str) -> Result<Option<CDPipeline>> {
        get_optional(&self.namespaced::<CDPipeline>(namespace), name).await
    }

    async fn update_pipeline(&self, pipeline: &CDPipeline) -> Result<CDPipeline> {
        replace_resource(&self.namespaced_of(pipeline), pipeline).await
    }

    async fn update_pipeline_status(&self, pipeline: &CDPipeline) -> Result<CDPipeline> {
        patch_status(
            &self.namespaced_of(pipeline),
            &pipeline.name_any(),
            &pipeline.status,
        )
        .await
    }

    async fn get_image_stream(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<CodebaseImageStream>> {
        get_optional(&self.namespaced::<CodebaseImageStream>(namespace), name).await
    }

    async fn create_image_stream(&self, stream: &CodebaseImageStream) -> Result<CreateOutcome> {
        create_if_absent(&self.namespaced_of(stream), stream).await
    }

    async fn update_image_stream(
        &self,
        stream: &CodebaseImageStream,
    ) -> Result<CodebaseImageStream> {
        replace_resource(&self.namespaced_of(stream), stream).await
    }

    async fn get_edp_component(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<EDPComponent>> {
        get_optional(&self.namespaced::<EDPComponent>(namespace), name).await
    }

    async fn get_codebase(&self, namespace: &str, name: &str) -> Result<Option<Codebase>> {
        get_optional(&self.namespaced::<Codebase>(namespace), name).await
    }

    async fn get_git_server(&self, namespace: &str, name: &str) -> Result<Option<GitServer>> {
        get_optional(&self.namespaced::<GitServer>(namespace), name).await
    }

    async fn get_jenkins_job(&self, namespace: &str, name: &str) -> Result<Option<JenkinsJob>> {
        get_optional(&self.namespaced::<JenkinsJob>(namespace), name).await
    }

    async fn create_jenkins_job(&self, job: &JenkinsJob) -> Result<CreateOutcome> {
        create_if_absent(&self.namespaced_of(job), job).await
    }

    async fn patch_jenkins_job_config(
        &self,
        namespace: &str,
        name: &str,
        config: &str,
    ) -> Result<()> {
        let patch = json!({ "spec": { "job": { "config": config } } });
        merge_patch(&self.namespaced::<JenkinsJob>(namespace), name, &patch).await?;
        Ok(())
    }

    async fn create_jenkins_folder(&self, folder: &JenkinsFolder) -> Result<CreateOutcome> {
        create_if_absent(&self.namespaced_of(folder), folder).await
    }

    async fn jenkins_enabled(&self, namespace: &str) -> Result<bool> {
        let jenkins = self
            .namespaced::<Jenkins>(namespace)
            .list(&ListParams::default().limit(1))
            .await?;
        Ok(!jenkins.items.is_empty())
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        get_optional(&Api::<Namespace>::all(self.client.clone()), name).await
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<CreateOutcome> {
        create_if_absent(&Api::all(self.client.clone()), namespace).await
    }

    async fn delete_namespace(&self, name: &str) -> Result<()> {
        delete_if_present(&Api::<Namespace>::all(self.client.clone()), name).await?;
        Ok(())
    }

    async fn get_space(&self, name: &str) -> Result<Option<Space>> {
        get_optional(&Api::<Space>::all(self.client.clone()), name).await
    }

    async fn create_space(&self, space: &Space) -> Result<CreateOutcome> {
        create_if_absent(&Api::all(self.client.clone()), space).await
    }

    async fn delete_space(&self, name: &str) -> Result<()> {
        delete_if_present(&Api::<Space>::all(self.client.clone()), name).await?;
        Ok(())
    }

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Option<Role>> {
        get_optional(&self.namespaced::<Role>(namespace), name).await
    }

    async fn create_role(&self, role: &Role) -> Result<CreateOutcome> {
        create_if_absent(&self.namespaced_of(role), role).await
    }

    async fn get_role_binding(&self, namespace: &str, name: &str) -> Result<Option<RoleBinding>> {
        get_optional(&self.namespaced::<RoleBinding>(namespace), name).await
    }

    async fn create_role_binding(&self, binding: &RoleBinding) -> Result<CreateOutcome> {
        create_if_absent(&self.namespaced_of(binding), binding).await
    }
}
