// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory cluster and fixtures shared by the unit tests.
//!
//! [`FakeCluster`] implements [`ClusterClient`] over plain maps and records
//! every mutating call, so tests can assert both the resulting cluster state
//! and the absence of writes.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::{Resource, ResourceExt};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cluster::{ClusterClient, CreateOutcome};
use crate::collaborators::{
    Codebase, CodebaseImageStream, CodebaseImageStreamSpec, CodebaseSpec, EDPComponent,
    EDPComponentSpec, GitServer, GitServerSpec, JenkinsFolder, JenkinsJob, Space,
};
use crate::constants::DOCKER_REGISTRY_COMPONENT;
use crate::context::Context;
use crate::crd::{
    CDPipeline, CDPipelineSpec, QualityGate, QualityGateType, Stage, StageSpec, TriggerType,
};
use crate::labels::{PIPELINE_NAME_LABEL, PREVIOUS_STAGE_NAME_ANNOTATION};
use crate::platform::{PlatformConfig, PlatformType};

type Key = (String, String);

fn deletion_time() -> Time {
    serde_json::from_value(serde_json::json!("2025-01-01T00:00:00Z")).expect("valid timestamp")
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

fn key_of<K: ResourceExt>(resource: &K) -> Key {
    key(&resource.namespace().unwrap_or_default(), &resource.name_any())
}

#[derive(Default)]
struct State {
    stages: BTreeMap<Key, Stage>,
    pipelines: BTreeMap<Key, CDPipeline>,
    image_streams: BTreeMap<Key, CodebaseImageStream>,
    edp_components: BTreeMap<Key, EDPComponent>,
    codebases: BTreeMap<Key, Codebase>,
    git_servers: BTreeMap<Key, GitServer>,
    jenkins_jobs: BTreeMap<Key, JenkinsJob>,
    jenkins_folders: BTreeMap<Key, JenkinsFolder>,
    jenkins_namespaces: BTreeSet<String>,
    namespaces: BTreeMap<String, Namespace>,
    spaces: BTreeMap<String, Space>,
    roles: BTreeMap<Key, Role>,
    role_bindings: BTreeMap<Key, RoleBinding>,
    writes: Vec<String>,
    fail_namespace_create: bool,
    fail_space_create: bool,
    status_subresource_unavailable: bool,
}

/// In-memory [`ClusterClient`].
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<State>,
}

impl FakeCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake cluster lock poisoned")
    }

    // Seeding

    pub fn insert_stage(&self, stage: Stage) {
        self.state().stages.insert(key_of(&stage), stage);
    }

    pub fn insert_pipeline(&self, pipeline: CDPipeline) {
        self.state().pipelines.insert(key_of(&pipeline), pipeline);
    }

    pub fn insert_image_stream(&self, stream: CodebaseImageStream) {
        self.state().image_streams.insert(key_of(&stream), stream);
    }

    pub fn insert_edp_component(&self, component: EDPComponent) {
        self.state()
            .edp_components
            .insert(key_of(&component), component);
    }

    pub fn insert_codebase(&self, codebase: Codebase) {
        self.state().codebases.insert(key_of(&codebase), codebase);
    }

    pub fn insert_git_server(&self, server: GitServer) {
        self.state().git_servers.insert(key_of(&server), server);
    }

    pub fn insert_jenkins_job(&self, job: JenkinsJob) {
        self.state().jenkins_jobs.insert(key_of(&job), job);
    }

    pub fn enable_jenkins(&self, namespace: &str) {
        self.state().jenkins_namespaces.insert(namespace.to_string());
    }

    pub fn insert_namespace(&self, name: &str) {
        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        self.state().namespaces.insert(name.to_string(), ns);
    }

    pub fn remove_stage(&self, namespace: &str, name: &str) {
        self.state().stages.remove(&key(namespace, name));
    }

    pub fn remove_image_stream(&self, namespace: &str, name: &str) {
        self.state().image_streams.remove(&key(namespace, name));
    }

    /// Mark a stage as deleted by the API server.
    pub fn mark_stage_deleted(&self, namespace: &str, name: &str) {
        if let Some(stage) = self.state().stages.get_mut(&key(namespace, name)) {
            stage.metadata.deletion_timestamp = Some(deletion_time());
        }
    }

    /// Mark a pipeline as deleted by the API server.
    pub fn mark_pipeline_deleted(&self, namespace: &str, name: &str) {
        if let Some(pipeline) = self.state().pipelines.get_mut(&key(namespace, name)) {
            pipeline.metadata.deletion_timestamp = Some(deletion_time());
        }
    }

    // Failure injection

    pub fn fail_namespace_create(&self) {
        self.state().fail_namespace_create = true;
    }

    pub fn fail_space_create(&self) {
        self.state().fail_space_create = true;
    }

    pub fn disable_status_subresource(&self) {
        self.state().status_subresource_unavailable = true;
    }

    // Inspection

    pub fn stage(&self, namespace: &str, name: &str) -> Option<Stage> {
        self.state().stages.get(&key(namespace, name)).cloned()
    }

    pub fn pipeline(&self, namespace: &str, name: &str) -> Option<CDPipeline> {
        self.state().pipelines.get(&key(namespace, name)).cloned()
    }

    pub fn image_stream(&self, namespace: &str, name: &str) -> Option<CodebaseImageStream> {
        self.state().image_streams.get(&key(namespace, name)).cloned()
    }

    pub fn jenkins_job(&self, namespace: &str, name: &str) -> Option<JenkinsJob> {
        self.state().jenkins_jobs.get(&key(namespace, name)).cloned()
    }

    pub fn jenkins_folder(&self, namespace: &str, name: &str) -> Option<JenkinsFolder> {
        self.state()
            .jenkins_folders
            .get(&key(namespace, name))
            .cloned()
    }

    pub fn namespace(&self, name: &str) -> Option<Namespace> {
        self.state().namespaces.get(name).cloned()
    }

    pub fn space(&self, name: &str) -> Option<Space> {
        self.state().spaces.get(name).cloned()
    }

    pub fn role(&self, namespace: &str, name: &str) -> Option<Role> {
        self.state().roles.get(&key(namespace, name)).cloned()
    }

    pub fn role_binding(&self, namespace: &str, name: &str) -> Option<RoleBinding> {
        self.state().role_bindings.get(&key(namespace, name)).cloned()
    }

    /// Mutating calls recorded so far, e.g. `create Namespace ci-dev`.
    pub fn writes(&self) -> Vec<String> {
        self.state().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state().writes.clear();
    }
}

fn create_in<K: Clone + ResourceExt>(
    map: &mut BTreeMap<Key, K>,
    writes: &mut Vec<String>,
    kind: &str,
    resource: &K,
) -> CreateOutcome {
    let resource_key = key_of(resource);
    if map.contains_key(&resource_key) {
        return CreateOutcome::AlreadyExists;
    }
    writes.push(format!("create {kind} {}/{}", resource_key.0, resource_key.1));
    map.insert(resource_key, resource.clone());
    CreateOutcome::Created
}

fn update_in<K: Clone + ResourceExt>(
    map: &mut BTreeMap<Key, K>,
    writes: &mut Vec<String>,
    kind: &str,
    resource: &K,
) -> Result<K> {
    let resource_key = key_of(resource);
    if !map.contains_key(&resource_key) {
        return Err(anyhow!("{kind} {}/{} not found", resource_key.0, resource_key.1));
    }
    writes.push(format!("update {kind} {}/{}", resource_key.0, resource_key.1));

    // An object marked for deletion disappears once its last finalizer is gone.
    let released = resource.meta().deletion_timestamp.is_some()
        && resource.finalizers().is_empty();
    if released {
        map.remove(&resource_key);
    } else {
        map.insert(resource_key, resource.clone());
    }
    Ok(resource.clone())
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get_stage(&self, namespace: &str, name: &str) -> Result<Option<Stage>> {
        Ok(self.stage(namespace, name))
    }

    async fn list_stages(&self, namespace: &str, pipeline: Option<&str>) -> Result<Vec<Stage>> {
        Ok(self
            .state()
            .stages
            .values()
            .filter(|s| s.namespace().as_deref() == Some(namespace))
            .filter(|s| {
                pipeline.is_none_or(|p| {
                    s.labels().get(PIPELINE_NAME_LABEL).map(String::as_str) == Some(p)
                })
            })
            .cloned()
            .collect())
    }

    async fn update_stage(&self, stage: &Stage) -> Result<Stage> {
        let mut state = self.state();
        let State { stages, writes, .. } = &mut *state;
        update_in(stages, writes, "Stage", stage)
    }

    async fn update_stage_status(&self, stage: &Stage) -> Result<Stage> {
        let mut state = self.state();
        if state.status_subresource_unavailable {
            return Err(anyhow!("the server could not find the requested resource"));
        }
        let stage_key = key_of(stage);
        state
            .writes
            .push(format!("status Stage {}/{}", stage_key.0, stage_key.1));
        let stored = state
            .stages
            .get_mut(&stage_key)
            .ok_or_else(|| anyhow!("Stage {}/{} not found", stage_key.0, stage_key.1))?;
        stored.status = stage.status.clone();
        Ok(stored.clone())
    }

    async fn get_pipeline(&self, namespace: &str, name: &str) -> Result<Option<CDPipeline>> {
        Ok(self.pipeline(namespace, name))
    }

    async fn update_pipeline(&self, pipeline: &CDPipeline) -> Result<CDPipeline> {
        let mut state = self.state();
        let State {
            pipelines, writes, ..
        } = &mut *state;
        update_in(pipelines, writes, "CDPipeline", pipeline)
    }

    async fn update_pipeline_status(&self, pipeline: &CDPipeline) -> Result<CDPipeline> {
        let mut state = self.state();
        if state.status_subresource_unavailable {
            return Err(anyhow!("the server could not find the requested resource"));
        }
        let pipeline_key = key_of(pipeline);
        state
            .writes
            .push(format!("status CDPipeline {}/{}", pipeline_key.0, pipeline_key.1));
        let stored = state.pipelines.get_mut(&pipeline_key).ok_or_else(|| {
            anyhow!("CDPipeline {}/{} not found", pipeline_key.0, pipeline_key.1)
        })?;
        stored.status = pipeline.status.clone();
        Ok(stored.clone())
    }

    async fn get_image_stream(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<CodebaseImageStream>> {
        Ok(self.image_stream(namespace, name))
    }

    async fn create_image_stream(&self, stream: &CodebaseImageStream) -> Result<CreateOutcome> {
        let mut state = self.state();
        let State {
            image_streams,
            writes,
            ..
        } = &mut *state;
        Ok(create_in(image_streams, writes, "CodebaseImageStream", stream))
    }

    async fn update_image_stream(
        &self,
        stream: &CodebaseImageStream,
    ) -> Result<CodebaseImageStream> {
        let mut state = self.state();
        let State {
            image_streams,
            writes,
            ..
        } = &mut *state;
        update_in(image_streams, writes, "CodebaseImageStream", stream)
    }

    async fn get_edp_component(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<EDPComponent>> {
        Ok(self
            .state()
            .edp_components
            .get(&key(namespace, name))
            .cloned())
    }

    async fn get_codebase(&self, namespace: &str, name: &str) -> Result<Option<Codebase>> {
        Ok(self.state().codebases.get(&key(namespace, name)).cloned())
    }

    async fn get_git_server(&self, namespace: &str, name: &str) -> Result<Option<GitServer>> {
        Ok(self.state().git_servers.get(&key(namespace, name)).cloned())
    }

    async fn get_jenkins_job(&self, namespace: &str, name: &str) -> Result<Option<JenkinsJob>> {
        Ok(self.jenkins_job(namespace, name))
    }

    async fn create_jenkins_job(&self, job: &JenkinsJob) -> Result<CreateOutcome> {
        let mut state = self.state();
        let State {
            jenkins_jobs,
            writes,
            ..
        } = &mut *state;
        Ok(create_in(jenkins_jobs, writes, "JenkinsJob", job))
    }

    async fn patch_jenkins_job_config(
        &self,
        namespace: &str,
        name: &str,
        config: &str,
    ) -> Result<()> {
        let mut state = self.state();
        state
            .writes
            .push(format!("patch JenkinsJob {namespace}/{name}"));
        let job = state
            .jenkins_jobs
            .get_mut(&key(namespace, name))
            .ok_or_else(|| anyhow!("JenkinsJob {namespace}/{name} not found"))?;
        job.spec.job.config = config.to_string();
        Ok(())
    }

    async fn create_jenkins_folder(&self, folder: &JenkinsFolder) -> Result<CreateOutcome> {
        let mut state = self.state();
        let State {
            jenkins_folders,
            writes,
            ..
        } = &mut *state;
        Ok(create_in(jenkins_folders, writes, "JenkinsFolder", folder))
    }

    async fn jenkins_enabled(&self, namespace: &str) -> Result<bool> {
        Ok(self.state().jenkins_namespaces.contains(namespace))
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        Ok(self.namespace(name))
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<CreateOutcome> {
        let mut state = self.state();
        if state.fail_namespace_create {
            return Err(anyhow!("namespaces is forbidden"));
        }
        let name = namespace.name_any();
        if state.namespaces.contains_key(&name) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.writes.push(format!("create Namespace {name}"));
        state.namespaces.insert(name, namespace.clone());
        Ok(CreateOutcome::Created)
    }

    async fn delete_namespace(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        if state.namespaces.remove(name).is_some() {
            state.writes.push(format!("delete Namespace {name}"));
        }
        Ok(())
    }

    async fn get_space(&self, name: &str) -> Result<Option<Space>> {
        Ok(self.space(name))
    }

    async fn create_space(&self, space: &Space) -> Result<CreateOutcome> {
        let mut state = self.state();
        if state.fail_space_create {
            return Err(anyhow!("spaces.tenancy.kiosk.sh is forbidden"));
        }
        let name = space.name_any();
        if state.spaces.contains_key(&name) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.writes.push(format!("create Space {name}"));
        state.spaces.insert(name, space.clone());
        Ok(CreateOutcome::Created)
    }

    async fn delete_space(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        if state.spaces.remove(name).is_some() {
            state.writes.push(format!("delete Space {name}"));
        }
        Ok(())
    }

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Option<Role>> {
        Ok(self.role(namespace, name))
    }

    async fn create_role(&self, role: &Role) -> Result<CreateOutcome> {
        let mut state = self.state();
        let State { roles, writes, .. } = &mut *state;
        Ok(create_in(roles, writes, "Role", role))
    }

    async fn get_role_binding(&self, namespace: &str, name: &str) -> Result<Option<RoleBinding>> {
        Ok(self.role_binding(namespace, name))
    }

    async fn create_role_binding(&self, binding: &RoleBinding) -> Result<CreateOutcome> {
        let mut state = self.state();
        let State {
            role_bindings,
            writes,
            ..
        } = &mut *state;
        Ok(create_in(role_bindings, writes, "RoleBinding", binding))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub const TEST_NAMESPACE: &str = "ci";
pub const TEST_PIPELINE: &str = "p";
pub const TEST_REGISTRY: &str = "reg/ns";

pub fn test_context(cluster: &Arc<FakeCluster>, platform: PlatformType, kiosk: bool) -> Context {
    let client: Arc<dyn ClusterClient> = cluster.clone();
    Context::new(
        client,
        PlatformConfig {
            platform,
            kiosk_enabled: kiosk,
        },
    )
}

pub fn test_pipeline(
    name: &str,
    namespace: &str,
    input_streams: &[&str],
    applications: &[&str],
    promote: &[&str],
) -> CDPipeline {
    let mut pipeline = CDPipeline::new(
        name,
        CDPipelineSpec {
            name: name.to_string(),
            deployment_type: "container".to_string(),
            input_docker_streams: input_streams.iter().map(|s| (*s).to_string()).collect(),
            applications: applications.iter().map(|s| (*s).to_string()).collect(),
            applications_to_promote: Some(promote.iter().map(|s| (*s).to_string()).collect()),
        },
    );
    pipeline.metadata.namespace = Some(namespace.to_string());
    pipeline.metadata.uid = Some(format!("uid-pipeline-{name}"));
    pipeline.metadata.generation = Some(1);
    pipeline
}

pub fn test_stage(name: &str, namespace: &str, pipeline: &str, order: u32) -> Stage {
    let mut stage = Stage::new(
        name,
        StageSpec {
            name: name.to_string(),
            cd_pipeline: pipeline.to_string(),
            description: String::new(),
            trigger_type: TriggerType::Auto,
            order,
            quality_gates: vec![QualityGate {
                quality_gate_type: QualityGateType::Manual,
                step_name: "m1".to_string(),
                autotest_name: None,
                branch_name: None,
            }],
            source: Default::default(),
            job_provisioning: "default".to_string(),
        },
    );
    stage.metadata.namespace = Some(namespace.to_string());
    stage.metadata.uid = Some(format!("uid-stage-{name}"));
    stage.metadata.generation = Some(1);
    stage
}

/// A stage carrying the previous-stage annotation.
pub fn test_promotion_stage(
    name: &str,
    namespace: &str,
    pipeline: &str,
    order: u32,
    previous: &str,
) -> Stage {
    let mut stage = test_stage(name, namespace, pipeline, order);
    stage
        .annotations_mut()
        .insert(PREVIOUS_STAGE_NAME_ANNOTATION.to_string(), previous.to_string());
    stage
}

pub fn test_image_stream(name: &str, namespace: &str, codebase: &str) -> CodebaseImageStream {
    let mut stream = CodebaseImageStream::new(
        name,
        CodebaseImageStreamSpec {
            codebase: codebase.to_string(),
            image_name: format!("registry/{codebase}"),
            tags: None,
        },
    );
    stream.metadata.namespace = Some(namespace.to_string());
    stream
}

pub fn test_registry(namespace: &str, url: &str) -> EDPComponent {
    let mut component = EDPComponent::new(
        DOCKER_REGISTRY_COMPONENT,
        EDPComponentSpec {
            component_type: "registry".to_string(),
            url: url.to_string(),
            icon: String::new(),
            visible: true,
        },
    );
    component.metadata.namespace = Some(namespace.to_string());
    component
}

pub fn test_codebase(name: &str, namespace: &str, strategy: &str, path: Option<&str>) -> Codebase {
    let mut codebase = Codebase::new(
        name,
        CodebaseSpec {
            git_server: "gerrit".to_string(),
            git_url_path: path.map(str::to_string),
            strategy: strategy.to_string(),
        },
    );
    codebase.metadata.namespace = Some(namespace.to_string());
    codebase
}

pub fn test_git_server(namespace: &str) -> GitServer {
    let mut server = GitServer::new(
        "gerrit",
        GitServerSpec {
            git_host: "gerrit.example.com".to_string(),
            git_user: "edp-ci".to_string(),
            ssh_port: 29418,
            name_ssh_key_secret: "gerrit-ciuser-sshkey".to_string(),
        },
    );
    server.metadata.namespace = Some(namespace.to_string());
    server
}

/// Seed a single-application pipeline: pipeline `p` in `ci` with one input
/// stream `img-a` of codebase `cb-a`, and the docker registry component.
pub fn seed_single_app_pipeline(cluster: &FakeCluster, promote: &[&str]) {
    cluster.insert_pipeline(test_pipeline(
        TEST_PIPELINE,
        TEST_NAMESPACE,
        &["img-a"],
        &["cb-a"],
        promote,
    ));
    cluster.insert_image_stream(test_image_stream("img-a", TEST_NAMESPACE, "cb-a"));
    cluster.insert_edp_component(test_registry(TEST_NAMESPACE, TEST_REGISTRY));
}
