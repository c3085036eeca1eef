// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions owned by the CD pipeline operator.
//!
//! This module defines the two primary resources reconciled by the operator:
//!
//! - [`CDPipeline`] - Groups applications and their input image streams
//! - [`Stage`] - One environment in a pipeline's ordered promotion path
//!
//! Both resources live in the `v2.edp.epam.com/v1` API group and carry the
//! same status shape, reported through the status subresource.
//!
//! # Example: Pipeline with two stages
//!
//! ```yaml
//! apiVersion: v2.edp.epam.com/v1
//! kind: CDPipeline
//! metadata:
//!   name: mypipe
//!   namespace: edp
//! spec:
//!   name: mypipe
//!   deploymentType: container
//!   inputDockerStreams: [app-main]
//!   applications: [app]
//!   applicationsToPromote: [app]
//! ---
//! apiVersion: v2.edp.epam.com/v1
//! kind: Stage
//! metadata:
//!   name: mypipe-dev
//!   namespace: edp
//! spec:
//!   name: dev
//!   cdPipeline: mypipe
//!   order: 0
//!   triggerType: Auto
//!   jobProvisioning: default
//!   qualityGates:
//!     - qualityGateType: manual
//!       stepName: approve
//!   source:
//!     type: default
//! ```

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::labels::PREVIOUS_STAGE_NAME_ANNOTATION;

/// Default deployment type for pipelines that omit it.
fn default_deployment_type() -> String {
    "container".to_string()
}

/// `CDPipeline` groups a set of applications that share a promotion path.
///
/// The pipeline's `inputDockerStreams` name the per-application image streams
/// that feed the first stage. Stages reference the pipeline by name through
/// `spec.cdPipeline`.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "v2.edp.epam.com",
    version = "v1",
    kind = "CDPipeline",
    namespaced,
    shortname = "cdp",
    doc = "CDPipeline groups applications and the image streams they are delivered through across an ordered set of Stages."
)]
#[kube(status = "CDPipelineStatus")]
#[kube(printcolumn = r#"{"name":"Available","type":"boolean","jsonPath":".status.available"}"#)]
#[serde(rename_all = "camelCase")]
pub struct CDPipelineSpec {
    /// Logical pipeline name.
    pub name: String,

    /// Deployment kind handed to the CI job (for example `container`).
    #[serde(default = "default_deployment_type")]
    pub deployment_type: String,

    /// Ordered names of the input `CodebaseImageStream` resources.
    #[serde(default)]
    pub input_docker_streams: Vec<String>,

    /// Names of the applications (codebases) delivered by this pipeline.
    #[serde(default)]
    pub applications: Vec<String>,

    /// Subset of `applications` whose artifacts are promoted stage to stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications_to_promote: Option<Vec<String>>,
}

/// Observed state of a `CDPipeline`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CDPipelineStatus {
    #[serde(default)]
    pub available: bool,
    /// RFC3339 timestamp of the last status write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_time_updated: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_message: Option<String>,
    #[serde(default)]
    pub value: String,
    /// Last `metadata.generation` fully processed by the pipeline reconciler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl CDPipeline {
    /// Returns true when `codebase` is listed in `applicationsToPromote`.
    #[must_use]
    pub fn promotes(&self, codebase: &str) -> bool {
        self.spec
            .applications_to_promote
            .as_ref()
            .is_some_and(|apps| apps.iter().any(|app| app == codebase))
    }
}

/// How a stage is triggered once its predecessor succeeds.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum TriggerType {
    /// Deploy automatically when a new artifact reaches the stage.
    Auto,
    /// Wait for an explicit user action.
    #[default]
    Manual,
}

/// Kind of a quality gate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QualityGateType {
    Autotests,
    Manual,
}

/// A checkpoint the CI job enforces before the stage is considered passed.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QualityGate {
    pub quality_gate_type: QualityGateType,
    pub step_name: String,
    /// Autotest codebase name (autotests gates only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autotest_name: Option<String>,
    /// Autotest branch (autotests gates only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

/// Source of the deployment pipeline library.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Default,
    Library,
}

impl SourceType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Library => "library",
        }
    }
}

/// Library codebase reference used when `source.type` is `library`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub branch: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Source {
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<Library>,
}

/// `Stage` represents one environment in a pipeline's promotion path.
///
/// Stages of a pipeline are densely ordered starting at `0`. A stage with
/// `order > 0` promotes the verified artifacts of the stage right before it.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "v2.edp.epam.com",
    version = "v1",
    kind = "Stage",
    namespaced,
    doc = "Stage is one deployment environment in a CDPipeline's ordered promotion path."
)]
#[kube(status = "StageStatus")]
#[kube(printcolumn = r#"{"name":"Order","type":"integer","jsonPath":".spec.order"}"#)]
#[kube(printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#)]
#[serde(rename_all = "camelCase")]
pub struct StageSpec {
    /// Logical stage name, unique within the pipeline.
    pub name: String,

    /// Name of the parent `CDPipeline` in the same namespace.
    pub cd_pipeline: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub trigger_type: TriggerType,

    /// Position in the promotion path; `0` is the first stage.
    #[serde(default)]
    pub order: u32,

    #[serde(default)]
    pub quality_gates: Vec<QualityGate>,

    #[serde(default)]
    pub source: Source,

    /// Name of the CI job-provisioning profile.
    #[serde(default)]
    pub job_provisioning: String,
}

/// Observed state of a `Stage`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct StageStatus {
    #[serde(default)]
    pub available: bool,
    /// RFC3339 timestamp of the last status write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_time_updated: Option<String>,
    /// One of `initialized`, `in-progress`, `created`, `failed`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub action: String,
    /// `success` or `error`.
    #[serde(default)]
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_message: Option<String>,
    #[serde(default)]
    pub value: String,
}

impl Stage {
    /// A stage is first in its pipeline when its order is zero.
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.spec.order == 0
    }

    #[must_use]
    pub fn is_auto_deploy(&self) -> bool {
        self.spec.trigger_type == TriggerType::Auto
    }

    /// Name of the previous stage as recorded on the stage annotations.
    #[must_use]
    pub fn previous_stage_name(&self) -> Option<&str> {
        self.annotations()
            .get(PREVIOUS_STAGE_NAME_ANNOTATION)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}
