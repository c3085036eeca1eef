// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom resources owned by other EDP operators.
//!
//! The CD pipeline operator reads and writes these kinds but does not own their
//! schema. Only the fields the operator consumes are modelled; unknown fields are
//! ignored on read.
//!
//! | Kind | Group/Version | Used for |
//! |------|---------------|----------|
//! | `CodebaseImageStream` | `v2.edp.epam.com/v1` | input and verified image streams |
//! | `EDPComponent` | `v1.edp.epam.com/v1alpha1` | docker registry URL lookup |
//! | `Codebase` | `v2.edp.epam.com/v1` | library source for CI jobs |
//! | `GitServer` | `v2.edp.epam.com/v1` | library clone URL and credentials |
//! | `JenkinsJob` | `v2.edp.epam.com/v1` | per-stage CI job |
//! | `JenkinsFolder` | `v2.edp.epam.com/v1` | per-pipeline CI folder |
//! | `Jenkins` | `v2.edp.epam.com/v1` | detects Jenkins mode in a namespace |
//! | `Space` | `tenancy.kiosk.sh/v1alpha1` | Kiosk tenant space (cluster-scoped) |

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A tag pushed to a `CodebaseImageStream`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub created: String,
}

/// Image stream of a single codebase.
///
/// Environment labels of the form `{pipeline}/{stage}` are added to these
/// resources to record which environments an artifact has reached.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "v2.edp.epam.com",
    version = "v1",
    kind = "CodebaseImageStream",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CodebaseImageStreamSpec {
    /// Name of the codebase the stream belongs to.
    pub codebase: String,
    /// Image repository URL.
    pub image_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

/// Platform component registry entry (docker registry, CI console, ...).
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "v1.edp.epam.com",
    version = "v1alpha1",
    kind = "EDPComponent",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct EDPComponentSpec {
    #[serde(rename = "type", default)]
    pub component_type: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub visible: bool,
}

#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(group = "v2.edp.epam.com", version = "v1", kind = "Codebase", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct CodebaseSpec {
    /// Name of the `GitServer` hosting the repository.
    pub git_server: String,
    /// Repository path on the git server, set for imported codebases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_url_path: Option<String>,
    /// Onboarding strategy: `create`, `clone` or `import`.
    #[serde(default)]
    pub strategy: String,
}

#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(group = "v2.edp.epam.com", version = "v1", kind = "GitServer", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct GitServerSpec {
    pub git_host: String,
    pub git_user: String,
    pub ssh_port: i32,
    /// Secret holding the SSH key; doubles as the CI credentials id.
    pub name_ssh_key_secret: String,
}

/// Job definition embedded in a `JenkinsJob`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    /// Rendered JSON parameter map.
    pub config: String,
    #[serde(default)]
    pub auto_trigger_period: i32,
}

#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "v2.edp.epam.com",
    version = "v1",
    kind = "JenkinsJob",
    namespaced
)]
#[kube(status = "JenkinsJobStatus")]
#[serde(rename_all = "camelCase")]
pub struct JenkinsJobSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    pub stage_name: String,
    pub jenkins_folder: String,
    pub job: Job,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsJobStatus {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_time_updated: Option<String>,
}

#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "v2.edp.epam.com",
    version = "v1",
    kind = "JenkinsFolder",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsFolderSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codebase_name: Option<String>,
}

/// Jenkins instance; only its presence in a namespace is inspected.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(group = "v2.edp.epam.com", version = "v1", kind = "Jenkins", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

/// Kiosk tenant space. Cluster-scoped; backs a namespace of the same name.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(group = "tenancy.kiosk.sh", version = "v1alpha1", kind = "Space")]
#[serde(rename_all = "camelCase")]
pub struct SpaceSpec {
    /// Kiosk account owning the space.
    pub account: String,
}
