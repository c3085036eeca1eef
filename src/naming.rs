// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Stable names of the resources derived from a `Stage` or `CDPipeline`.
//!
//! These names are a contract with CI tooling and with previously provisioned
//! clusters; they must never change.

use crate::constants::{CD_PIPELINE_FOLDER_SUFFIX, JOB_PROVISIONING_PATH_PREFIX, VERIFIED_STREAM_SUFFIX};

/// Target namespace (or Kiosk space) of a stage: `{sourceNs}-{stage}`.
#[must_use]
pub fn target_namespace(source_namespace: &str, stage: &str) -> String {
    format!("{source_namespace}-{stage}")
}

/// Verified image stream of a codebase at a stage: `{pipeline}-{stage}-{codebase}-verified`.
#[must_use]
pub fn verified_stream_name(pipeline: &str, stage: &str, codebase: &str) -> String {
    format!("{pipeline}-{stage}-{codebase}-{VERIFIED_STREAM_SUFFIX}")
}

/// Image URL of verified streams: `{registry}/{sourceNs}`.
#[must_use]
pub fn verified_image_name(registry_url: &str, source_namespace: &str) -> String {
    format!("{registry_url}/{source_namespace}")
}

/// Environment label key put on image streams: `{pipeline}/{stage}`.
#[must_use]
pub fn environment_label(pipeline: &str, stage: &str) -> String {
    format!("{pipeline}/{stage}")
}

/// Jenkins folder of a pipeline: `{pipeline}-cd-pipeline`.
#[must_use]
pub fn cd_pipeline_folder(pipeline: &str) -> String {
    format!("{pipeline}-{CD_PIPELINE_FOLDER_SUFFIX}")
}

/// Job-provisioning job path: `job-provisions/job/cd/job/{profile}`.
#[must_use]
pub fn job_provisioning_path(profile: &str) -> String {
    format!("{JOB_PROVISIONING_PATH_PREFIX}/{profile}")
}

/// OpenShift view binding in a target namespace: `{sourceNs}-view`.
#[must_use]
pub fn view_binding_name(source_namespace: &str) -> String {
    format!("{source_namespace}-view")
}

/// Group bound to the view cluster role on OpenShift: `{sourceNs}-edp-view`.
#[must_use]
pub fn view_group(source_namespace: &str) -> String {
    format!("{source_namespace}-edp-view")
}

/// Platform groups granted admin in target namespaces on OpenShift.
#[must_use]
pub fn admin_groups(source_namespace: &str) -> [String; 2] {
    [
        format!("{source_namespace}-edp-super-admin"),
        format!("{source_namespace}-edp-admin"),
    ]
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod naming_tests;
