// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # EDP CD Pipeline Operator
//!
//! A Kubernetes operator that reconciles the EDP `CDPipeline` and `Stage`
//! custom resources into the cluster state needed to promote container images
//! through an ordered sequence of environments.
//!
//! ## Overview
//!
//! For every `Stage` the operator:
//!
//! - Creates verified image streams for each application of the pipeline
//! - Provisions the target namespace (or Kiosk space) `{sourceNs}-{stage}`
//! - Binds RBAC for the CI tooling and the platform groups
//! - Registers the stage CI job with its rendered parameter map
//! - Labels image streams with the environments their builds have reached
//!
//! Deleting a stage reverses the labels and removes the target namespace.
//! Deleting a pipeline waits until its stages are gone.
//!
//! ## Modules
//!
//! - [`crd`] - `CDPipeline` and `Stage` resource types
//! - [`collaborators`] - Resource types owned by other EDP operators
//! - [`cluster`] - Cluster access trait and its `kube` implementation
//! - [`reconcilers`] - Stage and pipeline reconciliation, handler chains
//! - [`controller`] - Controller wiring and requeue policy
//! - [`platform`] - Environment probe and platform toggles
//!
//! ## Example
//!
//! ```rust,no_run
//! use edp_cd_pipeline_operator::crd::{StageSpec, TriggerType};
//!
//! let spec = StageSpec {
//!     name: "dev".to_string(),
//!     cd_pipeline: "mypipe".to_string(),
//!     description: String::new(),
//!     trigger_type: TriggerType::Auto,
//!     order: 0,
//!     quality_gates: Vec::new(),
//!     source: Default::default(),
//!     job_provisioning: "default".to_string(),
//! };
//! ```

pub mod cluster;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod crd;
pub mod errors;
pub mod health;
pub mod labels;
pub mod leader;
pub mod metrics;
pub mod naming;
pub mod platform;
pub mod quality_gates;
pub mod rbac;
pub mod reconcilers;
pub mod space;

#[cfg(test)]
pub(crate) mod testing;
