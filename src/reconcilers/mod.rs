// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for the CD pipeline custom resources.
//!
//! Each reconciler re-reads its object, compares the desired state with what
//! the cluster holds and writes only the difference:
//!
//! 1. **Watch** - The controller delivers `Stage` and `CDPipeline` events
//! 2. **Reconcile** - Finalizers, owned resources and handler chains run
//! 3. **Status** - The outcome is reported back on the status subresource
//!
//! # Available Reconcilers
//!
//! - [`reconcile_stage`] - Provisions a stage environment or tears it down
//! - [`reconcile_cdpipeline`] - Creates the pipeline CI folder and gates pipeline deletion
//!
//! # Example
//!
//! ```rust,no_run
//! use edp_cd_pipeline_operator::cluster::KubeClusterClient;
//! use edp_cd_pipeline_operator::context::Context;
//! use edp_cd_pipeline_operator::crd::Stage;
//! use edp_cd_pipeline_operator::platform::PlatformConfig;
//! use edp_cd_pipeline_operator::reconcilers::reconcile_stage;
//! use std::sync::Arc;
//!
//! async fn handle(stage: Stage) -> anyhow::Result<()> {
//!     let client = kube::Client::try_default().await?;
//!     let ctx = Context::new(Arc::new(KubeClusterClient::new(client)), PlatformConfig::default());
//!     reconcile_stage(&ctx, &stage).await?;
//!     Ok(())
//! }
//! ```

pub mod cdpipeline;
pub mod finalizers;
pub mod resources;
pub mod stage;
pub mod status;

pub use cdpipeline::reconcile_cdpipeline;
pub use stage::reconcile_stage;

/// Check if a resource's spec has changed by comparing generation with `observed_generation`.
///
/// The `metadata.generation` field is incremented by Kubernetes only when the spec changes,
/// while `status.observed_generation` is set by the controller after processing a spec.
///
/// # Returns
///
/// * `true` - Reconciliation is needed (spec changed or first reconciliation)
/// * `false` - No reconciliation needed (spec unchanged, status-only update)
///
/// # Kubernetes Generation Semantics
///
/// - When they match: spec hasn't changed since last reconciliation, skip work
/// - When they differ: spec has changed, reconcile
/// - When `observed_generation` is None: first reconciliation, reconcile
#[must_use]
pub fn should_reconcile(current_generation: Option<i64>, observed_generation: Option<i64>) -> bool {
    match (current_generation, observed_generation) {
        (Some(current), Some(observed)) => current != observed,
        (Some(_), None) => true, // First reconciliation
        _ => false,              // No generation tracking available
    }
}
