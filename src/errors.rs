// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed errors surfaced by the Stage and `CDPipeline` reconcilers.
//!
//! Handlers propagate failures as [`anyhow::Error`]. When the caller needs to
//! tell a missing precondition apart from a cluster failure, the handler raises
//! a [`StageError`] which the controller recovers with
//! [`anyhow::Error::downcast_ref`] to choose a requeue delay.

use thiserror::Error;

/// Errors raised while reconciling a `Stage` or `CDPipeline`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// Parent pipeline not found
    ///
    /// The stage references a `CDPipeline` that does not exist (yet) in its
    /// namespace. Retried with a short backoff.
    #[error("CDPipeline '{name}' not found in namespace {namespace}")]
    PipelineNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Name of the missing pipeline
        name: String,
    },

    /// Verified stream of the previous stage not found
    ///
    /// Promotion stages label the previous stage's verified stream. The stream
    /// is created by the previous stage's reconcile, so this usually resolves
    /// once that stage catches up.
    #[error("verified CodebaseImageStream '{name}' not found in namespace {namespace}")]
    VerifiedStreamNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Name of the missing verified stream
        name: String,
    },

    /// The stage has `order > 0` but no previous stage could be resolved
    #[error("previous stage of '{stage}' (order {order}) not found for pipeline {pipeline}")]
    PreviousStageNotFound {
        /// Name of the stage being reconciled
        stage: String,
        /// Parent pipeline name
        pipeline: String,
        /// Order of the stage being reconciled
        order: u32,
    },

    /// The pipeline declares no input image streams
    #[error("CDPipeline '{pipeline}' has no input docker streams")]
    EmptyInputStreams {
        /// Name of the misconfigured pipeline
        pipeline: String,
    },

    /// The docker registry `EDPComponent` is missing
    #[error("EDPComponent '{name}' not found in namespace {namespace}")]
    DockerRegistryNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Name of the missing component
        name: String,
    },

    /// A referenced input image stream is missing
    #[error("CodebaseImageStream '{name}' not found in namespace {namespace}")]
    InputStreamNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Name of the missing stream
        name: String,
    },
}

impl StageError {
    /// Returns true when the error reports a missing precondition that is
    /// expected to appear on its own (parent pipeline, previous stage output).
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        match self {
            Self::PipelineNotFound { .. }
            | Self::VerifiedStreamNotFound { .. }
            | Self::PreviousStageNotFound { .. } => true,

            Self::EmptyInputStreams { .. }
            | Self::DockerRegistryNotFound { .. }
            | Self::InputStreamNotFound { .. } => false,
        }
    }

    /// Stable label used for the `error_type` metric dimension.
    #[must_use]
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::PipelineNotFound { .. } => "pipeline_not_found",
            Self::VerifiedStreamNotFound { .. } => "verified_stream_not_found",
            Self::PreviousStageNotFound { .. } => "previous_stage_not_found",
            Self::EmptyInputStreams { .. } => "empty_input_streams",
            Self::DockerRegistryNotFound { .. } => "docker_registry_not_found",
            Self::InputStreamNotFound { .. } => "input_stream_not_found",
        }
    }
}

/// Classify an arbitrary reconcile error for the `error_type` metric dimension.
#[must_use]
pub fn error_label(err: &anyhow::Error) -> &'static str {
    if let Some(stage_err) = err.downcast_ref::<StageError>() {
        return stage_err.metric_label();
    }
    match err.downcast_ref::<kube::Error>() {
        Some(kube::Error::Api(ae)) if ae.code == 409 => "conflict",
        Some(kube::Error::Api(_)) => "api_error",
        Some(_) => "client_error",
        None => "other",
    }
}

/// Returns true when the error is a [`StageError`] precondition.
#[must_use]
pub fn is_precondition(err: &anyhow::Error) -> bool {
    err.downcast_ref::<StageError>()
        .is_some_and(StageError::is_precondition)
}
