// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label, annotation and finalizer constants used across all reconcilers.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value for `app.kubernetes.io/managed-by` on resources created by this operator
pub const MANAGED_BY_CD_PIPELINE_OPERATOR: &str = "edp-cd-pipeline-operator";

// ============================================================================
// EDP Labels
// ============================================================================

/// Label identifying the parent `CDPipeline` of a `Stage`
pub const PIPELINE_NAME_LABEL: &str = "app.edp.epam.com/pipeline-name";

/// Label on target namespaces and spaces referencing the source namespace
pub const TENANT_LABEL: &str = "app.edp.epam.com/tenant";

// ============================================================================
// EDP Annotations
// ============================================================================

/// Annotation recording the name of the previous stage (`order - 1`)
pub const PREVIOUS_STAGE_NAME_ANNOTATION: &str = "deploy.edp.epam.com/previous-stage-name";

// ============================================================================
// Finalizers
// ============================================================================

/// Standard cascade-deletion finalizer
pub const FOREGROUND_DELETION_FINALIZER: &str = "foregroundDeletion";

/// Finalizer holding a `Stage` until its environment labels are removed
pub const ENV_LABEL_CLEANUP_FINALIZER: &str = "envLabelCleanup";

/// Finalizer holding a `CDPipeline` until its stages are gone
pub const OWNED_STAGES_FINALIZER: &str = "ownedStages";
