// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the CD pipeline operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `CDPipeline` and `Stage` CRDs
pub const API_GROUP: &str = "v2.edp.epam.com";

/// API version for the `CDPipeline` and `Stage` CRDs
pub const API_VERSION: &str = "v1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "v2.edp.epam.com/v1";

/// Kind name for `CDPipeline` resource
pub const KIND_CD_PIPELINE: &str = "CDPipeline";

/// Kind name for `Stage` resource
pub const KIND_STAGE: &str = "Stage";

// ============================================================================
// Controller Requeue Constants
// ============================================================================

/// Requeue duration for generic controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration when a precondition (parent pipeline, previous verified
/// stream) is not in place yet (5 seconds)
pub const PRECONDITION_REQUEUE_DURATION_SECS: u64 = 5;

/// Requeue duration while a deleting `CDPipeline` still has stages (10 seconds)
pub const OWNED_STAGES_REQUEUE_DURATION_SECS: u64 = 10;

/// Upper bound of stages enqueued per pipeline event
pub const MAX_FANOUT_STAGES: usize = 1000;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Name of the leader election lease
pub const LEADER_ELECTION_LEASE_NAME: &str = "edp-cd-pipeline-operator-lock";

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Grace period before a lease holder re-acquires (5 seconds)
pub const DEFAULT_LEASE_GRACE_SECS: u64 = 5;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default bind address of the Prometheus metrics server
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = ":8080";

/// Default bind address of the health probe server
pub const DEFAULT_HEALTH_PROBE_BIND_ADDRESS: &str = ":8081";

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

// ============================================================================
// Status Constants
// ============================================================================

/// Username recorded in status blocks written by the operator
pub const STATUS_USERNAME: &str = "system";

/// Status value once a resource is fully reconciled
pub const STATUS_CREATED: &str = "created";

/// Status value after a user-visible failure
pub const STATUS_FAILED: &str = "failed";

/// Result marker for successful actions
pub const RESULT_SUCCESS: &str = "success";

/// Result marker for failed actions
pub const RESULT_ERROR: &str = "error";

/// `value` field of an available resource
pub const VALUE_ACTIVE: &str = "active";

/// `value` field of a failed resource
pub const VALUE_FAILED: &str = "failed";

/// Action recorded after a successful Stage reconcile
pub const ACTION_ACCEPT_CD_STAGE_REGISTRATION: &str = "accept_cd_stage_registration";

/// Action recorded after a successful `CDPipeline` reconcile
pub const ACTION_SETUP_INITIAL_STRUCTURE: &str = "setup_initial_structure";

/// Action recorded when the target namespace cannot be created
pub const ACTION_CREATE_NAMESPACE: &str = "create_namespace";

/// Action recorded when the Kiosk space cannot be created
pub const ACTION_CREATE_SPACE: &str = "create_space";

/// Initial action marker of a freshly created `JenkinsJob`
pub const ACTION_ACCEPT_JENKINS_JOB: &str = "accept_jenkins_job";

// ============================================================================
// Collaborator Constants
// ============================================================================

/// Name of the `EDPComponent` holding the docker registry URL
pub const DOCKER_REGISTRY_COMPONENT: &str = "docker-registry";

/// Suffix of verified image stream names
pub const VERIFIED_STREAM_SUFFIX: &str = "verified";

/// Suffix of per-pipeline Jenkins folder names
pub const CD_PIPELINE_FOLDER_SUFFIX: &str = "cd-pipeline";

/// Prefix of the job-provisioning job path
pub const JOB_PROVISIONING_PATH_PREFIX: &str = "job-provisions/job/cd/job";

/// Polling period of freshly created Jenkins jobs (seconds)
pub const JENKINS_JOB_AUTO_TRIGGER_PERIOD: i32 = 60;

/// Git server CR version handed to CI jobs
pub const GIT_SERVER_CR_VERSION: &str = "v2";

/// Codebase strategy whose repository path is taken from `gitUrlPath`
pub const CODEBASE_STRATEGY_IMPORT: &str = "import";

// ============================================================================
// RBAC Constants
// ============================================================================

/// Role granting read access to deployments in a target namespace
pub const DEPLOYMENTS_VIEW_ROLE: &str = "admin-console-view-deployments";

/// Binding of the admin console service account to the deployments view role
pub const DEPLOYMENTS_VIEWER_BINDING: &str = "ac-deployments-viewer";

/// Admin console service account in the source namespace
pub const ADMIN_CONSOLE_SERVICE_ACCOUNT: &str = "edp-admin-console";

/// Binding granting the CI service account admin in a target namespace
pub const JENKINS_ADMIN_BINDING: &str = "jenkins-admin";

/// CI service account in the source namespace
pub const JENKINS_SERVICE_ACCOUNT: &str = "jenkins";

/// Cluster role bound by `jenkins-admin`
pub const ADMIN_CLUSTER_ROLE: &str = "admin";

/// Cluster role bound by the OpenShift view binding
pub const VIEW_CLUSTER_ROLE: &str = "view";
