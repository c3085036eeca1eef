// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Role and RoleBinding fixtures of stage target namespaces.
//!
//! Builders produce the desired objects; [`ensure_role`] and
//! [`ensure_role_binding`] create them only when absent. Existing objects are
//! left untouched so manual adjustments survive reconciliation.

use anyhow::Result;
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::debug;

use crate::cluster::{ClusterClient, CreateOutcome};
use crate::constants::DEPLOYMENTS_VIEW_ROLE;
use crate::labels::{K8S_MANAGED_BY, MANAGED_BY_CD_PIPELINE_OPERATOR};

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

fn managed_meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(BTreeMap::from([(
            K8S_MANAGED_BY.to_string(),
            MANAGED_BY_CD_PIPELINE_OPERATOR.to_string(),
        )])),
        ..Default::default()
    }
}

/// Role granting `get` and `list` on `apps/deployments`.
#[must_use]
pub fn deployments_view_role(namespace: &str) -> Role {
    Role {
        metadata: managed_meta(DEPLOYMENTS_VIEW_ROLE, namespace),
        rules: Some(vec![PolicyRule {
            api_groups: Some(vec!["apps".to_string()]),
            resources: Some(vec!["deployments".to_string()]),
            verbs: vec!["get".to_string(), "list".to_string()],
            ..Default::default()
        }]),
    }
}

/// Reference to a Role in the binding's namespace.
#[must_use]
pub fn role_ref(name: &str) -> RoleRef {
    RoleRef {
        api_group: RBAC_API_GROUP.to_string(),
        kind: "Role".to_string(),
        name: name.to_string(),
    }
}

/// Reference to a ClusterRole.
#[must_use]
pub fn cluster_role_ref(name: &str) -> RoleRef {
    RoleRef {
        api_group: RBAC_API_GROUP.to_string(),
        kind: "ClusterRole".to_string(),
        name: name.to_string(),
    }
}

#[must_use]
pub fn service_account_subject(name: &str, namespace: &str) -> Subject {
    Subject {
        kind: "ServiceAccount".to_string(),
        name: name.to_string(),
        namespace: Some(namespace.to_string()),
        api_group: None,
    }
}

#[must_use]
pub fn group_subject(name: &str) -> Subject {
    Subject {
        kind: "Group".to_string(),
        name: name.to_string(),
        namespace: None,
        api_group: Some(RBAC_API_GROUP.to_string()),
    }
}

#[must_use]
pub fn role_binding(
    name: &str,
    namespace: &str,
    role_ref: RoleRef,
    subjects: Vec<Subject>,
) -> RoleBinding {
    RoleBinding {
        metadata: managed_meta(name, namespace),
        role_ref,
        subjects: Some(subjects),
    }
}

fn meta_names(meta: &ObjectMeta) -> (String, String) {
    (
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
    )
}

/// Create `role` unless a Role of that name already exists.
///
/// # Errors
///
/// Returns an error if the lookup or the create fails.
pub async fn ensure_role(client: &dyn ClusterClient, role: &Role) -> Result<CreateOutcome> {
    let (namespace, name) = meta_names(&role.metadata);
    if client.get_role(&namespace, &name).await?.is_some() {
        debug!("Role {namespace}/{name} already exists");
        return Ok(CreateOutcome::AlreadyExists);
    }
    client.create_role(role).await
}

/// Create `binding` unless a RoleBinding of that name already exists.
///
/// # Errors
///
/// Returns an error if the lookup or the create fails.
pub async fn ensure_role_binding(
    client: &dyn ClusterClient,
    binding: &RoleBinding,
) -> Result<CreateOutcome> {
    let (namespace, name) = meta_names(&binding.metadata);
    if client.get_role_binding(&namespace, &name).await?.is_some() {
        debug!("RoleBinding {namespace}/{name} already exists");
        return Ok(CreateOutcome::AlreadyExists);
    }
    client.create_role_binding(binding).await
}
