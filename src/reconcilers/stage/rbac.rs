// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! RBAC fixtures of a stage target namespace.
//!
//! | Binding | Role | Subjects |
//! |---------|------|----------|
//! | `ac-deployments-viewer` | Role `admin-console-view-deployments` | admin console service account |
//! | `jenkins-admin` | ClusterRole `admin` | `jenkins` service account, plus the platform admin groups on OpenShift |
//! | `{sourceNs}-view` | ClusterRole `view` | group `{sourceNs}-edp-view` (OpenShift only) |

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::rbac::v1::RoleBinding;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::info;

use super::chain::StageHandler;
use crate::cluster::{ClusterClient, CreateOutcome};
use crate::constants::{
    ADMIN_CLUSTER_ROLE, ADMIN_CONSOLE_SERVICE_ACCOUNT, DEPLOYMENTS_VIEWER_BINDING,
    DEPLOYMENTS_VIEW_ROLE, JENKINS_ADMIN_BINDING, JENKINS_SERVICE_ACCOUNT, VIEW_CLUSTER_ROLE,
};
use crate::crd::Stage;
use crate::naming::{admin_groups, target_namespace, view_binding_name, view_group};
use crate::platform::PlatformType;
use crate::rbac::{
    cluster_role_ref, deployments_view_role, ensure_role, ensure_role_binding, group_subject,
    role_binding, role_ref, service_account_subject,
};

/// RoleBindings a target namespace must carry on `platform`.
#[must_use]
pub fn desired_bindings(source: &str, target: &str, platform: PlatformType) -> Vec<RoleBinding> {
    let mut jenkins_subjects = vec![service_account_subject(JENKINS_SERVICE_ACCOUNT, source)];
    if platform.is_openshift() {
        jenkins_subjects.extend(admin_groups(source).iter().map(|group| group_subject(group)));
    }

    let mut bindings = vec![
        role_binding(
            DEPLOYMENTS_VIEWER_BINDING,
            target,
            role_ref(DEPLOYMENTS_VIEW_ROLE),
            vec![service_account_subject(ADMIN_CONSOLE_SERVICE_ACCOUNT, source)],
        ),
        role_binding(
            JENKINS_ADMIN_BINDING,
            target,
            cluster_role_ref(ADMIN_CLUSTER_ROLE),
            jenkins_subjects,
        ),
    ];

    if platform.is_openshift() {
        bindings.push(role_binding(
            &view_binding_name(source),
            target,
            cluster_role_ref(VIEW_CLUSTER_ROLE),
            vec![group_subject(&view_group(source))],
        ));
    }
    bindings
}

/// Materializes the role and bindings in the target namespace.
pub struct ConfigureRbac {
    client: Arc<dyn ClusterClient>,
    platform: PlatformType,
}

impl ConfigureRbac {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>, platform: PlatformType) -> Self {
        Self { client, platform }
    }
}

#[async_trait]
impl StageHandler for ConfigureRbac {
    fn name(&self) -> &'static str {
        "configure_rbac"
    }

    async fn serve(&self, stage: &Stage) -> Result<()> {
        let client = self.client.as_ref();
        let source = stage.namespace().unwrap_or_default();
        let target = target_namespace(&source, &stage.spec.name);

        if ensure_role(client, &deployments_view_role(&target)).await? == CreateOutcome::Created {
            info!("Created Role {target}/{DEPLOYMENTS_VIEW_ROLE}");
        }

        for binding in desired_bindings(&source, &target, self.platform) {
            if ensure_role_binding(client, &binding).await? == CreateOutcome::Created {
                info!("Created RoleBinding {target}/{}", binding.name_any());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "rbac_tests.rs"]
mod rbac_tests;
