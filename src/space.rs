// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kiosk tenant spaces.
//!
//! When tenant mode is on, a stage deploys into a Kiosk `Space` instead of a
//! plain namespace. The space is cluster-scoped, named like the target
//! namespace and owned by the Kiosk account of the source namespace.

use anyhow::Result;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::debug;

use crate::cluster::{ClusterClient, CreateOutcome};
use crate::collaborators::{Space, SpaceSpec};
use crate::labels::TENANT_LABEL;

/// Build the space `name` for Kiosk account `account`.
#[must_use]
pub fn build_space(name: &str, account: &str) -> Space {
    let mut space = Space::new(
        name,
        SpaceSpec {
            account: account.to_string(),
        },
    );
    space.metadata.labels = Some(BTreeMap::from([(
        TENANT_LABEL.to_string(),
        account.to_string(),
    )]));
    space
}

/// Create the space unless it already exists.
///
/// # Errors
///
/// Returns an error if the lookup or the create fails.
pub async fn ensure_space(
    client: &dyn ClusterClient,
    name: &str,
    account: &str,
) -> Result<CreateOutcome> {
    if client.get_space(name).await?.is_some() {
        debug!("Space {name} already exists");
        return Ok(CreateOutcome::AlreadyExists);
    }
    let space = build_space(name, account);
    debug!("Creating Space {} for account {account}", space.name_any());
    client.create_space(&space).await
}

/// Delete the space; a missing space is not an error.
///
/// # Errors
///
/// Returns an error if the delete call fails.
pub async fn delete_space(client: &dyn ClusterClient, name: &str) -> Result<()> {
    client.delete_space(name).await
}
