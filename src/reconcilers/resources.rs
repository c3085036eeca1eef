// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic resource helpers over [`kube::Api`].
//!
//! These functions give every resource kind the same idempotency rules:
//!
//! - **Create**: `AlreadyExists` (HTTP 409) is reported as [`CreateOutcome::AlreadyExists`]
//! - **Get**: `NotFound` is `Ok(None)`
//! - **Delete**: `NotFound` (HTTP 404) is success
//! - **Status**: written through the status subresource with a merge patch
//!
//! They work for both namespaced and cluster-scoped kinds; the caller picks the
//! scope when building the `Api`.

use anyhow::{Context as _, Result};
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::metrics;

/// Result of an idempotent create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Fetch a resource by name, mapping not-found to `None`.
///
/// # Errors
///
/// Returns an error for any API failure other than not-found.
pub async fn get_optional<K>(api: &Api<K>, name: &str) -> Result<Option<K>>
where
    K: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned,
{
    api.get_opt(name)
        .await
        .with_context(|| format!("failed to get {} {name}", K::kind(&())))
}

/// Create a resource, treating `AlreadyExists` as success.
///
/// # Errors
///
/// Returns an error if the resource has no name or the API call fails with
/// anything other than a conflict on create.
pub async fn create_if_absent<K>(api: &Api<K>, resource: &K) -> Result<CreateOutcome>
where
    K: Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned,
{
    let name = resource
        .meta()
        .name
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Resource must have a name"))?;

    match api.create(&PostParams::default(), resource).await {
        Ok(_) => {
            info!(
                "Created {} {}/{}",
                K::kind(&()),
                resource.namespace().unwrap_or_default(),
                name
            );
            metrics::record_resource_created(&K::kind(&()));
            Ok(CreateOutcome::Created)
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            debug!("{} {} already exists", K::kind(&()), name);
            Ok(CreateOutcome::AlreadyExists)
        }
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("failed to create {} {name}", K::kind(&())))),
    }
}

/// Replace a resource with the given object (full update).
///
/// The object's `resourceVersion` is sent along, so a concurrent writer makes
/// this fail with a conflict that the controller retries.
///
/// # Errors
///
/// Returns an error if the resource has no name or the API call fails.
pub async fn replace_resource<K>(api: &Api<K>, resource: &K) -> Result<K>
where
    K: Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned,
{
    let name = resource.name_any();
    let updated = api
        .replace(&name, &PostParams::default(), resource)
        .await
        .map_err(anyhow::Error::new)?;
    metrics::record_resource_updated(&K::kind(&()));
    Ok(updated)
}

/// Write `status` through the status subresource.
///
/// # Errors
///
/// Returns an error if the API call fails.
pub async fn patch_status<K, S>(api: &Api<K>, name: &str, status: &S) -> Result<K>
where
    K: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned,
    S: Serialize + Sync,
{
    let patch = json!({ "status": status });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(anyhow::Error::new)
}

/// Apply a JSON merge patch to the main resource.
///
/// # Errors
///
/// Returns an error if the API call fails.
pub async fn merge_patch<K>(api: &Api<K>, name: &str, patch: &serde_json::Value) -> Result<K>
where
    K: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned,
{
    let updated = api
        .patch(name, &PatchParams::default(), &Patch::Merge(patch))
        .await
        .map_err(anyhow::Error::new)?;
    metrics::record_resource_updated(&K::kind(&()));
    Ok(updated)
}

/// Delete a resource by name, treating not-found as success.
///
/// Returns `true` when a delete was issued, `false` when the resource was absent.
///
/// # Errors
///
/// Returns an error for any API failure other than not-found.
pub async fn delete_if_present<K>(api: &Api<K>, name: &str) -> Result<bool>
where
    K: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            info!("Deleted {} {}", K::kind(&()), name);
            metrics::record_resource_deleted(&K::kind(&()));
            Ok(true)
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            debug!("{} {} already deleted", K::kind(&()), name);
            Ok(false)
        }
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("failed to delete {} {name}", K::kind(&())))),
    }
}
