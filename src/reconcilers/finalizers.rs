// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer bookkeeping for `Stage` and `CDPipeline` resources.
//!
//! The helpers mutate the in-memory object and report whether anything
//! changed; the caller persists the object with a single update. This keeps a
//! reconcile that finds its finalizers in place free of writes.
//!
//! # Example
//!
//! ```rust,ignore
//! use edp_cd_pipeline_operator::reconcilers::finalizers::ensure_finalizers;
//!
//! let mut stage = stage.clone();
//! if ensure_finalizers(&mut stage, &[FOREGROUND_DELETION_FINALIZER, ENV_LABEL_CLEANUP_FINALIZER]) {
//!     stage = client.update_stage(&stage).await?;
//! }
//! ```

use kube::{Resource, ResourceExt};
use tracing::info;

/// Returns true when `finalizer` is present on the resource.
#[must_use]
pub fn has_finalizer<T: Resource>(resource: &T, finalizer: &str) -> bool {
    resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|existing| existing == finalizer))
}

/// Add every missing finalizer from `finalizers` to the resource.
///
/// Returns `true` if the resource was modified and needs to be persisted.
pub fn ensure_finalizers<T>(resource: &mut T, finalizers: &[&str]) -> bool
where
    T: Resource<DynamicType = ()> + ResourceExt,
{
    let missing: Vec<&str> = finalizers
        .iter()
        .copied()
        .filter(|finalizer| !has_finalizer(resource, finalizer))
        .collect();

    if missing.is_empty() {
        return false;
    }

    info!(
        "Adding finalizers {:?} to {}/{} {}",
        missing,
        resource.namespace().unwrap_or_default(),
        resource.name_any(),
        T::kind(&())
    );

    let current = resource.meta_mut().finalizers.get_or_insert_with(Vec::new);
    current.extend(missing.into_iter().map(str::to_string));
    true
}

/// Remove `finalizer` from the resource.
///
/// Returns `true` if the resource was modified and needs to be persisted.
pub fn remove_finalizer<T>(resource: &mut T, finalizer: &str) -> bool
where
    T: Resource<DynamicType = ()> + ResourceExt,
{
    if !has_finalizer(resource, finalizer) {
        return false;
    }

    info!(
        "Removing finalizer {} from {}/{} {}",
        finalizer,
        resource.namespace().unwrap_or_default(),
        resource.name_any(),
        T::kind(&())
    );

    if let Some(current) = resource.meta_mut().finalizers.as_mut() {
        current.retain(|f| f != finalizer);
    }
    true
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
