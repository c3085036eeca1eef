// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status helpers for `Stage` and `CDPipeline` resources.
//!
//! Both kinds share the EDP status shape:
//!
//! ```yaml
//! status:
//!   available: true
//!   last_time_updated: "2025-01-01T00:00:00+00:00"
//!   status: created
//!   username: system
//!   action: accept_cd_stage_registration
//!   result: success
//!   value: active
//! ```
//!
//! Status is written through the status subresource. When that write fails the
//! writer retries with a full object update, which is what API servers without
//! the subresource accept.

use anyhow::Result;
use chrono::{DateTime, Utc};
use kube::ResourceExt;
use tracing::{debug, warn};

use crate::cluster::ClusterClient;
use crate::constants::{
    ACTION_ACCEPT_CD_STAGE_REGISTRATION, ACTION_SETUP_INITIAL_STRUCTURE, RESULT_ERROR,
    RESULT_SUCCESS, STATUS_CREATED, STATUS_FAILED, STATUS_USERNAME, VALUE_ACTIVE, VALUE_FAILED,
};
use crate::crd::{CDPipeline, CDPipelineStatus, Stage, StageStatus};

/// Status of a stage whose create chain completed.
#[must_use]
pub fn stage_registered_status(now: DateTime<Utc>) -> StageStatus {
    StageStatus {
        available: true,
        last_time_updated: Some(now.to_rfc3339()),
        status: STATUS_CREATED.to_string(),
        username: STATUS_USERNAME.to_string(),
        action: ACTION_ACCEPT_CD_STAGE_REGISTRATION.to_string(),
        result: RESULT_SUCCESS.to_string(),
        detailed_message: None,
        value: VALUE_ACTIVE.to_string(),
    }
}

/// Status of a stage whose `action` failed with `message`.
#[must_use]
pub fn stage_failed_status(action: &str, message: &str, now: DateTime<Utc>) -> StageStatus {
    StageStatus {
        available: false,
        last_time_updated: Some(now.to_rfc3339()),
        status: STATUS_FAILED.to_string(),
        username: STATUS_USERNAME.to_string(),
        action: action.to_string(),
        result: RESULT_ERROR.to_string(),
        detailed_message: Some(message.to_string()),
        value: VALUE_FAILED.to_string(),
    }
}

/// Returns true when `current` already reports a successful registration.
///
/// Timestamps are ignored so that an unchanged stage is not rewritten.
#[must_use]
pub fn is_registered(current: Option<&StageStatus>) -> bool {
    current.is_some_and(|status| {
        status.available
            && status.status == STATUS_CREATED
            && status.result == RESULT_SUCCESS
            && status.action == ACTION_ACCEPT_CD_STAGE_REGISTRATION
    })
}

/// Status of a pipeline after its initial structure is in place.
#[must_use]
pub fn pipeline_ready_status(generation: Option<i64>, now: DateTime<Utc>) -> CDPipelineStatus {
    CDPipelineStatus {
        available: true,
        last_time_updated: Some(now.to_rfc3339()),
        status: STATUS_CREATED.to_string(),
        username: STATUS_USERNAME.to_string(),
        action: ACTION_SETUP_INITIAL_STRUCTURE.to_string(),
        result: RESULT_SUCCESS.to_string(),
        detailed_message: None,
        value: VALUE_ACTIVE.to_string(),
        observed_generation: generation,
    }
}

/// Write `status` on `stage`, falling back to a full update.
///
/// # Errors
///
/// Returns the error of the full update if both writes fail.
pub async fn write_stage_status(
    client: &dyn ClusterClient,
    stage: &Stage,
    status: StageStatus,
) -> Result<Stage> {
    let mut updated = stage.clone();
    updated.status = Some(status);

    match client.update_stage_status(&updated).await {
        Ok(written) => {
            debug!(
                "Updated status of Stage {}/{}",
                stage.namespace().unwrap_or_default(),
                stage.name_any()
            );
            Ok(written)
        }
        Err(e) => {
            warn!(
                "Status subresource update of Stage {}/{} failed, retrying with full update: {e:#}",
                stage.namespace().unwrap_or_default(),
                stage.name_any()
            );
            client.update_stage(&updated).await
        }
    }
}

/// Record a user-visible failure of `action` on the stage.
///
/// The write is best-effort: a failure to record the status is logged and the
/// caller still propagates the original handler error.
pub async fn record_stage_failure(
    client: &dyn ClusterClient,
    stage: &Stage,
    action: &str,
    err: &anyhow::Error,
) {
    let status = stage_failed_status(action, &format!("{err:#}"), Utc::now());
    if let Err(write_err) = write_stage_status(client, stage, status).await {
        warn!(
            "Failed to record {action} failure on Stage {}/{}: {write_err:#}",
            stage.namespace().unwrap_or_default(),
            stage.name_any()
        );
    }
}

/// Write `status` on `pipeline`, falling back to a full update.
///
/// # Errors
///
/// Returns the error of the full update if both writes fail.
pub async fn write_pipeline_status(
    client: &dyn ClusterClient,
    pipeline: &CDPipeline,
    status: CDPipelineStatus,
) -> Result<CDPipeline> {
    let mut updated = pipeline.clone();
    updated.status = Some(status);

    match client.update_pipeline_status(&updated).await {
        Ok(written) => Ok(written),
        Err(e) => {
            warn!(
                "Status subresource update of CDPipeline {}/{} failed, retrying with full update: {e:#}",
                pipeline.namespace().unwrap_or_default(),
                pipeline.name_any()
            );
            client.update_pipeline(&updated).await
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
