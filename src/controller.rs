// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller wiring for `Stage` and `CDPipeline`.
//!
//! Both controllers watch the single namespace the operator is scoped to. The
//! Stage controller additionally watches pipelines: when a pipeline's spec
//! changes, every stage labelled with the pipeline name is enqueued so the
//! new inputs reach each environment.

use futures::StreamExt;
use kube::runtime::controller::Action;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::{watcher::Config, Controller};
use kube::{Api, Client, Resource, ResourceExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::constants::{
    ERROR_REQUEUE_DURATION_SECS, KIND_CD_PIPELINE, KIND_STAGE, MAX_FANOUT_STAGES,
    PRECONDITION_REQUEUE_DURATION_SECS,
};
use crate::context::Context;
use crate::crd::{CDPipeline, Stage};
use crate::errors::{error_label, is_precondition};
use crate::labels::PIPELINE_NAME_LABEL;
use crate::metrics;
use crate::reconcilers::{reconcile_cdpipeline, reconcile_stage, should_reconcile};

/// Error type handed to kube-runtime.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ReconcileError(#[from] pub anyhow::Error);

/// Stages to enqueue after an event on `pipeline`.
///
/// Only a pipeline whose generation is ahead of its observed generation has a
/// new spec; status and metadata updates enqueue nothing.
#[must_use]
pub fn stages_to_enqueue(stages: &[Arc<Stage>], pipeline: &CDPipeline) -> Vec<ObjectRef<Stage>> {
    let observed = pipeline
        .status
        .as_ref()
        .and_then(|status| status.observed_generation);
    if !should_reconcile(pipeline.metadata.generation, observed) {
        return Vec::new();
    }

    let namespace = pipeline.namespace();
    let name = pipeline.name_any();
    stages
        .iter()
        .filter(|stage| stage.namespace() == namespace)
        .filter(|stage| stage.labels().get(PIPELINE_NAME_LABEL) == Some(&name))
        .take(MAX_FANOUT_STAGES)
        .map(|stage| ObjectRef::from_obj(stage.as_ref()))
        .collect()
}

/// Requeue delay after a failed reconcile.
#[must_use]
pub fn requeue_delay(err: &anyhow::Error) -> Duration {
    if is_precondition(err) {
        Duration::from_secs(PRECONDITION_REQUEUE_DURATION_SECS)
    } else {
        Duration::from_secs(ERROR_REQUEUE_DURATION_SECS)
    }
}

/// Run the `Stage` controller until shutdown.
pub async fn run_stage_controller(client: Client, namespace: &str, ctx: Arc<Context>) {
    info!(namespace, "Starting Stage controller");

    let stages = Api::<Stage>::namespaced(client.clone(), namespace);
    let pipelines = Api::<CDPipeline>::namespaced(client, namespace);

    let controller = Controller::new(stages, Config::default());
    let store = controller.store();

    controller
        .watches(pipelines, Config::default(), move |pipeline: CDPipeline| {
            let requests = stages_to_enqueue(&store.state(), &pipeline);
            if !requests.is_empty() {
                debug!(
                    pipeline = %pipeline.name_any(),
                    "Enqueueing {} stage(s) after pipeline change",
                    requests.len()
                );
            }
            requests
        })
        .run(reconcile_stage_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    info!("Stage controller stopped");
}

/// Run the `CDPipeline` controller until shutdown.
pub async fn run_cdpipeline_controller(client: Client, namespace: &str, ctx: Arc<Context>) {
    info!(namespace, "Starting CDPipeline controller");

    let pipelines = Api::<CDPipeline>::namespaced(client, namespace);

    Controller::new(pipelines, Config::default())
        .run(reconcile_cdpipeline_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    info!("CDPipeline controller stopped");
}

/// Reconcile wrapper for `Stage`
async fn reconcile_stage_wrapper(
    stage: Arc<Stage>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    debug!(
        stage = %stage.name_any(),
        namespace = ?stage.namespace(),
        "Reconcile wrapper called for Stage"
    );
    let start = Instant::now();

    match reconcile_stage(&ctx, &stage).await {
        Ok(action) => {
            metrics::record_reconciliation_success(KIND_STAGE, start.elapsed());
            Ok(action)
        }
        Err(e) => {
            metrics::record_reconciliation_error(KIND_STAGE, error_label(&e), start.elapsed());
            log_failure(KIND_STAGE, &stage.name_any(), &e);
            Err(e.into())
        }
    }
}

/// Reconcile wrapper for `CDPipeline`
async fn reconcile_cdpipeline_wrapper(
    pipeline: Arc<CDPipeline>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();

    match reconcile_cdpipeline(&ctx, &pipeline).await {
        Ok(action) => {
            metrics::record_reconciliation_success(KIND_CD_PIPELINE, start.elapsed());
            Ok(action)
        }
        Err(e) => {
            metrics::record_reconciliation_error(
                KIND_CD_PIPELINE,
                error_label(&e),
                start.elapsed(),
            );
            log_failure(KIND_CD_PIPELINE, &pipeline.name_any(), &e);
            Err(e.into())
        }
    }
}

fn log_failure(kind: &str, name: &str, err: &anyhow::Error) {
    if is_precondition(err) {
        warn!("{kind} {name} is waiting on a precondition: {err:#}");
    } else {
        error!("Failed to reconcile {kind} {name}: {err:#}");
    }
}

/// Error policy shared by both controllers
fn error_policy<K>(_resource: Arc<K>, err: &ReconcileError, _ctx: Arc<Context>) -> Action
where
    K: Resource<DynamicType = ()>,
{
    let reason = if is_precondition(&err.0) {
        "precondition"
    } else {
        "error"
    };
    metrics::record_reconciliation_requeue(&K::kind(&()), reason);
    Action::requeue(requeue_delay(&err.0))
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
