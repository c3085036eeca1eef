// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Leader election on the `edp-cd-pipeline-operator-lock` lease.
//!
//! Only the replica holding the lease runs controllers. Losing the lease
//! stops the process so that a standby takes over with fresh caches.

use anyhow::{anyhow, Result};
use kube::Client;
use kube_lease_manager::{LeaseManager, LeaseManagerBuilder};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::constants::{
    DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_GRACE_SECS, LEADER_ELECTION_LEASE_NAME,
};
use crate::metrics;

/// Identity of this replica: `POD_NAME`, else `HOSTNAME`, else a process-local fallback.
pub fn leader_identity<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("POD_NAME")
        .or_else(|| lookup("HOSTNAME"))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("edp-cd-pipeline-operator-{}", std::process::id()))
}

/// Held lease; dropping the receiver lets the manager release it.
pub struct Leadership {
    identity: String,
    state: watch::Receiver<bool>,
    task: JoinHandle<kube_lease_manager::Result<LeaseManager>>,
}

impl Leadership {
    /// Wait until this replica holds the lease.
    ///
    /// # Errors
    ///
    /// Returns an error if the lease manager cannot be built or stops before
    /// the lease is acquired.
    pub async fn acquire(client: Client, namespace: &str, identity: String) -> Result<Self> {
        let manager = LeaseManagerBuilder::new(client, LEADER_ELECTION_LEASE_NAME)
            .with_namespace(namespace)
            .with_identity(&identity)
            .with_duration(DEFAULT_LEASE_DURATION_SECS)
            .with_grace(DEFAULT_LEASE_GRACE_SECS)
            .build()
            .await?;
        let (mut state, task) = manager.watch().await;

        info!(identity = %identity, lease = LEADER_ELECTION_LEASE_NAME, "Waiting for leadership");
        metrics::record_leader_status(&identity, false);
        while !*state.borrow_and_update() {
            state
                .changed()
                .await
                .map_err(|_| anyhow!("lease manager stopped before leadership was acquired"))?;
        }

        info!(identity = %identity, "Acquired leadership");
        metrics::record_leader_status(&identity, true);
        Ok(Self {
            identity,
            state,
            task,
        })
    }

    /// Resolve once the lease is lost.
    pub async fn lost(&mut self) {
        loop {
            if !*self.state.borrow_and_update() {
                break;
            }
            if self.state.changed().await.is_err() {
                break;
            }
        }
        warn!(identity = %self.identity, "Leadership lost");
        metrics::record_leader_status(&self.identity, false);
    }

    /// Give the lease up and wait for the manager to finish.
    pub async fn release(self) {
        let Self {
            identity,
            state,
            task,
        } = self;
        drop(state);
        match task.await {
            Ok(Ok(_)) => info!(identity = %identity, "Released leader election lease"),
            Ok(Err(e)) => warn!("Lease manager stopped with error: {e}"),
            Err(e) => warn!("Lease manager task failed: {e}"),
        }
        metrics::record_leader_status(&identity, false);
    }
}

#[cfg(test)]
#[path = "leader_tests.rs"]
mod leader_tests;
