// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context passed to the `Stage` and `CDPipeline` controllers.

use std::sync::Arc;

use crate::cluster::ClusterClient;
use crate::platform::PlatformConfig;

/// Shared context passed to all controllers.
///
/// This context provides access to:
/// - Cluster client for API operations
/// - Platform toggles resolved once at startup
#[derive(Clone)]
pub struct Context {
    /// Cluster client for API operations
    pub client: Arc<dyn ClusterClient>,

    /// Platform mode and tenant-space toggle
    pub platform: PlatformConfig,
}

impl Context {
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>, platform: PlatformConfig) -> Self {
        Self { client, platform }
    }
}
