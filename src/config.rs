// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line flags of the operator binary.

use anyhow::{Context as _, Result};
use clap::Parser;
use std::net::SocketAddr;

use crate::constants::{DEFAULT_HEALTH_PROBE_BIND_ADDRESS, DEFAULT_METRICS_BIND_ADDRESS};

/// EDP CD pipeline operator.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "edp-cd-pipeline-operator", version, about)]
pub struct Cli {
    /// The address the metric endpoint binds to.
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = DEFAULT_METRICS_BIND_ADDRESS)]
    pub metrics_bind_address: String,

    /// The address the probe endpoint binds to.
    #[arg(long, env = "HEALTH_PROBE_BIND_ADDRESS", default_value = DEFAULT_HEALTH_PROBE_BIND_ADDRESS)]
    pub health_probe_bind_address: String,

    /// Enable leader election, ensuring only one active controller manager.
    #[arg(long, env = "LEADER_ELECT")]
    pub leader_elect: bool,
}

impl Cli {
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn metrics_addr(&self) -> Result<SocketAddr> {
        parse_bind_address(&self.metrics_bind_address)
    }

    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn health_probe_addr(&self) -> Result<SocketAddr> {
        parse_bind_address(&self.health_probe_bind_address)
    }
}

/// Parse a bind address, expanding the `:port` shorthand to all interfaces.
///
/// # Errors
///
/// Returns an error if the address is not a valid socket address.
pub fn parse_bind_address(address: &str) -> Result<SocketAddr> {
    let expanded = if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_string()
    };
    expanded
        .parse()
        .with_context(|| format!("invalid bind address '{address}'"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
