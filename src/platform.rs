// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Process environment probe.
//!
//! The operator is configured through a handful of environment variables that
//! are read exactly once at startup. Reconcilers never consult the environment
//! directly; they receive the resolved [`PlatformConfig`] through the shared
//! context, which keeps tests free to pick any platform mode.
//!
//! | Variable | Required | Default | Meaning |
//! |----------|----------|---------|---------|
//! | `WATCH_NAMESPACE` | yes | - | single namespace watched by the controllers |
//! | `DEBUG_MODE` | no | `false` | development logger |
//! | `PLATFORM_TYPE` | no | `openshift` | `openshift` or `kubernetes` |
//! | `KIOSK_ENABLED` | no | `false` | provision Kiosk spaces instead of namespaces |

use anyhow::{bail, Result};
use std::fmt;
use tracing::warn;

pub const WATCH_NAMESPACE_ENV: &str = "WATCH_NAMESPACE";
pub const DEBUG_MODE_ENV: &str = "DEBUG_MODE";
pub const PLATFORM_TYPE_ENV: &str = "PLATFORM_TYPE";
pub const KIOSK_ENABLED_ENV: &str = "KIOSK_ENABLED";

/// Flavour of the underlying cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformType {
    #[default]
    OpenShift,
    Kubernetes,
}

impl PlatformType {
    /// Parse a `PLATFORM_TYPE` value. Unknown values fall back to OpenShift.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "kubernetes" => Self::Kubernetes,
            "openshift" | "" => Self::OpenShift,
            other => {
                warn!("Unknown {PLATFORM_TYPE_ENV} '{other}', assuming openshift");
                Self::OpenShift
            }
        }
    }

    #[must_use]
    pub fn is_openshift(self) -> bool {
        self == Self::OpenShift
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenShift => f.write_str("openshift"),
            Self::Kubernetes => f.write_str("kubernetes"),
        }
    }
}

/// Platform toggles handed to the handler chain factory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformConfig {
    pub platform: PlatformType,
    /// Provision Kiosk spaces instead of plain namespaces.
    pub kiosk_enabled: bool,
}

/// Everything the operator reads from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorEnv {
    pub watch_namespace: String,
    pub debug_mode: bool,
    pub platform: PlatformConfig,
}

impl OperatorEnv {
    /// Read the operator environment from the process.
    ///
    /// # Errors
    ///
    /// Returns an error if `WATCH_NAMESPACE` is missing or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the operator environment through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if `WATCH_NAMESPACE` is missing or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let watch_namespace = match lookup(WATCH_NAMESPACE_ENV) {
            Some(ns) if !ns.trim().is_empty() => ns.trim().to_string(),
            _ => bail!("{WATCH_NAMESPACE_ENV} must be set"),
        };

        let debug_mode = lookup(DEBUG_MODE_ENV)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false);

        let platform = lookup(PLATFORM_TYPE_ENV)
            .map(|v| PlatformType::parse(&v))
            .unwrap_or_default();

        let kiosk_enabled = lookup(KIOSK_ENABLED_ENV)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false);

        Ok(Self {
            watch_namespace,
            debug_mode,
            platform: PlatformConfig {
                platform,
                kiosk_enabled,
            },
        })
    }
}

/// Parse a boolean the way operators conventionally accept them in env vars.
///
/// Accepts `1, t, T, TRUE, true, True, 0, f, F, FALSE, false, False`.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod platform_tests;
