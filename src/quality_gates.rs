// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Encoding of stage quality gates into the `QG_STAGES` CI job parameter.
//!
//! The CI template renderer expects a bracket-less JSON array fragment in which
//! every manual gate is an object and every run of consecutive autotests gates
//! is collapsed into one inner array:
//!
//! ```text
//! [manual m1, autotests a1, autotests a2, manual m2]
//!   => {"name":"manual","step_name":"m1"},[{"name":"autotests","step_name":"a1"},{"name":"autotests","step_name":"a2"}],{"name":"manual","step_name":"m2"}
//! ```
//!
//! The output is consumed verbatim by the CI side and must stay bit-stable.
//! Like the encoder the CI side was written against, `<`, `>` and `&` inside
//! strings are written as `\u003c`, `\u003e` and `\u0026`.

use anyhow::Result;
use serde::Serialize;

use crate::crd::{QualityGate, QualityGateType};

#[derive(Debug, Serialize)]
struct GateStep<'a> {
    name: &'static str,
    step_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Entry<'a> {
    Manual(GateStep<'a>),
    Autotests(Vec<GateStep<'a>>),
}

/// Encode the quality gates of a stage. Returns an empty string for no gates.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn encode_quality_gates(gates: &[QualityGate]) -> Result<String> {
    if gates.is_empty() {
        return Ok(String::new());
    }

    let mut entries: Vec<Entry<'_>> = Vec::new();
    for gate in gates {
        match gate.quality_gate_type {
            QualityGateType::Manual => entries.push(Entry::Manual(GateStep {
                name: "manual",
                step_name: &gate.step_name,
            })),
            QualityGateType::Autotests => {
                let step = GateStep {
                    name: "autotests",
                    step_name: &gate.step_name,
                };
                match entries.last_mut() {
                    Some(Entry::Autotests(group)) => group.push(step),
                    _ => entries.push(Entry::Autotests(vec![step])),
                }
            }
        }
    }

    let encoded = to_html_safe_json(&entries)?;
    Ok(strip_brackets(&encoded).to_string())
}

/// Serialize `value` as compact JSON with HTML-sensitive characters escaped.
///
/// `<`, `>`, `&`, U+2028 and U+2029 only occur inside JSON strings, so they are
/// replaced on the serialized text.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_html_safe_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let encoded = serde_json::to_string(value)?;
    let mut escaped = String::with_capacity(encoded.len());
    for c in encoded.chars() {
        match c {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            c => escaped.push(c),
        }
    }
    Ok(escaped)
}

/// Drop the first and last character of an encoded JSON array.
fn strip_brackets(encoded: &str) -> &str {
    encoded
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(encoded)
}

#[cfg(test)]
#[path = "quality_gates_tests.rs"]
mod quality_gates_tests;
