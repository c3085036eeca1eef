// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `leader.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_pod_name_wins() {
        let identity = leader_identity(lookup(&[("POD_NAME", "op-0"), ("HOSTNAME", "host")]));
        assert_eq!(identity, "op-0");
    }

    #[test]
    fn test_hostname_fallback() {
        assert_eq!(leader_identity(lookup(&[("HOSTNAME", "host")])), "host");
    }

    #[test]
    fn test_process_fallback() {
        let identity = leader_identity(lookup(&[]));
        assert_eq!(
            identity,
            format!("edp-cd-pipeline-operator-{}", std::process::id())
        );
    }
}
