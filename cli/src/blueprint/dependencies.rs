//! # Dependency Merger
//!
//! File: cli/src/blueprint/dependencies.rs
//!
//! ## Overview
//!
//! Filters a blueprint's dependency entries by their conditions and merges
//! them into the final manifest: at most one entry per module identity,
//! ordered by module identity so identical inputs always produce identical
//! manifest bytes.
//!
//! When two active entries name the same module, the higher semantic
//! version wins (a leading `v` is ignored, so Go-style `v1.2.3` compares
//! naturally). If either version is not a parseable semantic version, the
//! later declaration wins.
//!
use crate::blueprint::condition;
use crate::blueprint::schema::DependencySpec;
use crate::blueprint::variables::ResolvedVariables;
use semver::Version;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub module: String,
    pub version: String,
}

fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed)).ok()
}

/// Whether a later `candidate` replaces the `current` version.
fn supersedes(candidate: &str, current: &str) -> bool {
    match (parse_version(candidate), parse_version(current)) {
        (Some(candidate), Some(current)) => candidate >= current,
        _ => true,
    }
}

/// Merges the active entries of `specs` into a de-duplicated, sorted manifest.
pub fn merge(specs: &[DependencySpec], vars: &ResolvedVariables) -> Vec<ResolvedDependency> {
    let mut merged: BTreeMap<&str, &str> = BTreeMap::new();

    for spec in specs {
        if !condition::is_active(spec.condition.as_ref(), vars) {
            debug!(module = %spec.module, "Dependency inactive, skipping");
            continue;
        }
        match merged.get(spec.module.as_str()).copied() {
            Some(current) if !supersedes(&spec.version, current) => {
                debug!(
                    module = %spec.module,
                    "Keeping {} over lower version {}", current, spec.version
                );
            }
            Some(current) => {
                debug!(
                    module = %spec.module,
                    "Replacing {} with {}", current, spec.version
                );
                merged.insert(&spec.module, &spec.version);
            }
            None => {
                merged.insert(&spec.module, &spec.version);
            }
        }
    }

    merged
        .into_iter()
        .map(|(module, version)| ResolvedDependency {
            module: module.to_string(),
            version: version.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::condition::Condition;
    use crate::blueprint::variables::VariableValue;

    fn dep(module: &str, version: &str, condition: Option<&str>) -> DependencySpec {
        DependencySpec {
            module: module.to_string(),
            version: version.to_string(),
            condition: condition.map(|c| Condition::parse(c).unwrap()),
        }
    }

    fn flags(pairs: &[(&str, bool)]) -> ResolvedVariables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), VariableValue::Bool(*v)))
            .collect()
    }

    #[test]
    fn test_same_module_twice_keeps_one_entry() {
        let specs = vec![
            dep("M", "v1.0.0", Some("UseA")),
            dep("M", "v2.0.0", Some("UseB")),
        ];
        let merged = merge(&specs, &flags(&[("UseA", true), ("UseB", true)]));
        assert_eq!(
            merged,
            vec![ResolvedDependency {
                module: "M".into(),
                version: "v2.0.0".into()
            }]
        );
    }

    #[test]
    fn test_higher_version_wins_regardless_of_order() {
        let specs = vec![dep("M", "v2.1.0", None), dep("M", "v1.9.9", None)];
        let merged = merge(&specs, &ResolvedVariables::default());
        assert_eq!(merged[0].version, "v2.1.0");
    }

    #[test]
    fn test_unordered_versions_fall_back_to_last_declared() {
        let specs = vec![dep("M", "v2.0.0", None), dep("M", "latest", None)];
        let merged = merge(&specs, &ResolvedVariables::default());
        assert_eq!(merged[0].version, "latest");

        let specs = vec![dep("M", "^1.2", None), dep("M", "1.0.0", None)];
        let merged = merge(&specs, &ResolvedVariables::default());
        assert_eq!(merged[0].version, "1.0.0");
    }

    #[test]
    fn test_inactive_entries_dropped_and_output_sorted() {
        let specs = vec![
            dep("zeta", "1.0.0", None),
            dep("alpha", "1.0.0", None),
            dep("redis", "9.0.0", Some("UseCache")),
        ];
        let merged = merge(&specs, &flags(&[("UseCache", false)]));
        let modules: Vec<&str> = merged.iter().map(|d| d.module.as_str()).collect();
        assert_eq!(modules, vec!["alpha", "zeta"]);
    }
}
