//! Resource Ledger
//!
//! Available replica count per resource type for one simulation run.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use flowopt_graph::{ProcessGraph, ResourceName};

/// Per-resource availability, every type starting at the same capacity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    capacity: u32,
    levels: BTreeMap<ResourceName, u32>,
}

/// Ledger holding every resource type used by an activity of the graph
pub fn compute_resources(graph: &ProcessGraph, replicas: u32) -> ResourceLedger {
    let names = graph
        .tasks()
        .into_iter()
        .filter_map(|n| n.as_activity())
        .flat_map(|a| a.resources.iter().cloned());
    ResourceLedger::new(names, replicas)
}

impl ResourceLedger {
    pub fn new(names: impl IntoIterator<Item = ResourceName>, capacity: u32) -> Self {
        Self {
            capacity,
            levels: names.into_iter().map(|name| (name, capacity)).collect(),
        }
    }

    /// Initial replica count of every type
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn level(&self, name: &str) -> Option<u32> {
        self.levels.get(name).copied()
    }

    pub fn levels(&self) -> &BTreeMap<ResourceName, u32> {
        &self.levels
    }

    /// True iff every required type has at least one replica left.
    /// Unknown types are never available.
    pub fn is_available(&self, required: &BTreeSet<ResourceName>) -> bool {
        required
            .iter()
            .all(|name| self.levels.get(name).is_some_and(|level| *level > 0))
    }

    /// Take one replica of every required type.
    ///
    /// # Panics
    ///
    /// Panics if a required type is unknown or exhausted; callers check
    /// [`ResourceLedger::is_available`] first.
    pub fn acquire(&mut self, required: &BTreeSet<ResourceName>) {
        for name in required {
            let level = self.levels.get_mut(name);
            match level {
                Some(level) if *level > 0 => *level -= 1,
                _ => panic!("acquired unavailable resource {name}"),
            }
        }
    }

    /// Give back one replica of every required type
    pub fn release(&mut self, required: &BTreeSet<ResourceName>) {
        for name in required {
            if let Some(level) = self.levels.get_mut(name) {
                debug_assert!(*level < self.capacity, "released resource {name} above capacity");
                *level = (*level + 1).min(self.capacity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowopt_graph::testing::drone_contention;
    use pretty_assertions::assert_eq;

    fn set(names: &[&str]) -> BTreeSet<ResourceName> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_compute_resources_from_graph() {
        let graph = drone_contention().unwrap();
        let ledger = compute_resources(&graph, 2);
        let names: Vec<_> = ledger.levels().keys().cloned().collect();
        assert_eq!(names, vec!["drone", "employee"]);
        assert_eq!(ledger.level("drone"), Some(2));
    }

    #[test]
    fn test_acquire_then_release_restores_levels() {
        let mut ledger = ResourceLedger::new(["a".to_string(), "b".to_string()], 1);
        let before = ledger.clone();
        let required = set(&["a", "b"]);
        assert!(ledger.is_available(&required));
        ledger.acquire(&required);
        assert!(!ledger.is_available(&set(&["a"])));
        assert!(ledger.is_available(&set(&[])));
        ledger.release(&required);
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_unknown_resource_is_unavailable() {
        let ledger = ResourceLedger::new(["a".to_string()], 3);
        assert!(!ledger.is_available(&set(&["a", "ghost"])));
    }

    #[test]
    #[should_panic(expected = "acquired unavailable resource")]
    fn test_acquire_exhausted_resource_panics() {
        let mut ledger = ResourceLedger::new(["a".to_string()], 1);
        ledger.acquire(&set(&["a"]));
        ledger.acquire(&set(&["a"]));
    }
}
