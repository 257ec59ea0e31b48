// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution order for a set of processes.
//!
//! A process depends on every other process whose output store is its input
//! store. Ordering uses dependency counting (Kahn's algorithm) with a ready
//! set keyed by discovery index, so among processes that are ready at the
//! same time the one registered first runs first. The result is fully
//! deterministic for a given input order.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::errors::ScheduleError;
use crate::observability::messages::engine::{CycleDetected, ScheduleComputed};
use crate::observability::messages::StructuredLog;
use crate::traits::{Process, ProcessDescriptor};

/// Order `processes` so every producer precedes its consumers.
///
/// # Errors
/// `CyclicDependency` naming, in input order, every process that could not be
/// placed. A process reading its own output is not a cycle.
pub fn schedule(processes: &[Arc<dyn Process>]) -> Result<Vec<Arc<dyn Process>>, ScheduleError> {
    let descriptors: Vec<&ProcessDescriptor> = processes.iter().map(|p| p.descriptor()).collect();
    let order = topological_order(&descriptors)?;
    Ok(order.into_iter().map(|i| Arc::clone(&processes[i])).collect())
}

/// Indices into `descriptors` in execution order.
pub fn topological_order(descriptors: &[&ProcessDescriptor]) -> Result<Vec<usize>, ScheduleError> {
    // input store uid -> indices of processes reading it
    let mut consumers: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, descriptor) in descriptors.iter().enumerate() {
        consumers.entry(descriptor.input().uid()).or_default().push(index);
    }

    let mut dependency_counts = vec![0usize; descriptors.len()];
    let mut reverse_dependencies: Vec<Vec<usize>> = vec![Vec::new(); descriptors.len()];
    for (producer, descriptor) in descriptors.iter().enumerate() {
        let dependents = consumers
            .get(descriptor.output().uid())
            .map(Vec::as_slice)
            .unwrap_or_default();
        for &consumer in dependents {
            if consumer != producer {
                reverse_dependencies[producer].push(consumer);
                dependency_counts[consumer] += 1;
            }
        }
    }

    let mut ready: BTreeSet<usize> = dependency_counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count == 0)
        .map(|(index, _)| index)
        .collect();
    let mut order = Vec::with_capacity(descriptors.len());

    while let Some(index) = ready.pop_first() {
        order.push(index);
        for &dependent in &reverse_dependencies[index] {
            dependency_counts[dependent] -= 1;
            if dependency_counts[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < descriptors.len() {
        let remaining: Vec<String> = descriptors
            .iter()
            .enumerate()
            .filter(|(index, _)| !order.contains(index))
            .map(|(_, d)| d.uid().to_string())
            .collect();
        CycleDetected {
            remaining: &remaining,
        }
        .log();
        return Err(ScheduleError::CyclicDependency {
            processes: remaining,
        });
    }

    let names: Vec<&str> = order.iter().map(|&i| descriptors[i].uid()).collect();
    ScheduleComputed { order: &names }.log();
    Ok(order)
}
