// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Stage detection
//!
//! Partitions the job graph into ordered stages by breadth-first leveling.
//! Members of one stage have no path between them and may run in parallel.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::errors::{JobflowError, JobflowResult};
use crate::graph::JobGraph;
use crate::job::{NodeId, ServiceId};

/// One level of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    /// Position in the plan, from 0
    pub index: usize,
    /// Node ids in discovery order
    pub nodes: Vec<NodeId>,
    /// Services behind the service nodes of this stage
    pub services: Vec<ServiceId>,
    /// Appended after leveling because no entry point reaches it
    pub orphan: bool,
}

/// Ordered list of stages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    pub stages: Vec<Stage>,
}

impl StagePlan {
    /// One stage per service node, in declaration order.
    ///
    /// Used when leveling is impossible; yields a fully sequential estimate.
    pub fn sequential(graph: &JobGraph) -> Self {
        let mut plan = Self::default();
        for id in graph.all_nodes() {
            if graph.service_of(id).is_some() {
                plan.push(graph, vec![id.as_str()], false);
            }
        }
        plan
    }

    /// Stages projected onto service ids, skipping sentinel-only stages
    pub fn service_stages(&self) -> Vec<Vec<ServiceId>> {
        self.stages
            .iter()
            .filter(|s| !s.services.is_empty())
            .map(|s| s.services.clone())
            .collect()
    }

    /// Nodes that were appended as trailing orphan stages
    pub fn orphans(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.orphan)
            .flat_map(|s| s.nodes.iter().map(String::as_str))
            .collect()
    }

    /// Stage index holding a node
    pub fn stage_of(&self, node: &str) -> Option<usize> {
        self.stages
            .iter()
            .position(|s| s.nodes.iter().any(|n| n == node))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn push(&mut self, graph: &JobGraph, nodes: Vec<&str>, orphan: bool) {
        let services = nodes
            .iter()
            .filter_map(|id| graph.service_of(id))
            .map(String::from)
            .collect();

        self.stages.push(Stage {
            index: self.stages.len(),
            nodes: nodes.into_iter().map(String::from).collect(),
            services,
            orphan,
        });
    }
}

/// Breadth-first stage leveling
pub struct StageDetector;

impl StageDetector {
    /// Level the graph into stages.
    ///
    /// Entry points (in-degree 0) form stage 0. A node joins the stage after
    /// the one where its last predecessor was placed, and is placed once.
    /// Nodes never reached are appended as one trailing stage each.
    ///
    /// Fails with `NoEntryPoint` when no node has in-degree 0.
    pub fn detect(graph: &JobGraph) -> JobflowResult<StagePlan> {
        let mut remaining = graph.in_degrees();

        let mut current: Vec<&str> = graph
            .all_nodes()
            .iter()
            .map(String::as_str)
            .filter(|id| remaining.get(id).copied() == Some(0))
            .collect();

        if current.is_empty() {
            return Err(JobflowError::NoEntryPoint);
        }

        let mut plan = StagePlan::default();
        let mut placed: HashSet<&str> = HashSet::new();

        while !current.is_empty() {
            placed.extend(current.iter().copied());

            let mut next: Vec<&str> = Vec::new();
            for id in &current {
                for successor in graph.successors_of(id) {
                    let successor = successor.as_str();
                    let Some(degree) = remaining.get_mut(successor) else {
                        continue;
                    };
                    *degree = degree.saturating_sub(1);

                    if *degree == 0 && !placed.contains(successor) && !next.contains(&successor) {
                        next.push(successor);
                    }
                }
            }

            debug!(stage = plan.len(), nodes = ?current, "stage leveled");
            plan.push(graph, current, false);
            current = next;
        }

        for id in graph.all_nodes() {
            if !placed.contains(id.as_str()) {
                debug!(node = %id, "appending orphan stage");
                plan.push(graph, vec![id.as_str()], true);
            }
        }

        Ok(plan)
    }
}
