// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Pipeline graph model
//!
//! Pure adjacency data for one job. Construction checks that every edge
//! lands on a defined node; no scheduling logic lives here.

use std::collections::{HashMap, HashSet};

use crate::errors::{JobflowError, JobflowResult};
use crate::job::{NodeId, NodeKind, NodeSpec};

#[derive(Debug, Clone)]
struct GraphNode {
    kind: NodeKind,
    successors: Vec<NodeId>,
}

/// Immutable adjacency map keyed by node id
#[derive(Debug, Clone)]
pub struct JobGraph {
    /// Node ids in declaration order
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, GraphNode>,
}

impl JobGraph {
    /// Build the graph from node specs.
    ///
    /// Fails on duplicate node ids, on a service referenced by two nodes,
    /// and on successors that are not defined.
    pub fn new(specs: &[NodeSpec]) -> JobflowResult<Self> {
        let mut order = Vec::with_capacity(specs.len());
        let mut nodes = HashMap::with_capacity(specs.len());
        let mut services = HashSet::new();

        for spec in specs {
            if let Some(service) = spec.kind.service_id() {
                if !services.insert(service) {
                    return Err(JobflowError::DuplicateServiceNode {
                        service: service.to_string(),
                    });
                }
            }

            // Successors form an ordered set
            let mut seen = HashSet::new();
            let successors = spec
                .successors
                .iter()
                .filter(|s| seen.insert(s.as_str()))
                .cloned()
                .collect();

            let node = GraphNode {
                kind: spec.kind.clone(),
                successors,
            };
            if nodes.insert(spec.id.clone(), node).is_some() {
                return Err(JobflowError::DuplicateNode {
                    node: spec.id.clone(),
                });
            }
            order.push(spec.id.clone());
        }

        for id in &order {
            for successor in &nodes[id].successors {
                if !nodes.contains_key(successor) {
                    return Err(JobflowError::DanglingEdge {
                        node: id.clone(),
                        successor: successor.clone(),
                    });
                }
            }
        }

        Ok(Self { order, nodes })
    }

    /// All node ids, in declaration order
    pub fn all_nodes(&self) -> &[NodeId] {
        &self.order
    }

    /// Direct successors of a node; empty for unknown ids
    pub fn successors_of(&self, id: &str) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.successors.as_slice())
            .unwrap_or(&[])
    }

    /// Direct predecessors of a node, in declaration order
    pub fn predecessors_of(&self, id: &str) -> Vec<&str> {
        self.order
            .iter()
            .filter(|n| self.successors_of(n).iter().any(|s| s == id))
            .map(|n| n.as_str())
            .collect()
    }

    pub fn kind_of(&self, id: &str) -> Option<&NodeKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    /// Service referenced by a node, if it is a service node
    pub fn service_of(&self, id: &str) -> Option<&str> {
        self.kind_of(id).and_then(NodeKind::service_id)
    }

    /// Service ids referenced by the graph, in declaration order
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.order.iter().filter_map(|id| self.service_of(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Count of incoming edges per node
    pub fn in_degrees(&self) -> HashMap<&str, usize> {
        let mut degrees: HashMap<&str, usize> =
            self.order.iter().map(|id| (id.as_str(), 0)).collect();

        for id in &self.order {
            for successor in self.successors_of(id) {
                *degrees.entry(successor.as_str()).or_default() += 1;
            }
        }

        degrees
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
