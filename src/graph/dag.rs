// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! petgraph view of a job graph
//!
//! Answers reachability and cycle questions for diagnostics and renders the
//! graph as text, DOT or Mermaid.

use petgraph::algo::{has_path_connecting, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::JobGraph;
use crate::errors::JobflowError;

/// Directed graph over node ids
pub struct DagView {
    graph: DiGraph<String, ()>,
    name_to_index: HashMap<String, NodeIndex>,
    /// Declaration order, for stable output
    order: Vec<String>,
    labels: HashMap<String, String>,
}

impl DagView {
    /// Build the view from a validated job graph
    pub fn new(job_graph: &JobGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();
        let mut labels = HashMap::new();

        for id in job_graph.all_nodes() {
            let node = graph.add_node(id.clone());
            name_to_index.insert(id.clone(), node);
            if let Some(kind) = job_graph.kind_of(id) {
                labels.insert(id.clone(), kind.to_string());
            }
        }

        for id in job_graph.all_nodes() {
            let from = name_to_index[id];
            for successor in job_graph.successors_of(id) {
                graph.add_edge(from, name_to_index[successor], ());
            }
        }

        Self {
            graph,
            name_to_index,
            order: job_graph.all_nodes().to_vec(),
            labels,
        }
    }

    /// Members of one cycle, in declaration order, if the graph has any
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut components = tarjan_scc(&self.graph);
        components.retain(|scc| {
            scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0])
        });

        let component = components.into_iter().min_by_key(|scc| {
            scc.iter()
                .map(|n| self.position(&self.graph[*n]))
                .min()
                .unwrap_or(usize::MAX)
        })?;

        let mut members: Vec<String> = component
            .into_iter()
            .map(|n| self.graph[n].clone())
            .collect();
        members.sort_by_key(|name| self.position(name));
        Some(members)
    }

    /// Topologically sorted node ids
    pub fn topological_order(&self) -> Result<Vec<String>, JobflowError> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n].clone()).collect())
            .map_err(|_| JobflowError::CircularDependency {
                nodes: self.find_cycle().unwrap_or_default(),
            })
    }

    /// Check whether `to` is reachable from `from`
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        let (Some(a), Some(b)) = (self.name_to_index.get(from), self.name_to_index.get(to)) else {
            return false;
        };
        has_path_connecting(&self.graph, *a, *b, None)
    }

    /// True when no member can reach another member
    #[cfg(test)]
    pub(crate) fn mutually_independent(&self, members: &[String]) -> bool {
        members.iter().all(|a| {
            members
                .iter()
                .all(|b| a == b || !self.has_path(a, b))
        })
    }

    fn position(&self, name: &str) -> usize {
        self.order
            .iter()
            .position(|n| n == name)
            .unwrap_or(usize::MAX)
    }

    fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges = Vec::new();
        for id in &self.order {
            let node = self.name_to_index[id];
            let mut targets: Vec<&str> = self
                .graph
                .neighbors(node)
                .map(|n| self.graph[n].as_str())
                .collect();
            targets.sort_by_key(|t| self.position(t));
            edges.extend(targets.into_iter().map(|t| (id.as_str(), t)));
        }
        edges
    }

    /// Generate Mermaid diagram of the graph
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for id in &self.order {
            let label = self.labels.get(id).map(String::as_str).unwrap_or(id);
            out.push_str(&format!("    {}[\"{}\"]\n", id, label));
        }

        for (from, to) in self.edges() {
            out.push_str(&format!("    {} --> {}\n", from, to));
        }

        out
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph job {\n");
        out.push_str("    rankdir=LR;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for (from, to) in self.edges() {
            out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to));
        }

        // Isolated nodes have no edge to declare them
        for id in &self.order {
            if self.graph.neighbors_undirected(self.name_to_index[id]).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", id));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text listing of nodes with their dependencies
    pub fn to_text(&self) -> Result<String, JobflowError> {
        let order = self.topological_order()?;
        let mut out = String::new();

        for (i, id) in order.iter().enumerate() {
            let mut deps: Vec<&str> = self
                .graph
                .neighbors_directed(self.name_to_index[id], petgraph::Direction::Incoming)
                .map(|n| self.graph[n].as_str())
                .collect();
            deps.sort_by_key(|d| self.position(d));

            let label = self.labels.get(id).map(String::as_str).unwrap_or("");
            out.push_str(&format!("{}. {} ({})", i + 1, id, label));

            if !deps.is_empty() {
                out.push_str(&format!(" [after: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        Ok(out)
    }
}
