// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Pipeline graph
//!
//! `JobGraph` is the adjacency model every algorithm reads; `DagView` is a
//! petgraph projection of it used for diagnostics and rendering.

mod dag;
mod model;

pub use dag::DagView;
pub use model::JobGraph;
