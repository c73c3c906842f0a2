// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Utility modules
//!
//! Common utilities for the jobflow CLI.

pub mod colors;

pub use colors::*;
