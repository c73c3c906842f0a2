// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Job documents
//!
//! The snapshot types handed to the scheduler, the actions that edit them,
//! document validation, and the locking helpers for whoever owns job state.

mod actions;
mod definition;
mod session;
mod validation;

pub use definition::*;
pub use session::{EditLock, EditToken, JobRegistry};
pub use validation::{JobValidator, ValidationResult};
