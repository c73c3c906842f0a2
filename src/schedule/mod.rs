// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Scheduling core
//!
//! Stage detection, duration estimation and task sequencing, composed by
//! [`Scheduler`]. Every function here is pure: it takes a snapshot and a
//! clock reading and returns derived values.

mod duration;
mod facade;
mod sequencer;
mod stages;

pub use duration::{DurationEstimate, DurationEstimator, StageEstimate};
pub use facade::{Degradation, ScheduleReport, Scheduler, TaskState};
pub use sequencer::TaskSequencer;
pub use stages::{Stage, StageDetector, StagePlan};
