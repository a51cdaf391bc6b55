// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Tempo Core
//!
//! Foundational crate containing the value types and interface contracts
//! shared by the sampling loop, its aggregators and its consumers.
//!
//! Nothing in here owns a thread or touches the host: `tempo-telemetry`
//! aggregates, `tempo-lanes` burns CPU, `tempo-control` drives the loop and
//! `tempo-infra` talks to the platform.

#![warn(missing_docs)]

pub mod control;
pub mod lane;
pub mod platform;
pub mod telemetry;
pub mod utils;

pub use control::ComputeLoad;
pub use lane::{WorkError, Workload};
pub use platform::{ThrottleSignal, ThrottleSwitch};
pub use telemetry::MetricsSnapshot;
pub use utils::timer::Stopwatch;
