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

//! Adaptive control of the sampling loop.
//!
//! The [`PacingController`] picks cadence and intensity from the host's
//! throttle signal; the [`SamplingLoop`] runs the measure → aggregate →
//! publish → pace cycle on a dedicated thread.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod host;
pub mod pacing;
pub mod service;

pub use config::{ConfigError, SamplingConfig};
pub use error::{ControlError, IterationError};
pub use host::{ForegroundHost, HostDenial, ThreadHost};
pub use pacing::{PacingAction, PacingController, PacingDecision};
pub use service::{LoopOutcome, LoopState, SamplingLoop};
