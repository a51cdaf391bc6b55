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

//! Errors surfaced by the control plane.

use crate::config::ConfigError;
use tempo_core::lane::WorkError;
use thiserror::Error;

/// Errors returned to whoever starts and stops the sampling loop.
///
/// Per-cycle faults never show up here unless they exhaust the failure budget.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The host refused to run the loop and best-effort execution is disabled,
    /// or the background thread could not be created.
    #[error("start denied: {0}")]
    StartDenied(String),
    /// `start` was called on a loop that already ran to completion.
    #[error("sampling loop already stopped; create a new loop to run again")]
    AlreadyStopped,
    /// Too many consecutive iterations failed and the loop stopped itself.
    #[error("sampling loop aborted after {consecutive_failures} consecutive failures: {last_error}")]
    LoopAborted {
        /// Length of the failure streak that ended the loop.
        consecutive_failures: u32,
        /// The fault raised by the final iteration.
        last_error: IterationError,
    },
    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A fault raised by a single sampling cycle.
///
/// The cycle's publish step is skipped and the loop moves on to the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IterationError {
    /// The workload rejected its input.
    #[error("workload failed: {0}")]
    Work(#[from] WorkError),
    /// The measured duration was NaN or infinite.
    #[error("measured cycle duration is not finite")]
    NonFiniteDuration,
    /// Something inside the cycle panicked.
    #[error("iteration panicked: {0}")]
    Panicked(String),
}
