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

//! Contracts for the measured hot-path work.
//!
//! A [`Workload`] is what the sampling loop times. The default implementation
//! lives in `tempo-lanes`; the trait exists so the loop can be driven by other
//! workloads (and by failing stubs in tests).

use thiserror::Error;

/// Errors raised by a unit of measured work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    /// The buffer length does not match `width * height`.
    #[error("buffer holds {actual} elements but {width}x{height} requires {expected}")]
    ShapeMismatch {
        /// Declared width.
        width: usize,
        /// Declared height.
        height: usize,
        /// `width * height`.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },
    /// Width or height is zero.
    #[error("cannot process an empty {width}x{height} buffer")]
    EmptyBuffer {
        /// Declared width.
        width: usize,
        /// Declared height.
        height: usize,
    },
}

/// A deterministic, CPU-bound cost that the sampling loop can repeat.
///
/// Implementations must not suspend or sleep: the loop's timed region spans
/// exactly the calls to [`Workload::run_cycle`].
pub trait Workload: Send {
    /// Runs the unit of work `repetitions` times, sequentially.
    fn run_cycle(&mut self, repetitions: u32) -> Result<(), WorkError>;
}
