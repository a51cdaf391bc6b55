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

//! The seam between the sampling loop and whatever hosts it.
//!
//! Hosts that run long-lived work at elevated priority (a foreground
//! service, a realtime scheduling class, ...) may refuse to promote the loop.
//! The loop asks once at start and releases on stop; it never depends on host
//! lifecycle callbacks directly.

use tempo_core::ComputeLoad;
use thiserror::Error;

/// A host's refusal to promote the sampling loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct HostDenial {
    /// Human-readable cause, forwarded to the log.
    pub reason: String,
}

impl HostDenial {
    /// Creates a denial with the given cause.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Grants or refuses prioritized execution for the sampling loop.
pub trait ForegroundHost: Send + Sync {
    /// Asks the host to run the loop as prioritized work at the given load.
    fn promote(&self, load: ComputeLoad) -> Result<(), HostDenial>;

    /// Releases whatever `promote` acquired. Called once when the loop stops.
    fn demote(&self) {}
}

/// A host that runs the loop as a plain background thread and never refuses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadHost;

impl ForegroundHost for ThreadHost {
    fn promote(&self, load: ComputeLoad) -> Result<(), HostDenial> {
        log::info!("Sampling loop running on a background thread (compute load: {load})");
        Ok(())
    }

    fn demote(&self) {
        log::debug!("Sampling loop released its background thread");
    }
}
