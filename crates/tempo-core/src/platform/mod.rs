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

//! Provides abstractions over the host's power state.
//!
//! The sampling loop polls a [`ThrottleSignal`] once per cycle; it is never
//! pushed. Concrete host probes live in `tempo-infra`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Trait for observing whether the host currently wants reduced resource use.
pub trait ThrottleSignal: Send + Sync {
    /// Returns `true` while the host is in a reduced-power mode.
    fn is_throttled(&self) -> bool;
}

/// A throttle signal flipped by hand, e.g. from a CLI flag or a test.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct ThrottleSwitch {
    engaged: Arc<AtomicBool>,
}

impl ThrottleSwitch {
    /// Creates a switch in the given initial state.
    pub fn new(engaged: bool) -> Self {
        Self {
            engaged: Arc::new(AtomicBool::new(engaged)),
        }
    }

    /// Engages or releases the throttle.
    pub fn set(&self, engaged: bool) {
        let previous = self.engaged.swap(engaged, Ordering::SeqCst);
        if previous != engaged {
            log::debug!("ThrottleSwitch: {} -> {}", previous, engaged);
        }
    }
}

impl ThrottleSignal for ThrottleSwitch {
    fn is_throttled(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }
}
