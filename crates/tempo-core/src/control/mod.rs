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

//! Control-plane value types shared between the controller and the loop.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The work intensity requested by the external controller.
///
/// The value is clamped to `[MIN, MAX]` once, when it is accepted, and is
/// never re-clamped afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct ComputeLoad(u32);

impl ComputeLoad {
    /// Lowest accepted load.
    pub const MIN: u32 = 1;
    /// Highest accepted load.
    pub const MAX: u32 = 5;
    /// Load used when the controller does not provide one.
    pub const DEFAULT: ComputeLoad = ComputeLoad(2);

    /// Accepts a raw request, clamping it into `[MIN, MAX]`.
    pub fn new(requested: i64) -> Self {
        let clamped = requested.clamp(Self::MIN as i64, Self::MAX as i64);
        if clamped != requested {
            log::debug!("ComputeLoad: request {requested} clamped to {clamped}");
        }
        Self(clamped as u32)
    }

    /// Returns the load as a repetition count.
    pub fn get(self) -> u32 {
        self.0
    }

    /// One step lighter, never below one repetition.
    pub fn reduced(self) -> u32 {
        self.0.saturating_sub(1).max(1)
    }
}

impl Default for ComputeLoad {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for ComputeLoad {
    fn from(requested: i64) -> Self {
        Self::new(requested)
    }
}

impl From<ComputeLoad> for u32 {
    fn from(load: ComputeLoad) -> Self {
        load.0
    }
}

impl Display for ComputeLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
