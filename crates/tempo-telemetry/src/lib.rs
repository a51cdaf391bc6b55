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

//! Aggregation and distribution of sampling-loop telemetry.
//!
//! [`RunningStats`] and [`JankWindow`] are owned exclusively by the sampling
//! loop and need no synchronization. [`MetricsPublisher`] is the only
//! structure shared between the producer and its consumers.

#![warn(missing_docs)]

pub mod publisher;
pub mod stats;

pub use publisher::{MetricsPublisher, Subscription};
pub use stats::jank::{AnomalyRate, JankWindow};
pub use stats::running::RunningStats;
