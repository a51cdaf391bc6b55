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

use super::ConvolutionLane;
use std::hint::black_box;
use tempo_core::lane::{WorkError, Workload};

/// The default measured workload: repeated convolution passes over a fixed buffer.
///
/// Every repetition blurs the same seeded source buffer into a scratch
/// buffer, so each pass costs the same and the result is thrown away.
#[derive(Debug, Clone)]
pub struct ConvolutionWorkload {
    lane: ConvolutionLane,
    source: Vec<f32>,
    scratch: Vec<f32>,
    width: usize,
    height: usize,
}

impl ConvolutionWorkload {
    /// Allocates a `width * height` buffer seeded with a repeating ramp in `[0, 1]`.
    pub fn new(width: usize, height: usize) -> Self {
        let len = width.saturating_mul(height);
        let source = (0..len).map(|i| (i % 255) as f32 / 255.0).collect();
        log::debug!("ConvolutionWorkload: allocated {width}x{height} buffer");
        Self {
            lane: ConvolutionLane::new(),
            source,
            scratch: vec![0.0; len],
            width,
            height,
        }
    }

    /// Buffer dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// The seeded source buffer.
    pub fn source(&self) -> &[f32] {
        &self.source
    }
}

impl Workload for ConvolutionWorkload {
    fn run_cycle(&mut self, repetitions: u32) -> Result<(), WorkError> {
        for _ in 0..repetitions {
            self.lane
                .run_into(&self.source, &mut self.scratch, self.width, self.height)?;
            // The output is discarded; keep the optimizer from discarding the pass.
            black_box(&self.scratch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_ramp_wraps_at_255() {
        let workload = ConvolutionWorkload::new(256, 2);
        let source = workload.source();
        assert_eq!(source[0], 0.0);
        assert_eq!(source[254], 254.0 / 255.0);
        assert_eq!(source[255], 0.0);
        assert!(source.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_run_cycle_leaves_source_untouched() {
        let mut workload = ConvolutionWorkload::new(16, 16);
        let before = workload.source().to_vec();
        workload.run_cycle(3).unwrap();
        assert_eq!(workload.source(), before.as_slice());
    }

    #[test]
    fn test_zero_sized_buffer_fails() {
        let mut workload = ConvolutionWorkload::new(0, 16);
        assert!(matches!(
            workload.run_cycle(1),
            Err(WorkError::EmptyBuffer { .. })
        ));
    }

    #[test]
    fn test_zero_repetitions_is_a_no_op() {
        let mut workload = ConvolutionWorkload::new(0, 0);
        assert!(workload.run_cycle(0).is_ok());
    }
}
