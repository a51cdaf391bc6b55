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

//! A 3x3 box-blur pass over a row-major buffer.

use tempo_core::lane::WorkError;

/// The lane that applies a fixed 3x3 averaging kernel to a 2D buffer.
///
/// Neighbors outside the buffer are clamped to the nearest valid row/column.
/// The pass is pure: the same input always yields the same output and the
/// lane holds no state. Cost scales with `width * height`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConvolutionLane;

impl ConvolutionLane {
    /// Creates a new `ConvolutionLane`.
    pub fn new() -> Self {
        Self
    }

    /// Runs one pass over `input`, returning the blurred buffer.
    pub fn run(&self, input: &[f32], width: usize, height: usize) -> Result<Vec<f32>, WorkError> {
        let mut output = vec![0.0; input.len()];
        self.run_into(input, &mut output, width, height)?;
        Ok(output)
    }

    /// Runs one pass over `input`, writing into `output`.
    ///
    /// Both slices must hold exactly `width * height` elements.
    pub fn run_into(
        &self,
        input: &[f32],
        output: &mut [f32],
        width: usize,
        height: usize,
    ) -> Result<(), WorkError> {
        check_shape(input, width, height)?;
        check_shape(output, width, height)?;

        for y in 0..height {
            let rows = [y.saturating_sub(1), y, (y + 1).min(height - 1)];
            for x in 0..width {
                let cols = [x.saturating_sub(1), x, (x + 1).min(width - 1)];
                let mut acc = 0.0f32;
                for row in rows {
                    let base = row * width;
                    for col in cols {
                        acc += input[base + col];
                    }
                }
                // Sum first, divide once: a uniform input maps to itself exactly.
                output[y * width + x] = acc / 9.0;
            }
        }
        Ok(())
    }
}

fn check_shape(buffer: &[f32], width: usize, height: usize) -> Result<(), WorkError> {
    if width == 0 || height == 0 {
        return Err(WorkError::EmptyBuffer { width, height });
    }
    let expected = width
        .checked_mul(height)
        .ok_or(WorkError::ShapeMismatch {
            width,
            height,
            expected: usize::MAX,
            actual: buffer.len(),
        })?;
    if buffer.len() != expected {
        return Err(WorkError::ShapeMismatch {
            width,
            height,
            expected,
            actual: buffer.len(),
        });
    }
    Ok(())
}
