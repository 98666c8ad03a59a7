//! Dense (fully-connected) stage with frozen weights.

use crate::arena::Arena;
use crate::error::{KernelError, KernelResult};
use crate::math::{narrow, widen_bias};
use super::{Activation, Stage};

/// A fully-connected stage over quantized codes.
///
/// Weights and biases live in read-only memory for the whole program
/// lifetime (`.rodata`/Flash on MCU targets) and are shared across
/// concurrent inferences without synchronization. The weight matrix is
/// logically `[in_features x out_features]`, stored row-major by output
/// neuron: `weights[j * in_features + k]`, so each neuron's fan-in is one
/// contiguous run.
#[derive(Debug)]
pub struct DenseStage {
    weights: &'static [i8],
    bias: &'static [i8],
    in_features: usize,
    out_features: usize,
    activation: Activation,
}

impl DenseStage {
    /// Create a stage, validating the parameter shapes.
    ///
    /// A mismatched slice is a build defect in the weight asset; it is
    /// reported here, before any data flows, never during inference.
    pub fn new(
        weights: &'static [i8],
        bias: &'static [i8],
        in_features: usize,
        out_features: usize,
        activation: Activation,
    ) -> KernelResult<Self> {
        if weights.len() != in_features * out_features {
            return Err(KernelError::DimensionMismatch {
                expected: in_features * out_features,
                actual: weights.len(),
            });
        }
        if bias.len() != out_features {
            return Err(KernelError::DimensionMismatch {
                expected: out_features,
                actual: bias.len(),
            });
        }
        Ok(Self { weights, bias, in_features, out_features, activation })
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl Stage for DenseStage {
    fn name(&self) -> &'static str {
        "Dense"
    }

    fn output_width(&self, input_width: usize) -> KernelResult<usize> {
        if input_width != self.in_features {
            return Err(KernelError::InvalidInputLength {
                expected: self.in_features,
                actual: input_width,
            });
        }
        Ok(self.out_features)
    }

    /// Accumulate-then-activate, per output neuron `j`:
    ///
    /// 1. seed the i32 accumulator with the widened bias code,
    /// 2. add `weights[j][k] * input[k]` in ascending `k` (the order is
    ///    fixed for bit-exact reproducibility),
    /// 3. apply the activation policy in the accumulator domain,
    /// 4. narrow to the output code.
    fn forward<'a>(&self, input: &[i8], arena: &mut Arena<'a>) -> KernelResult<&'a mut [i8]> {
        if input.len() != self.in_features {
            return Err(KernelError::InvalidInputLength {
                expected: self.in_features,
                actual: input.len(),
            });
        }
        let output = arena.alloc_i8_slice(self.out_features)?;
        for j in 0..self.out_features {
            let row = &self.weights[j * self.in_features..(j + 1) * self.in_features];
            let mut acc: i32 = widen_bias(self.bias[j]);
            for k in 0..self.in_features {
                acc += (row[k] as i32) * (input[k] as i32);
            }
            output[j] = narrow(self.activation.apply(acc));
        }
        Ok(output)
    }
}
