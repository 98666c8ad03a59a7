//! The 1N4007 current-voltage network: a fixed six-stage dense topology.
//!
//! ```text
//! voltage code -> 1 -> 64 -> 128 -> 128 -> 64 -> 32 -> 1 -> current code
//! ```
//!
//! Stages 1-5 run ReLU; stage 6 is Identity so the output can carry the
//! sign of the modeled current. Weights and biases come from the embedded
//! calibration asset in [`crate::weights`].

use crate::arena::Arena;
use crate::error::KernelResult;
use crate::layers::{Activation, DenseStage, Stage};
use crate::math::worst_case_accum;
use crate::pipeline::Pipeline;
use crate::weights;

/// Stage widths, input to output.
pub const WIDTHS: [usize; 7] = [1, 64, 128, 128, 64, 32, 1];

/// Width of the input vector (one quantized voltage).
pub const N_INPUTS: usize = WIDTHS[0];

/// Width of the output vector (one quantized current).
pub const N_OUTPUTS: usize = WIDTHS[6];

/// Scratch bytes one inference allocates: the sum of all stage output
/// widths (the bump arena holds every intermediate vector of one pass).
pub const ARENA_BYTES: usize =
    WIDTHS[1] + WIDTHS[2] + WIDTHS[3] + WIDTHS[4] + WIDTHS[5] + WIDTHS[6];

// The i32 accumulator must bound the worst-case sum at the largest fan-in
// in this topology. Checked here, at compile time; the kernel itself has
// no runtime overflow handling.
const MAX_FAN_IN: usize = WIDTHS[3];
const _: () = assert!(worst_case_accum(MAX_FAN_IN) <= i32::MAX as i64);

/// The quantized 1N4007 I-V model.
///
/// Weights are process-wide constants; a `DiodeModel` is a thin bundle of
/// stage descriptors over them and can be shared freely across threads.
/// Each inference call brings its own scratch [`Arena`].
pub struct DiodeModel {
    stages: [DenseStage; 6],
}

impl DiodeModel {
    /// Build the six stages from the embedded weight asset.
    pub fn new() -> KernelResult<Self> {
        Ok(Self {
            stages: [
                DenseStage::new(&weights::W1, &weights::B1, WIDTHS[0], WIDTHS[1], Activation::Relu)?,
                DenseStage::new(&weights::W2, &weights::B2, WIDTHS[1], WIDTHS[2], Activation::Relu)?,
                DenseStage::new(&weights::W3, &weights::B3, WIDTHS[2], WIDTHS[3], Activation::Relu)?,
                DenseStage::new(&weights::W4, &weights::B4, WIDTHS[3], WIDTHS[4], Activation::Relu)?,
                DenseStage::new(&weights::W5, &weights::B5, WIDTHS[4], WIDTHS[5], Activation::Relu)?,
                DenseStage::new(&weights::W6, &weights::B6, WIDTHS[5], WIDTHS[6], Activation::Identity)?,
            ],
        })
    }

    /// Run one inference: quantized voltage code in, current code out.
    ///
    /// The arena needs [`ARENA_BYTES`] of capacity and is the only mutable
    /// state the call touches, so independent calls may run concurrently
    /// as long as each owns its arena.
    pub fn infer(&self, input: &[i8; N_INPUTS], arena: &mut Arena<'_>) -> KernelResult<[i8; N_OUTPUTS]> {
        let refs: [&dyn Stage; 6] = [
            &self.stages[0],
            &self.stages[1],
            &self.stages[2],
            &self.stages[3],
            &self.stages[4],
            &self.stages[5],
        ];
        let pipeline = Pipeline::new(&refs, N_INPUTS)?;
        let out = pipeline.forward(input, arena)?;
        Ok([out[0]])
    }

    /// The six stages in execution order.
    pub fn stages(&self) -> &[DenseStage; 6] {
        &self.stages
    }
}
