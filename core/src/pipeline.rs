//! Sequential pipeline driver.
//!
//! ```text
//! Input -> Stage[0] -> Stage[1] -> ... -> Stage[N-1] -> Output
//! ```
//!
//! Each stage's arena-allocated output feeds the next stage's input. The
//! same fixed sequence of stage calls executes for every invocation; there
//! is no branching on data values, which is what makes a pipelined hardware
//! realization (and bit-exact software replay) possible.
//!
//! Width compatibility across the chain is validated at construction time,
//! before any data flows through.

use crate::arena::Arena;
use crate::error::{KernelError, KernelResult};
use crate::layers::Stage;

/// A sequential pipeline: stages executed in order, output feeds into next.
///
/// # Lifetime `'m`
/// The pipeline borrows stage references; stages must outlive it. Stages
/// are typically `static` or stack-allocated next to the pipeline.
pub struct Pipeline<'m> {
    stages: &'m [&'m dyn Stage],
    input_width: usize,
}

impl core::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct StageNames<'a>(&'a [&'a dyn Stage]);
        impl core::fmt::Debug for StageNames<'_> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_list().entries(self.0.iter().map(|s| s.name())).finish()
            }
        }
        f.debug_struct("Pipeline")
            .field("stages", &StageNames(self.stages))
            .field("input_width", &self.input_width)
            .finish()
    }
}

impl<'m> Pipeline<'m> {
    /// Create a pipeline from a slice of stage references.
    ///
    /// Walks the width chain: each stage must accept the previous stage's
    /// output width. Fails fast here rather than mid-inference.
    pub fn new(stages: &'m [&'m dyn Stage], input_width: usize) -> KernelResult<Self> {
        let mut width = input_width;
        for stage in stages.iter() {
            width = stage.output_width(width)?;
        }
        Ok(Self { stages, input_width })
    }

    /// Run a forward pass through all stages.
    ///
    /// # Memory
    /// Every intermediate activation vector lives in the arena. The arena
    /// must hold all stage outputs of one pass simultaneously (bump
    /// allocation, no free until reset); see [`estimate_arena_size`].
    ///
    /// [`estimate_arena_size`]: Pipeline::estimate_arena_size
    pub fn forward<'a>(&self, input: &[i8], arena: &mut Arena<'a>) -> KernelResult<&'a mut [i8]> {
        if input.len() != self.input_width {
            return Err(KernelError::InvalidInputLength {
                expected: self.input_width,
                actual: input.len(),
            });
        }

        if self.stages.is_empty() {
            let out = arena.alloc_i8_slice(input.len())?;
            out.copy_from_slice(input);
            return Ok(out);
        }

        let first_out = self.stages[0].forward(input, arena)?;
        let mut current_ptr = first_out.as_ptr();
        let mut current_len = first_out.len();
        let mut result: &'a mut [i8] = first_out;

        for stage in self.stages.iter().skip(1) {
            // SAFETY: the previous output is arena-allocated and will not
            // move or be reused while the arena is alive (bump allocation).
            // We re-borrow it immutably as this stage's input while the
            // arena hands out the new output buffer.
            let prev = unsafe { core::slice::from_raw_parts(current_ptr, current_len) };

            let out = stage.forward(prev, arena)?;
            current_ptr = out.as_ptr();
            current_len = out.len();
            result = out;
        }

        Ok(result)
    }

    /// The expected output width, computed from the stage chain.
    pub fn output_width(&self) -> KernelResult<usize> {
        let mut width = self.input_width;
        for stage in self.stages.iter() {
            width = stage.output_width(width)?;
        }
        Ok(width)
    }

    /// The declared input width.
    pub fn input_width(&self) -> usize {
        self.input_width
    }

    /// Number of stages.
    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Get a stage by index.
    pub fn stage(&self, idx: usize) -> Option<&dyn Stage> {
        self.stages.get(idx).copied()
    }

    /// Minimum arena bytes one forward pass allocates: the sum of all
    /// stage output widths (bump allocation holds them all at once).
    pub fn estimate_arena_size(&self) -> KernelResult<usize> {
        let mut total: usize = 0;
        let mut width = self.input_width;
        for stage in self.stages.iter() {
            width = stage.output_width(width)?;
            total += width;
        }
        Ok(total)
    }
}
