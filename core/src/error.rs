//! Error types for the diodenet-core library.
//!
//! Every fallible function in this `no_std` library returns
//! `KernelResult<T>` instead of panicking. The kernel targets bare-metal
//! pipelines; a panic halts the entire device, so shape and capacity
//! defects are reported as values and surface at construction time.

/// All error conditions reported by the inference kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// A weight or bias slice length disagrees with the declared
    /// stage widths.
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },
    /// An activation vector's length disagrees with the stage's fan-in.
    InvalidInputLength {
        expected: usize,
        actual: usize,
    },
    /// The scratch arena cannot satisfy an output-buffer allocation.
    ArenaExhausted {
        requested: usize,
        remaining: usize,
    },
}

pub type KernelResult<T> = Result<T, KernelError>;
