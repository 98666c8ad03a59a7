//! Per-stage activation policy.
//!
//! The policy is an explicit field of each stage's configuration, never
//! inferred from the stage's position in the pipeline. The diode network
//! runs ReLU on stages 1-5 and Identity on stage 6; encoding that
//! asymmetry as data keeps it intact when stages are built generically.

/// Activation applied in the widened accumulator domain, before narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// `max(0, acc)`.
    Relu,
    /// Pass the raw accumulator through unmodified. The diode network's
    /// output stage uses this: reverse leakage current is a negative
    /// physical quantity, and a ReLU clamp there would erase it.
    Identity,
}

impl Activation {
    #[inline(always)]
    pub const fn apply(self, acc: i32) -> i32 {
        match self {
            Activation::Relu => {
                if acc > 0 {
                    acc
                } else {
                    0
                }
            }
            Activation::Identity => acc,
        }
    }
}
