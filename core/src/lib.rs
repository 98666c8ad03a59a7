//! # diodenet-core: Quantized 1N4007 I-V Inference Kernel
//!
//! A `no_std` Rust library implementing the fixed-point neural-network
//! approximation of a 1N4007 diode's current-voltage characteristic, as a
//! portable reimplementation of the HLS firmware pipeline.
//!
//! ## Architecture
//!
//! - **Six dense stages**: `1 -> 64 -> 128 -> 128 -> 64 -> 32 -> 1`,
//!   ReLU on stages 1-5, Identity on the output stage
//! - **Q1.7 codes, i32 accumulators**: all math in i8 codes with widened
//!   accumulation; narrowing is shift + saturate
//! - **Arena scratch**: per-inference output buffers from a caller-owned
//!   `&mut [u8]`, zero heap
//! - **Frozen weights**: the calibration asset is `&'static` data, shared
//!   read-only across concurrent inferences
//!
//! ## Usage
//!
//! ```ignore
//! use diodenet_core::*;
//!
//! let model = DiodeModel::new()?;
//!
//! let mut scratch = [0u8; network::ARENA_BYTES];
//! let mut arena = Arena::new(&mut scratch);
//! let [current_code] = model.infer(&[voltage_code], &mut arena)?;
//! ```

// Compiles for bare-metal MCU/softcore targets.
#![no_std]

pub mod arena;
pub mod error;
pub mod layers;
pub mod math;
pub mod network;
pub mod pipeline;
pub mod weights;

// Re-export primary types
pub use arena::Arena;
pub use error::{KernelError, KernelResult};
pub use layers::{Activation, DenseStage, Stage};
pub use math::{narrow, widen_bias, worst_case_accum, ACC_BITS, ACT_BITS, FRAC_BITS};
pub use network::DiodeModel;
pub use pipeline::Pipeline;
