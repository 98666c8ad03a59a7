//! Integration tests for the quantized diode inference kernel.
//!
//! Covers the numeric format (widen/narrow), the arena, dense stages with
//! both activation policies, the pipeline driver, and the shipped 1N4007
//! model (shape, determinism, golden regression vectors).

use diodenet_core::*;

// =============================================================================
// Numeric format
// =============================================================================

#[test]
fn test_declared_format_constants() {
    // The calibration asset is only valid for this exact format.
    assert_eq!(ACT_BITS, 8);
    assert_eq!(FRAC_BITS, 7);
    assert_eq!(ACC_BITS, 32);
}

#[test]
fn test_widen_narrow_roundtrip_is_identity() {
    // Bias widening then narrowing must be exact for every code; this is
    // what makes the bias-only configuration below propagate unchanged.
    for b in i8::MIN..=i8::MAX {
        assert_eq!(narrow(widen_bias(b)), b);
    }
}

#[test]
fn test_narrow_truncates_toward_negative_infinity() {
    // Arithmetic shift, not division: -1 >> 7 == -1, -129 >> 7 == -2.
    assert_eq!(narrow(-1), -1);
    assert_eq!(narrow(-128), -1);
    assert_eq!(narrow(-129), -2);
    assert_eq!(narrow(127), 0);
    assert_eq!(narrow(128), 1);
}

#[test]
fn test_narrow_saturates() {
    assert_eq!(narrow(127 << 7), 127);
    assert_eq!(narrow(128 << 7), 127);
    assert_eq!(narrow(i32::MAX), 127);
    assert_eq!(narrow(-128 << 7), -128);
    assert_eq!(narrow(-129 << 7), -128);
    assert_eq!(narrow(i32::MIN + (1 << 7)), -128);
}

#[test]
fn test_worst_case_accum_fits_i32_for_shipped_fan_ins() {
    for fan_in in network::WIDTHS {
        assert!(worst_case_accum(fan_in) <= i32::MAX as i64);
    }
}

// =============================================================================
// Arena
// =============================================================================

#[test]
fn test_arena_basic_allocation() {
    let mut buf = [0u8; 256];
    let mut arena = Arena::new(&mut buf);
    assert_eq!(arena.capacity(), 256);
    let slice = arena.alloc_i8_slice(10).unwrap();
    assert_eq!(slice.len(), 10);
    assert_eq!(arena.used(), 10);
    assert_eq!(arena.remaining(), 246);
}

#[test]
fn test_arena_exhaustion_returns_error() {
    let mut buf = [0u8; 16];
    let mut arena = Arena::new(&mut buf);
    let result = arena.alloc_i8_slice(100);
    assert_eq!(
        result.unwrap_err(),
        KernelError::ArenaExhausted { requested: 100, remaining: 16 }
    );
}

#[test]
fn test_arena_reset_reclaims_and_zeroes() {
    let mut buf = [0u8; 32];
    let mut arena = Arena::new(&mut buf);
    let first = arena.alloc_i8_slice(8).unwrap();
    for v in first.iter_mut() {
        *v = -42;
    }
    arena.reset();
    assert_eq!(arena.used(), 0);
    // A fresh allocation over the same bytes must not see stale values.
    let second = arena.alloc_i8_slice(8).unwrap();
    assert_eq!(second, &[0i8; 8]);
}

// =============================================================================
// Activation policy
// =============================================================================

#[test]
fn test_relu_policy_clamps_negative_accumulators() {
    assert_eq!(Activation::Relu.apply(-5), 0);
    assert_eq!(Activation::Relu.apply(0), 0);
    assert_eq!(Activation::Relu.apply(630), 630);
}

#[test]
fn test_identity_policy_passes_raw_accumulator() {
    assert_eq!(Activation::Identity.apply(-5), -5);
    assert_eq!(Activation::Identity.apply(630), 630);
}

// =============================================================================
// Dense stage
// =============================================================================

#[test]
fn test_dense_rejects_mismatched_shapes() {
    static W: [i8; 8] = [1; 8];
    static B: [i8; 2] = [0; 2];
    // Weight slice disagrees with 3x2.
    assert_eq!(
        DenseStage::new(&W, &B, 3, 2, Activation::Relu).unwrap_err(),
        KernelError::DimensionMismatch { expected: 6, actual: 8 }
    );
    // Bias slice disagrees with out width 2.
    assert_eq!(
        DenseStage::new(&W[..6], &B[..1], 3, 2, Activation::Relu).unwrap_err(),
        KernelError::DimensionMismatch { expected: 2, actual: 1 }
    );
}

#[test]
fn test_dense_rejects_wrong_input_width() {
    static W: [i8; 8] = [1; 8];
    static B: [i8; 2] = [0; 2];
    let stage = DenseStage::new(&W, &B, 4, 2, Activation::Relu).unwrap();

    let mut buf = [0u8; 64];
    let mut arena = Arena::new(&mut buf);
    let input = [1i8; 3];
    assert_eq!(
        stage.forward(&input, &mut arena).unwrap_err(),
        KernelError::InvalidInputLength { expected: 4, actual: 3 }
    );
}

#[test]
fn test_dense_known_fixture() {
    // Hand-computed single neuron: acc = 5 << 7 + 3*10 + (-2)*20 = 630,
    // ReLU keeps it, 630 >> 7 = 4.
    static W: [i8; 2] = [3, -2];
    static B: [i8; 1] = [5];
    let stage = DenseStage::new(&W, &B, 2, 1, Activation::Relu).unwrap();

    let mut buf = [0u8; 16];
    let mut arena = Arena::new(&mut buf);
    let out = stage.forward(&[10, 20], &mut arena).unwrap();
    assert_eq!(out, &[4]);
}

#[test]
fn test_relu_stage_output_is_nonnegative() {
    static W: [i8; 8] = [-128, -64, -32, -1, -128, -64, -32, -1];
    static B: [i8; 2] = [-128, -1];
    let stage = DenseStage::new(&W, &B, 4, 2, Activation::Relu).unwrap();

    let mut buf = [0u8; 16];
    let mut arena = Arena::new(&mut buf);
    let out = stage.forward(&[127, 127, 127, 127], &mut arena).unwrap();
    for &v in out.iter() {
        assert!(v >= 0, "ReLU stage produced {}", v);
    }
}

#[test]
fn test_identity_stage_keeps_negative_sum_unclamped() {
    // Pre-activation sum is negative; the output stage must report it.
    // acc = 0 + (-128)*64 = -8192, identity, -8192 >> 7 = -64.
    static W: [i8; 1] = [-128];
    static B: [i8; 1] = [0];
    let stage = DenseStage::new(&W, &B, 1, 1, Activation::Identity).unwrap();

    let mut buf = [0u8; 16];
    let mut arena = Arena::new(&mut buf);
    let out = stage.forward(&[64], &mut arena).unwrap();
    assert_eq!(out, &[-64]);
}

#[test]
fn test_accumulator_matches_wide_reference_at_extremes() {
    // Maximum-magnitude configuration at the topology's largest fan-in:
    // the i32 path must agree with an i64 reference, i.e. never wrap.
    static W: [i8; 128] = [-128; 128];
    static B: [i8; 1] = [-128];
    let stage = DenseStage::new(&W, &B, 128, 1, Activation::Identity).unwrap();

    let input = [127i8; 128];
    let mut wide: i64 = (B[0] as i64) << FRAC_BITS;
    for k in 0..128 {
        wide += (W[k] as i64) * (input[k] as i64);
    }
    assert!(wide.unsigned_abs() <= i32::MAX as u64);
    let expected = narrow(wide as i32);

    let mut buf = [0u8; 16];
    let mut arena = Arena::new(&mut buf);
    let out = stage.forward(&input, &mut arena).unwrap();
    assert_eq!(out, &[expected]);
}

// =============================================================================
// Pipeline driver
// =============================================================================

#[test]
fn test_pipeline_validates_width_chain_at_construction() {
    static W: [i8; 8] = [1; 8];
    static B: [i8; 2] = [0; 2];
    let stage = DenseStage::new(&W, &B, 4, 2, Activation::Relu).unwrap();

    let stages: &[&dyn Stage] = &[&stage];
    assert_eq!(
        Pipeline::new(stages, 3).unwrap_err(),
        KernelError::InvalidInputLength { expected: 4, actual: 3 }
    );
    assert!(Pipeline::new(stages, 4).is_ok());
}

#[test]
fn test_pipeline_threads_outputs_between_stages() {
    // 2 -> 2 -> 1: first stage doubles via two unit rows, second sums.
    static W1: [i8; 4] = [127, 0, 0, 127];
    static B1: [i8; 2] = [0; 2];
    static W2: [i8; 2] = [64, 64];
    static B2: [i8; 1] = [1];
    let s1 = DenseStage::new(&W1, &B1, 2, 2, Activation::Relu).unwrap();
    let s2 = DenseStage::new(&W2, &B2, 2, 1, Activation::Identity).unwrap();

    let stages: &[&dyn Stage] = &[&s1, &s2];
    let pipeline = Pipeline::new(stages, 2).unwrap();
    assert_eq!(pipeline.input_width(), 2);
    assert_eq!(pipeline.output_width().unwrap(), 1);
    assert_eq!(pipeline.num_stages(), 2);
    assert_eq!(pipeline.stage(1).unwrap().name(), "Dense");
    assert!(pipeline.stage(2).is_none());
    assert_eq!(pipeline.estimate_arena_size().unwrap(), 3);

    let mut buf = [0u8; 16];
    let mut arena = Arena::new(&mut buf);
    // Stage 1: (127*20) >> 7 = 19 per lane. Stage 2: (1<<7 + 64*19*2) >> 7 = 20.
    let out = pipeline.forward(&[20, 20], &mut arena).unwrap();
    assert_eq!(out, &[20]);
}

#[test]
fn test_pipeline_empty_copies_input() {
    let stages: &[&dyn Stage] = &[];
    let pipeline = Pipeline::new(stages, 4).unwrap();

    let mut buf = [0u8; 16];
    let mut arena = Arena::new(&mut buf);
    let out = pipeline.forward(&[1, -2, 3, -4], &mut arena).unwrap();
    assert_eq!(out, &[1, -2, 3, -4]);
}

// =============================================================================
// Six-stage boundary scenarios (custom weight configurations)
// =============================================================================

static ZW1: [i8; 64] = [0; 64];
static ZB1: [i8; 64] = [0; 64];
static ZW2: [i8; 8192] = [0; 8192];
static ZB2: [i8; 128] = [0; 128];
static ZW3: [i8; 16384] = [0; 16384];
static ZB3: [i8; 128] = [0; 128];
static ZW4: [i8; 8192] = [0; 8192];
static ZB4: [i8; 64] = [0; 64];
static ZW5: [i8; 2048] = [0; 2048];
static ZB5: [i8; 32] = [0; 32];
static ZW6: [i8; 32] = [0; 32];
static ZB6: [i8; 1] = [0];
static NB6: [i8; 1] = [57];

fn zero_topology(final_bias: &'static [i8; 1]) -> [DenseStage; 6] {
    let w = network::WIDTHS;
    [
        DenseStage::new(&ZW1, &ZB1, w[0], w[1], Activation::Relu).unwrap(),
        DenseStage::new(&ZW2, &ZB2, w[1], w[2], Activation::Relu).unwrap(),
        DenseStage::new(&ZW3, &ZB3, w[2], w[3], Activation::Relu).unwrap(),
        DenseStage::new(&ZW4, &ZB4, w[3], w[4], Activation::Relu).unwrap(),
        DenseStage::new(&ZW5, &ZB5, w[4], w[5], Activation::Relu).unwrap(),
        DenseStage::new(&ZW6, final_bias, w[5], w[6], Activation::Identity).unwrap(),
    ]
}

fn run_six(stages: &[DenseStage; 6], x: i8) -> i8 {
    let refs: [&dyn Stage; 6] = [
        &stages[0], &stages[1], &stages[2], &stages[3], &stages[4], &stages[5],
    ];
    let pipeline = Pipeline::new(&refs, network::N_INPUTS).unwrap();
    let mut buf = [0u8; network::ARENA_BYTES];
    let mut arena = Arena::new(&mut buf);
    pipeline.forward(&[x], &mut arena).unwrap()[0]
}

#[test]
fn test_all_zero_configuration_outputs_zero() {
    let stages = zero_topology(&ZB6);
    for x in [-128i8, -64, -1, 0, 1, 64, 127] {
        assert_eq!(run_six(&stages, x), 0);
    }
}

#[test]
fn test_final_bias_propagates_exactly() {
    // All weights zero, only the output stage's bias set: stages 1-5 emit
    // zero vectors, stage 6 reports exactly its bias for every input.
    let stages = zero_topology(&NB6);
    for x in [-128i8, -64, -1, 0, 1, 64, 127] {
        assert_eq!(run_six(&stages, x), 57);
    }
}

// =============================================================================
// Shipped 1N4007 model
// =============================================================================

#[test]
fn test_diode_model_shape() {
    let model = DiodeModel::new().unwrap();
    for (i, stage) in model.stages().iter().enumerate() {
        assert_eq!(stage.in_features(), network::WIDTHS[i]);
        assert_eq!(stage.out_features(), network::WIDTHS[i + 1]);
    }
    assert_eq!(model.stages()[5].activation(), Activation::Identity);
    assert_eq!(network::ARENA_BYTES, 417);
}

#[test]
fn test_diode_model_is_deterministic() {
    let model = DiodeModel::new().unwrap();
    let mut buf_a = [0u8; network::ARENA_BYTES];
    let mut buf_b = [0u8; network::ARENA_BYTES];
    for x in [-128i8, -3, 0, 88, 127] {
        let a = model.infer(&[x], &mut Arena::new(&mut buf_a)).unwrap();
        let b = model.infer(&[x], &mut Arena::new(&mut buf_b)).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_diode_model_hidden_stages_are_nonnegative() {
    let model = DiodeModel::new().unwrap();
    for x in [-128i8, -1, 0, 1, 96, 127] {
        let mut buf = [0u8; network::ARENA_BYTES];
        let mut arena = Arena::new(&mut buf);
        let input = [x];
        let mut vec: &[i8] = &input;
        for stage in &model.stages()[..5] {
            let out = stage.forward(vec, &mut arena).unwrap();
            for &v in out.iter() {
                assert!(v >= 0, "stage {} produced {} for input {}", stage.name(), v, x);
            }
            vec = out;
        }
    }
}

#[test]
fn test_diode_model_golden_curve() {
    // Regression guard for the embedded calibration asset: probe codes and
    // their recorded outputs from the calibration run.
    const PROBES: [i8; 26] = [
        -128, -96, -64, -32, -16, -8, -4, -2, -1, 0, 1, 2, 4, 8, 16, 32, 48, 64, 72, 80, 88, 96,
        104, 112, 120, 127,
    ];
    const GOLDEN: [i8; 26] = [
        1, 0, 0, 2, 1, -1, 1, 0, 0, -1, -1, 0, 0, -2, -1, -1, -2, -1, 0, 3, 3, 10, 20, 30, 42, 55,
    ];

    let model = DiodeModel::new().unwrap();
    let mut buf = [0u8; network::ARENA_BYTES];
    for (&x, &expected) in PROBES.iter().zip(GOLDEN.iter()) {
        let mut arena = Arena::new(&mut buf);
        let out = model.infer(&[x], &mut arena).unwrap();
        assert_eq!(out[0], expected, "probe code {}", x);
    }
}
