//! Property-based tests for the quantized kernel.
//!
//! Fuzzes dense stages across the parameter space: the i32 accumulator
//! path must agree with an i64 reference (no silent wraparound), ReLU
//! stages must never emit a negative code, and the shipped model must be
//! deterministic for every input code.

use proptest::prelude::*;

use diodenet_core::*;

fn leak(v: Vec<i8>) -> &'static [i8] {
    Box::leak(v.into_boxed_slice())
}

/// Independent reimplementation of the stage semantics in i64 arithmetic.
fn reference_stage(
    input: &[i8],
    weights: &[i8],
    bias: &[i8],
    in_features: usize,
    out_features: usize,
    activation: Activation,
) -> Vec<i8> {
    let mut out = Vec::with_capacity(out_features);
    for j in 0..out_features {
        let mut acc: i64 = (bias[j] as i64) << FRAC_BITS;
        for k in 0..in_features {
            acc += (weights[j * in_features + k] as i64) * (input[k] as i64);
        }
        if activation == Activation::Relu && acc < 0 {
            acc = 0;
        }
        let shifted = acc >> FRAC_BITS;
        out.push(shifted.clamp(i8::MIN as i64, i8::MAX as i64) as i8);
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn dense_matches_wide_reference(
        weights in proptest::collection::vec(any::<i8>(), 32 * 8),
        bias in proptest::collection::vec(any::<i8>(), 8),
        input in proptest::collection::vec(any::<i8>(), 32),
        identity in any::<bool>(),
    ) {
        let activation = if identity { Activation::Identity } else { Activation::Relu };
        let expected = reference_stage(&input, &weights, &bias, 32, 8, activation);

        let stage = DenseStage::new(leak(weights), leak(bias), 32, 8, activation).unwrap();
        let mut buf = [0u8; 64];
        let mut arena = Arena::new(&mut buf);
        let out = stage.forward(&input, &mut arena).unwrap();
        prop_assert_eq!(&out[..], &expected[..]);
    }

    #[test]
    fn relu_stage_never_emits_negative_codes(
        weights in proptest::collection::vec(any::<i8>(), 16 * 4),
        bias in proptest::collection::vec(any::<i8>(), 4),
        input in proptest::collection::vec(any::<i8>(), 16),
    ) {
        let stage = DenseStage::new(leak(weights), leak(bias), 16, 4, Activation::Relu).unwrap();
        let mut buf = [0u8; 16];
        let mut arena = Arena::new(&mut buf);
        let out = stage.forward(&input, &mut arena).unwrap();
        for &v in out.iter() {
            prop_assert!(v >= 0, "ReLU stage emitted {}", v);
        }
    }

    #[test]
    fn diode_model_is_deterministic(code in any::<i8>()) {
        let model = DiodeModel::new().unwrap();
        let mut buf_a = [0u8; network::ARENA_BYTES];
        let mut buf_b = [0u8; network::ARENA_BYTES];
        let a = model.infer(&[code], &mut Arena::new(&mut buf_a)).unwrap();
        let b = model.infer(&[code], &mut Arena::new(&mut buf_b)).unwrap();
        prop_assert_eq!(a, b);
    }
}
