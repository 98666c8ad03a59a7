//! Python bindings for diodenet-core via PyO3.
//!
//! The calibration and validation harness lives on the Python side; these
//! bindings expose the integer kernel so the harness can sweep I-V curves
//! and compare them against SPICE references without reimplementing the
//! fixed-point semantics.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use diodenet_core::{
    network::ARENA_BYTES,
    weights::{AMPS_PER_LSB, VOLTS_PER_LSB},
    Activation, Arena, DenseStage, DiodeModel, Pipeline, Stage,
};

fn to_py_err(e: diodenet_core::KernelError) -> PyErr {
    PyValueError::new_err(format!("{:?}", e))
}

/// The built-in quantized 1N4007 model.
#[pyclass(name = "DiodeModel")]
pub struct PyDiodeModel {
    model: DiodeModel,
    arena_buf: Vec<u8>,
}

#[pymethods]
impl PyDiodeModel {
    #[new]
    fn new() -> PyResult<Self> {
        Ok(Self {
            model: DiodeModel::new().map_err(to_py_err)?,
            arena_buf: vec![0u8; ARENA_BYTES],
        })
    }

    /// One inference: quantized voltage code in, current code out.
    fn infer(&mut self, code: i8) -> PyResult<i8> {
        let mut arena = Arena::new(&mut self.arena_buf);
        let out = self.model.infer(&[code], &mut arena).map_err(to_py_err)?;
        Ok(out[0])
    }

    /// Run the model over a list of input codes.
    fn sweep(&mut self, codes: Vec<i8>) -> PyResult<Vec<i8>> {
        let mut outputs = Vec::with_capacity(codes.len());
        for code in codes {
            let mut arena = Arena::new(&mut self.arena_buf);
            let out = self.model.infer(&[code], &mut arena).map_err(to_py_err)?;
            outputs.push(out[0]);
        }
        Ok(outputs)
    }

    /// Convenience wrapper in engineering units: volts in, amperes out.
    ///
    /// Quantizes the voltage with the calibration's LSB scale (round to
    /// nearest, saturating), runs the integer kernel, and dequantizes the
    /// current code. The kernel itself never touches floats.
    fn infer_volts(&mut self, volts: f32) -> PyResult<f32> {
        let code = (volts / VOLTS_PER_LSB).round().clamp(-128.0, 127.0) as i8;
        Ok(self.infer(code)? as f32 * AMPS_PER_LSB)
    }

    #[staticmethod]
    fn volts_per_lsb() -> f32 {
        VOLTS_PER_LSB
    }

    #[staticmethod]
    fn amps_per_lsb() -> f32 {
        AMPS_PER_LSB
    }
}

/// A generic quantized pipeline assembled stage by stage from Python.
#[pyclass(name = "Pipeline")]
pub struct PyPipeline {
    arena_buf: Vec<u8>,
    input_width: usize,
    stages: Vec<Box<dyn Stage>>,
}

impl PyPipeline {
    fn current_output_width(&self) -> PyResult<usize> {
        let mut width = self.input_width;
        for stage in self.stages.iter() {
            width = stage.output_width(width).map_err(to_py_err)?;
        }
        Ok(width)
    }
}

#[pymethods]
impl PyPipeline {
    #[new]
    fn new(input_width: usize, arena_size: usize) -> Self {
        Self {
            arena_buf: vec![0u8; arena_size],
            input_width,
            stages: Vec::new(),
        }
    }

    /// Append a dense stage. `activation` is `"relu"` or `"identity"`.
    fn add_dense(&mut self, weights: Vec<i8>, bias: Vec<i8>, activation: &str) -> PyResult<()> {
        let activation = match activation {
            "relu" => Activation::Relu,
            "identity" => Activation::Identity,
            other => {
                return Err(PyValueError::new_err(format!(
                    "unknown activation {:?}, expected \"relu\" or \"identity\"",
                    other
                )))
            }
        };
        let in_features = self.current_output_width()?;
        let out_features = bias.len();
        let static_weights: &'static [i8] = Box::leak(weights.into_boxed_slice());
        let static_bias: &'static [i8] = Box::leak(bias.into_boxed_slice());
        let stage = DenseStage::new(static_weights, static_bias, in_features, out_features, activation)
            .map_err(to_py_err)?;
        self.stages.push(Box::new(stage));
        Ok(())
    }

    fn forward(&mut self, input: Vec<i8>) -> PyResult<Vec<i8>> {
        let mut arena = Arena::new(&mut self.arena_buf);
        let stage_refs: Vec<&dyn Stage> = self.stages.iter().map(|s| s.as_ref() as &dyn Stage).collect();
        let pipeline = Pipeline::new(&stage_refs, self.input_width).map_err(to_py_err)?;
        let output = pipeline.forward(&input, &mut arena).map_err(to_py_err)?;
        Ok(output.to_vec())
    }

    fn output_width(&self) -> PyResult<usize> {
        self.current_output_width()
    }

    fn estimate_arena_size(&self) -> PyResult<usize> {
        let stage_refs: Vec<&dyn Stage> = self.stages.iter().map(|s| s.as_ref() as &dyn Stage).collect();
        let pipeline = Pipeline::new(&stage_refs, self.input_width).map_err(to_py_err)?;
        pipeline.estimate_arena_size().map_err(to_py_err)
    }

    fn num_stages(&self) -> usize {
        self.stages.len()
    }

    fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }
}

#[pymodule]
fn diodenet_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDiodeModel>()?;
    m.add_class::<PyPipeline>()?;
    Ok(())
}
