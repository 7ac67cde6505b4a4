//! Real-valued FFT engine
//!
//! Thin wrapper over `realfft` providing paired forward/inverse transforms of
//! a fixed size. The underlying transforms are unnormalized; the inverse
//! applies the 1/N scale so that `inverse(forward(x)) == x` to floating-point
//! tolerance for any size, power-of-two or not.
//!
//! A single instance is not safe for concurrent use (it owns scratch state);
//! create one instance per thread for parallel processing.

use std::sync::Arc;

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::error::TransformError;

/// Real-input FFT processor bound to one transform size
pub struct Fft {
    n_fft: usize,
    forward_plan: Arc<dyn RealToComplex<f32>>,
    inverse_plan: Arc<dyn ComplexToReal<f32>>,
    // Scratch state; the plans mutate their input buffers during computation
    real_buf: Vec<f32>,
    spectrum_buf: Vec<Complex<f32>>,
    forward_scratch: Vec<Complex<f32>>,
    inverse_scratch: Vec<Complex<f32>>,
}

impl Fft {
    /// Create an FFT processor for the given transform size
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` if `n_fft` is 0.
    pub fn new(n_fft: usize) -> Result<Self, TransformError> {
        if n_fft == 0 {
            return Err(TransformError::InvalidParameter(
                "FFT size must be > 0".to_string(),
            ));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let forward_plan = planner.plan_fft_forward(n_fft);
        let inverse_plan = planner.plan_fft_inverse(n_fft);

        let forward_scratch = forward_plan.make_scratch_vec();
        let inverse_scratch = inverse_plan.make_scratch_vec();

        Ok(Self {
            n_fft,
            forward_plan,
            inverse_plan,
            real_buf: vec![0.0; n_fft],
            spectrum_buf: vec![Complex::new(0.0, 0.0); n_fft / 2 + 1],
            forward_scratch,
            inverse_scratch,
        })
    }

    /// FFT size
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Number of frequency bins (n_fft/2 + 1)
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Forward FFT (real to complex)
    ///
    /// # Arguments
    ///
    /// * `input` - Input signal, length must equal `n_fft`
    /// * `output` - Complex spectrum, length must equal `n_bins`
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` on a size mismatch.
    pub fn forward(
        &mut self,
        input: &[f32],
        output: &mut [Complex<f32>],
    ) -> Result<(), TransformError> {
        if input.len() != self.n_fft {
            return Err(TransformError::InvalidParameter(format!(
                "FFT input length {} does not match FFT size {}",
                input.len(),
                self.n_fft
            )));
        }
        if output.len() != self.n_bins() {
            return Err(TransformError::InvalidParameter(format!(
                "FFT output length {} does not match bin count {}",
                output.len(),
                self.n_bins()
            )));
        }

        // The plan mutates its input, so work on the scratch copy
        self.real_buf.copy_from_slice(input);
        self.forward_plan
            .process_with_scratch(&mut self.real_buf, output, &mut self.forward_scratch)
            .map_err(|e| TransformError::ProcessingError(format!("forward FFT failed: {}", e)))
    }

    /// Inverse FFT (complex to real), including the 1/N scale
    ///
    /// # Arguments
    ///
    /// * `input` - Complex spectrum, length must equal `n_bins`
    /// * `output` - Output signal, length must equal `n_fft`
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` on a size mismatch.
    pub fn inverse(
        &mut self,
        input: &[Complex<f32>],
        output: &mut [f32],
    ) -> Result<(), TransformError> {
        if input.len() != self.n_bins() {
            return Err(TransformError::InvalidParameter(format!(
                "inverse FFT input length {} does not match bin count {}",
                input.len(),
                self.n_bins()
            )));
        }
        if output.len() != self.n_fft {
            return Err(TransformError::InvalidParameter(format!(
                "inverse FFT output length {} does not match FFT size {}",
                output.len(),
                self.n_fft
            )));
        }

        self.spectrum_buf.copy_from_slice(input);

        // A real signal has purely real DC and Nyquist components; spectra
        // assembled from estimated phases may violate that, so enforce it here
        self.spectrum_buf[0].im = 0.0;
        if self.n_fft % 2 == 0 {
            let last = self.spectrum_buf.len() - 1;
            self.spectrum_buf[last].im = 0.0;
        }

        self.inverse_plan
            .process_with_scratch(&mut self.spectrum_buf, output, &mut self.inverse_scratch)
            .map_err(|e| TransformError::ProcessingError(format!("inverse FFT failed: {}", e)))?;

        // realfft leaves the inverse unscaled
        let scale = 1.0 / self.n_fft as f32;
        for sample in output.iter_mut() {
            *sample *= scale;
        }

        Ok(())
    }
}
