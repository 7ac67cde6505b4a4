//! Variable-Q Transform
//!
//! The VQT generalizes the CQT by deriving each bin's bandwidth as
//! `alpha * f_k + gamma` where `alpha = 2^(1/bins_per_octave) - 1`. The
//! additive `gamma` widens low-frequency bins, trading frequency selectivity
//! for shorter filters (better time resolution in the bass). With `gamma = 0`
//! the bandwidths reduce to the CQT's implicit Q-only form and the transform
//! delegates to the CQT path outright.

use crate::config::VqtConfig;
use crate::error::TransformError;
use crate::io::AudioBuffer;
use crate::transforms::cqt::{
    cqt_frequencies, cqt_with, cqt_with_kernel, validate_geometry, CqtKernel, CqtResult,
};
use crate::transforms::spectrogram::ProgressFn;

/// VQT result, structurally identical to a CQT result
pub type VqtResult = CqtResult;

/// Center frequencies for a VQT configuration (same geometric spacing as CQT)
pub fn vqt_frequencies(fmin: f32, n_bins: usize, bins_per_octave: usize) -> Vec<f32> {
    cqt_frequencies(fmin, n_bins, bins_per_octave)
}

/// Per-bin bandwidths: `alpha * f_k + gamma` with `alpha = 2^(1/bpo) - 1`
pub fn vqt_bandwidths(frequencies: &[f32], bins_per_octave: usize, gamma: f32) -> Vec<f32> {
    let alpha = 2.0f32.powf(1.0 / bins_per_octave as f32) - 1.0;
    frequencies.iter().map(|&f| alpha * f + gamma).collect()
}

/// Precomputed frequency-domain VQT filter bank
///
/// Like [`CqtKernel`] but with bandwidth-derived filter lengths
/// (`ceil(filter_scale * sr / bandwidth_k)`) and the per-bin bandwidths
/// retained for inspection.
#[derive(Debug, Clone)]
pub struct VqtKernel {
    inner: CqtKernel,
    bandwidths: Vec<f32>,
}

impl VqtKernel {
    /// Build the kernel for a sample rate and configuration
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` for non-positive `fmin`,
    /// `n_bins`, `bins_per_octave`, or sample rate.
    pub fn build(sample_rate: u32, config: &VqtConfig) -> Result<Self, TransformError> {
        validate_geometry(config.fmin, config.n_bins, config.bins_per_octave, sample_rate)?;

        let frequencies = vqt_frequencies(config.fmin, config.n_bins, config.bins_per_octave);
        let bandwidths = vqt_bandwidths(&frequencies, config.bins_per_octave, config.gamma);

        let sr = sample_rate as f32;
        let lengths: Vec<usize> = bandwidths
            .iter()
            .map(|&bw| (config.filter_scale * sr / bw).ceil() as usize)
            .collect();
        let max_length = lengths.iter().copied().max().unwrap_or(1).max(1);
        let fft_length = max_length.next_power_of_two();

        log::debug!(
            "Building VQT kernel: {} bins, fmin={:.2} Hz, gamma={:.2}, fft_length={}",
            config.n_bins,
            config.fmin,
            config.gamma,
            fft_length
        );

        let inner =
            CqtKernel::build_filters(fft_length, frequencies, lengths, sample_rate, config.window)?;

        Ok(Self { inner, bandwidths })
    }

    /// Underlying filter bank (frequencies, lengths, FFT length, rows)
    pub fn kernel(&self) -> &CqtKernel {
        &self.inner
    }

    /// Per-bin bandwidth in Hz
    pub fn bandwidths(&self) -> &[f32] {
        &self.bandwidths
    }
}

/// Compute the Variable-Q Transform of an audio signal
///
/// A `gamma` of 0 makes the VQT bandwidth-identical to the CQT, so the call
/// delegates to (and numerically matches) the CQT path.
///
/// # Errors
///
/// Returns `TransformError::InvalidParameter` for an empty input signal or
/// non-positive `hop_length`, `fmin`, `n_bins`, or `bins_per_octave`.
pub fn vqt(audio: &AudioBuffer, config: &VqtConfig) -> Result<VqtResult, TransformError> {
    vqt_with(audio, config, None)
}

/// Compute the VQT with an optional progress callback
pub fn vqt_with(
    audio: &AudioBuffer,
    config: &VqtConfig,
    progress: Option<ProgressFn<'_>>,
) -> Result<VqtResult, TransformError> {
    if audio.is_empty() {
        return Err(TransformError::InvalidParameter(
            "empty input signal".to_string(),
        ));
    }
    if config.hop_length == 0 {
        return Err(TransformError::InvalidParameter(
            "hop_length must be > 0".to_string(),
        ));
    }
    validate_geometry(config.fmin, config.n_bins, config.bins_per_octave, audio.sample_rate())?;

    if config.gamma == 0.0 {
        return cqt_with(audio, &config.to_cqt_config(), progress);
    }

    let kernel = VqtKernel::build(audio.sample_rate(), config)?;
    vqt_with_kernel(audio, &kernel, config.hop_length, progress)
}

/// Apply a prebuilt VQT kernel to an audio signal
pub fn vqt_with_kernel(
    audio: &AudioBuffer,
    kernel: &VqtKernel,
    hop_length: usize,
    progress: Option<ProgressFn<'_>>,
) -> Result<VqtResult, TransformError> {
    cqt_with_kernel(audio, kernel.kernel(), hop_length, progress)
}

/// Approximate inverse VQT
///
/// Delegates to the CQT's legacy overlap-add synthesis; the same fidelity
/// caveats apply.
#[deprecated(note = "low-fidelity reconstruction; prefer griffin_lim on the VQT magnitude")]
#[allow(deprecated)]
pub fn ivqt(result: &VqtResult, length: Option<usize>) -> AudioBuffer {
    crate::transforms::cqt::icqt(result, length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CqtConfig;
    use crate::transforms::cqt::cqt;
    use std::f32::consts::TAU;

    fn sine(freq: f32, sr: u32, len: usize) -> AudioBuffer {
        let samples: Vec<f32> = (0..len)
            .map(|i| (TAU * freq * i as f32 / sr as f32).sin())
            .collect();
        AudioBuffer::from_vec(samples, sr)
    }

    fn small_config(gamma: f32) -> VqtConfig {
        VqtConfig {
            hop_length: 512,
            fmin: 110.0,
            n_bins: 24,
            bins_per_octave: 12,
            gamma,
            ..VqtConfig::default()
        }
    }

    #[test]
    fn test_bandwidths() {
        let freqs = vqt_frequencies(110.0, 24, 12);
        let alpha = 2.0f32.powf(1.0 / 12.0) - 1.0;

        let bw_zero = vqt_bandwidths(&freqs, 12, 0.0);
        for (b, f) in bw_zero.iter().zip(freqs.iter()) {
            assert!((b - alpha * f).abs() < 1e-5);
        }

        let bw = vqt_bandwidths(&freqs, 12, 10.0);
        for (b, z) in bw.iter().zip(bw_zero.iter()) {
            assert!((b - z - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_gamma_zero_matches_cqt() {
        let sr = 22050;
        let audio = sine(220.0, sr, 16384);

        let vqt_result = vqt(&audio, &small_config(0.0)).unwrap();
        let cqt_config = CqtConfig {
            hop_length: 512,
            fmin: 110.0,
            n_bins: 24,
            bins_per_octave: 12,
            ..CqtConfig::default()
        };
        let cqt_result = cqt(&audio, &cqt_config).unwrap();

        assert_eq!(vqt_result.n_frames(), cqt_result.n_frames());
        for (a, b) in vqt_result
            .magnitude()
            .iter()
            .zip(cqt_result.magnitude().iter())
        {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_gamma_shortens_low_filters() {
        let sr = 22050;
        let cqt_kernel = CqtKernel::build(
            sr,
            &CqtConfig {
                fmin: 110.0,
                n_bins: 24,
                bins_per_octave: 12,
                ..CqtConfig::default()
            },
        )
        .unwrap();
        let vqt_kernel = VqtKernel::build(sr, &small_config(20.0)).unwrap();

        // Additive gamma widens every bin's bandwidth, so filters shrink;
        // the effect is strongest at the bottom of the range
        assert!(vqt_kernel.kernel().lengths()[0] < cqt_kernel.lengths()[0]);
    }

    #[test]
    fn test_vqt_peak_at_tone_bin() {
        let sr = 22050;
        let freq = 110.0 * 2.0f32.powf(1.0); // bin 12
        let audio = sine(freq, sr, 16384);

        let result = vqt(&audio, &small_config(15.0)).unwrap();
        let mid = result.n_frames() / 2;
        let mut peak_bin = 0;
        let mut peak_mag = 0.0f32;
        for k in 0..result.n_bins() {
            let m = result.at(k, mid).unwrap().norm();
            if m > peak_mag {
                peak_mag = m;
                peak_bin = k;
            }
        }
        assert_eq!(peak_bin, 12);
    }

    #[test]
    fn test_empty_input_rejected() {
        let audio = AudioBuffer::empty(22050);
        assert!(vqt(&audio, &small_config(0.0)).is_err());
        assert!(vqt(&audio, &small_config(5.0)).is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let audio = sine(220.0, 22050, 8192);

        let mut config = small_config(5.0);
        config.fmin = -1.0;
        assert!(vqt(&audio, &config).is_err());

        let mut config = small_config(5.0);
        config.hop_length = 0;
        assert!(vqt(&audio, &config).is_err());
    }

    #[test]
    #[allow(deprecated)]
    fn test_ivqt_runs() {
        let audio = sine(220.0, 22050, 16384);
        let result = vqt(&audio, &small_config(10.0)).unwrap();
        let rec = ivqt(&result, Some(8192));
        assert_eq!(rec.len(), 8192);
        assert!(rec.iter().all(|x| x.is_finite()));
    }
}
