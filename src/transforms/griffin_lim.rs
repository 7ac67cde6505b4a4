//! Griffin-Lim phase reconstruction
//!
//! Recovers a time-domain signal from a magnitude-only spectrogram by
//! alternating inverse and forward STFT passes, blending phase estimates with
//! momentum. Phases are initialized from a fixed-seed RNG, so two runs on
//! identical input produce bit-identical output. The iteration never alters
//! magnitude, only phase.

use std::f32::consts::{PI, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::num_complex::Complex;

use crate::config::{GriffinLimConfig, StftConfig};
use crate::error::TransformError;
use crate::io::AudioBuffer;
use crate::transforms::spectrogram::Spectrogram;
use crate::transforms::window::{WindowCache, WindowType};

/// Fixed seed for reproducible phase initialization
const PHASE_SEED: u64 = 42;

/// Reconstruct audio from a magnitude spectrogram
///
/// # Arguments
///
/// * `magnitude` - Magnitude values, bin-major [n_bins * n_frames] where
///   `n_bins = n_fft/2 + 1`
/// * `n_fft` - FFT size used to produce the magnitudes
/// * `hop_length` - Hop length in samples
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Iteration count and momentum
///
/// # Errors
///
/// Returns `TransformError::InvalidParameter` if the magnitude buffer is
/// empty or not a whole number of frames, `n_fft` or `hop_length` is 0, or
/// momentum lies outside [0, 1).
pub fn griffin_lim(
    magnitude: &[f32],
    n_fft: usize,
    hop_length: usize,
    sample_rate: u32,
    config: &GriffinLimConfig,
) -> Result<AudioBuffer, TransformError> {
    if n_fft == 0 {
        return Err(TransformError::InvalidParameter(
            "n_fft must be > 0".to_string(),
        ));
    }
    if hop_length == 0 {
        return Err(TransformError::InvalidParameter(
            "hop_length must be > 0".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&config.momentum) {
        return Err(TransformError::InvalidParameter(format!(
            "momentum must lie in [0, 1), got {}",
            config.momentum
        )));
    }

    let n_bins = n_fft / 2 + 1;
    if magnitude.is_empty() || magnitude.len() % n_bins != 0 {
        return Err(TransformError::InvalidParameter(format!(
            "magnitude length {} is not a whole number of {}-bin frames",
            magnitude.len(),
            n_bins
        )));
    }
    let n_frames = magnitude.len() / n_bins;

    log::debug!(
        "Griffin-Lim: {} bins x {} frames, n_fft={}, hop={}, {} iterations, momentum={}",
        n_bins,
        n_frames,
        n_fft,
        hop_length,
        config.n_iter,
        config.momentum
    );

    // Random initial phases from a fixed seed, drawn in bin-major order
    let mut rng = StdRng::seed_from_u64(PHASE_SEED);
    let mut spectrum: Vec<Complex<f32>> = magnitude
        .iter()
        .map(|&mag| Complex::from_polar(mag, rng.gen_range(0.0..TAU)))
        .collect();

    let mut prev_angles = vec![0.0f32; n_bins * n_frames];

    let stft_config = StftConfig {
        n_fft,
        hop_length,
        win_length: 0,
        window: WindowType::Hann,
        center: true,
    };

    // One window cache shared across all iterations
    let mut cache = WindowCache::new();

    for iter in 0..config.n_iter {
        let spec = Spectrogram::from_complex(
            spectrum.clone(),
            n_bins,
            n_frames,
            n_fft,
            hop_length,
            sample_rate,
        )?;
        let reconstructed = spec.to_audio_with(None, WindowType::Hann, &mut cache)?;

        let new_spec =
            Spectrogram::compute_with(&reconstructed, &stft_config, &mut cache, None)?;

        for f in 0..n_bins {
            for t in 0..n_frames {
                let idx = f * n_frames + t;
                let target_mag = magnitude[idx];

                let mut new_angle = new_spec.at(f, t)?.arg();

                if iter > 0 && config.momentum > 0.0 {
                    let mut diff = new_angle - prev_angles[idx];
                    while diff > PI {
                        diff -= TAU;
                    }
                    while diff < -PI {
                        diff += TAU;
                    }
                    new_angle = prev_angles[idx] + diff * (1.0 - config.momentum);
                }

                prev_angles[idx] = new_angle;
                spectrum[idx] = Complex::from_polar(target_mag, new_angle);
            }
        }
    }

    let final_spec =
        Spectrogram::from_complex(spectrum, n_bins, n_frames, n_fft, hop_length, sample_rate)?;
    final_spec.to_audio(None, WindowType::Hann)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StftConfig;

    fn sine_magnitude(
        freq: f32,
        sr: u32,
        len: usize,
        n_fft: usize,
        hop: usize,
    ) -> (Vec<f32>, usize) {
        let samples: Vec<f32> = (0..len)
            .map(|i| (TAU * freq * i as f32 / sr as f32).sin())
            .collect();
        let audio = AudioBuffer::from_vec(samples, sr);
        let config = StftConfig {
            n_fft,
            hop_length: hop,
            ..StftConfig::default()
        };
        let spec = Spectrogram::compute(&audio, &config).unwrap();
        (spec.magnitude().to_vec(), spec.n_frames())
    }

    #[test]
    fn test_deterministic_across_runs() {
        let (mag, _) = sine_magnitude(440.0, 22050, 4096, 512, 128);
        let config = GriffinLimConfig {
            n_iter: 4,
            momentum: 0.9,
        };
        let a = griffin_lim(&mag, 512, 128, 22050, &config).unwrap();
        let b = griffin_lim(&mag, 512, 128, 22050, &config).unwrap();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_reconstruction_preserves_peak_frequency() {
        let sr = 22050;
        let n_fft = 512;
        let hop = 128;
        // Exactly bin 16 so the peak is unambiguous
        let freq = 16.0 * sr as f32 / n_fft as f32;
        let (mag, _) = sine_magnitude(freq, sr, 8192, n_fft, hop);

        let config = GriffinLimConfig {
            n_iter: 16,
            momentum: 0.99,
        };
        let rec = griffin_lim(&mag, n_fft, hop, sr, &config).unwrap();
        assert!(!rec.is_empty());
        assert!(rec.iter().all(|x| x.is_finite()));

        let stft_config = StftConfig {
            n_fft,
            hop_length: hop,
            ..StftConfig::default()
        };
        let spec = Spectrogram::compute(&rec, &stft_config).unwrap();
        let mid = spec.n_frames() / 2;
        let mut peak_bin = 0;
        let mut peak_mag = 0.0f32;
        for bin in 0..spec.n_bins() {
            let m = spec.at(bin, mid).unwrap().norm();
            if m > peak_mag {
                peak_mag = m;
                peak_bin = bin;
            }
        }
        assert_eq!(peak_bin, 16);
    }

    #[test]
    fn test_invalid_momentum_rejected() {
        let mag = vec![0.0f32; 257 * 4];
        for momentum in [1.0, 1.5, -0.1] {
            let config = GriffinLimConfig { n_iter: 1, momentum };
            assert!(griffin_lim(&mag, 512, 128, 22050, &config).is_err());
        }
    }

    #[test]
    fn test_invalid_shape_rejected() {
        let config = GriffinLimConfig::default();
        // Not a whole number of 257-bin frames
        let mag = vec![0.0f32; 100];
        assert!(griffin_lim(&mag, 512, 128, 22050, &config).is_err());
        // Empty magnitude
        assert!(griffin_lim(&[], 512, 128, 22050, &config).is_err());
    }
}
