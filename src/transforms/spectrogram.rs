//! STFT analysis and overlap-add synthesis
//!
//! `Spectrogram` stores the complex STFT of a signal as a bin-major
//! `[n_bins x n_frames]` matrix (`data[bin * n_frames + frame]`) together with
//! the parameters needed to invert it. Magnitude and power views are computed
//! lazily on first access and memoized.

use std::sync::OnceLock;

use rustfft::num_complex::Complex;

use crate::config::StftConfig;
use crate::error::TransformError;
use crate::io::AudioBuffer;
use crate::transforms::fft::Fft;
use crate::transforms::window::{WindowCache, WindowType};

/// Progress callback receiving a value in (0, 1]
pub type ProgressFn<'a> = &'a mut dyn FnMut(f32);

/// Accumulated window energy below this is treated as zero in overlap-add
const COLA_EPSILON: f32 = 1e-8;

/// Complex spectrogram computed from audio via STFT
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Complex spectrum, bin-major [n_bins * n_frames]
    data: Vec<Complex<f32>>,
    n_bins: usize,
    n_frames: usize,
    n_fft: usize,
    hop_length: usize,
    sample_rate: u32,
    magnitude_cache: OnceLock<Vec<f32>>,
    power_cache: OnceLock<Vec<f32>>,
}

impl Spectrogram {
    /// Create an empty spectrogram
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            n_bins: 0,
            n_frames: 0,
            n_fft: 0,
            hop_length: 0,
            sample_rate: 0,
            magnitude_cache: OnceLock::new(),
            power_cache: OnceLock::new(),
        }
    }

    /// Compute the STFT of an audio signal
    ///
    /// Empty input yields an empty spectrogram rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` if `n_fft` or `hop_length`
    /// is 0, or the window length exceeds `n_fft`.
    pub fn compute(audio: &AudioBuffer, config: &StftConfig) -> Result<Self, TransformError> {
        let mut cache = WindowCache::new();
        Self::compute_with(audio, config, &mut cache, None)
    }

    /// Compute the STFT with an explicit window cache and optional progress callback
    ///
    /// The callback is purely observational: it is invoked at a bounded
    /// cadence as frames complete, in increasing time order, and has no
    /// effect on the output.
    pub fn compute_with(
        audio: &AudioBuffer,
        config: &StftConfig,
        cache: &mut WindowCache,
        mut progress: Option<ProgressFn<'_>>,
    ) -> Result<Self, TransformError> {
        if audio.is_empty() {
            return Ok(Self::empty());
        }

        if config.n_fft == 0 {
            return Err(TransformError::InvalidParameter(
                "n_fft must be > 0".to_string(),
            ));
        }
        if config.hop_length == 0 {
            return Err(TransformError::InvalidParameter(
                "hop_length must be > 0".to_string(),
            ));
        }

        let n_fft = config.n_fft;
        let hop_length = config.hop_length;
        let win_length = config.actual_win_length();

        if win_length > n_fft {
            return Err(TransformError::InvalidParameter(format!(
                "win_length {} exceeds n_fft {}",
                win_length, n_fft
            )));
        }

        log::debug!(
            "Computing STFT: {} samples, n_fft={}, hop={}, win={}, center={}",
            audio.len(),
            n_fft,
            hop_length,
            win_length,
            config.center
        );

        // Window centered by symmetric zero-padding into an n_fft-wide buffer
        let window = cache.get(config.window, win_length);
        let mut padded_window = vec![0.0f32; n_fft];
        let win_offset = (n_fft - win_length) / 2;
        padded_window[win_offset..win_offset + win_length].copy_from_slice(window);

        // Center padding aligns frame t's center with sample t * hop_length
        let padded_signal: Vec<f32>;
        let signal: &[f32] = if config.center {
            let pad = n_fft / 2;
            let mut buf = vec![0.0f32; audio.len() + 2 * pad];
            buf[pad..pad + audio.len()].copy_from_slice(audio.samples());
            padded_signal = buf;
            &padded_signal
        } else {
            audio.samples()
        };

        let signal_length = signal.len();
        let n_frames = if signal_length >= n_fft {
            1 + (signal_length - n_fft) / hop_length
        } else {
            1
        };
        let n_bins = n_fft / 2 + 1;

        let mut spectrum = vec![Complex::new(0.0, 0.0); n_bins * n_frames];

        let mut fft = Fft::new(n_fft)?;
        let mut frame = vec![0.0f32; n_fft];
        let mut frame_spectrum = vec![Complex::new(0.0, 0.0); n_bins];

        let progress_interval = (n_frames / 20).clamp(1, 100);

        for t in 0..n_frames {
            let start = t * hop_length;
            let valid = n_fft.min(signal_length.saturating_sub(start));

            for i in 0..valid {
                frame[i] = signal[start + i] * padded_window[i];
            }
            // Zero-fill samples past the signal end
            for sample in frame.iter_mut().take(n_fft).skip(valid) {
                *sample = 0.0;
            }

            fft.forward(&frame, &mut frame_spectrum)?;

            for (f, value) in frame_spectrum.iter().enumerate() {
                spectrum[f * n_frames + t] = *value;
            }

            if let Some(cb) = progress.as_mut() {
                if t % progress_interval == 0 || t == n_frames - 1 {
                    cb((t + 1) as f32 / n_frames as f32);
                }
            }
        }

        Ok(Self {
            data: spectrum,
            n_bins,
            n_frames,
            n_fft,
            hop_length,
            sample_rate: audio.sample_rate(),
            magnitude_cache: OnceLock::new(),
            power_cache: OnceLock::new(),
        })
    }

    /// Create a spectrogram from existing complex data (bin-major)
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` if `data.len()` does not
    /// equal `n_bins * n_frames`.
    pub fn from_complex(
        data: Vec<Complex<f32>>,
        n_bins: usize,
        n_frames: usize,
        n_fft: usize,
        hop_length: usize,
        sample_rate: u32,
    ) -> Result<Self, TransformError> {
        if data.len() != n_bins * n_frames {
            return Err(TransformError::InvalidParameter(format!(
                "data length {} does not match {} bins x {} frames",
                data.len(),
                n_bins,
                n_frames
            )));
        }
        Ok(Self {
            data,
            n_bins,
            n_frames,
            n_fft,
            hop_length,
            sample_rate,
            magnitude_cache: OnceLock::new(),
            power_cache: OnceLock::new(),
        })
    }

    /// Number of frequency bins (n_fft/2 + 1 for computed spectrograms)
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Number of time frames
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// FFT size used for analysis
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Hop length in samples
    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Sample rate of the analyzed audio in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// True if the spectrogram holds no frames
    pub fn is_empty(&self) -> bool {
        self.n_frames == 0 || self.n_bins == 0
    }

    /// Duration in seconds (n_frames * hop_length / sample_rate)
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (self.n_frames * self.hop_length) as f32 / self.sample_rate as f32
    }

    /// Complex spectrum, bin-major [n_bins * n_frames]
    pub fn data(&self) -> &[Complex<f32>] {
        &self.data
    }

    /// Complex value at (bin, frame) with bounds checking
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` if either index is out of range.
    pub fn at(&self, bin: usize, frame: usize) -> Result<Complex<f32>, TransformError> {
        if bin >= self.n_bins {
            return Err(TransformError::InvalidParameter(format!(
                "bin index {} out of range ({} bins)",
                bin, self.n_bins
            )));
        }
        if frame >= self.n_frames {
            return Err(TransformError::InvalidParameter(format!(
                "frame index {} out of range ({} frames)",
                frame, self.n_frames
            )));
        }
        Ok(self.data[bin * self.n_frames + frame])
    }

    /// Magnitude spectrum [n_bins * n_frames], computed lazily and memoized
    pub fn magnitude(&self) -> &[f32] {
        self.magnitude_cache
            .get_or_init(|| self.data.iter().map(|c| c.norm()).collect())
    }

    /// Power spectrum [n_bins * n_frames], computed lazily and memoized
    pub fn power(&self) -> &[f32] {
        self.power_cache.get_or_init(|| {
            self.data
                .iter()
                .map(|c| {
                    let mag = c.norm();
                    mag * mag
                })
                .collect()
        })
    }

    /// Magnitude in decibels: `10 * log10(max(power, amin^2) / ref^2)`
    pub fn to_db(&self, reference: f32, amin: f32) -> Vec<f32> {
        let ref_power = reference * reference;
        self.power()
            .iter()
            .map(|&p| 10.0 * (p.max(amin * amin) / ref_power).log10())
            .collect()
    }

    /// Reconstruct audio via windowed overlap-add (inverse STFT)
    ///
    /// `length` of `None` trims `n_fft/2` from each end of the reconstruction,
    /// undoing the forward center padding; `Some(len)` clips the trim window
    /// to `len` samples instead.
    pub fn to_audio(
        &self,
        length: Option<usize>,
        window: WindowType,
    ) -> Result<AudioBuffer, TransformError> {
        let mut cache = WindowCache::new();
        self.to_audio_with(length, window, &mut cache)
    }

    /// Reconstruct audio with an explicit window cache
    pub fn to_audio_with(
        &self,
        length: Option<usize>,
        window: WindowType,
        cache: &mut WindowCache,
    ) -> Result<AudioBuffer, TransformError> {
        if self.is_empty() {
            return Ok(AudioBuffer::empty(self.sample_rate));
        }

        if self.n_bins != self.n_fft / 2 + 1 {
            return Err(TransformError::InvalidParameter(format!(
                "bin count {} does not match n_fft {} (expected {})",
                self.n_bins,
                self.n_fft,
                self.n_fft / 2 + 1
            )));
        }

        log::debug!(
            "Inverse STFT: {} bins x {} frames, n_fft={}, hop={}",
            self.n_bins,
            self.n_frames,
            self.n_fft,
            self.hop_length
        );

        let synthesis_window = cache.get(window, self.n_fft).to_vec();

        let full_length = (self.n_frames - 1) * self.hop_length + self.n_fft;
        let mut output = vec![0.0f32; full_length];
        let mut window_sum = vec![0.0f32; full_length];

        let mut fft = Fft::new(self.n_fft)?;
        let mut frame_spectrum = vec![Complex::new(0.0, 0.0); self.n_bins];
        let mut frame = vec![0.0f32; self.n_fft];

        for t in 0..self.n_frames {
            for (f, value) in frame_spectrum.iter_mut().enumerate() {
                *value = self.data[f * self.n_frames + t];
            }

            fft.inverse(&frame_spectrum, &mut frame)?;

            let start = t * self.hop_length;
            for i in 0..self.n_fft {
                let w = synthesis_window[i];
                output[start + i] += frame[i] * w;
                window_sum[start + i] += w * w;
            }
        }

        // COLA normalization; samples with negligible window energy stay zero
        for (sample, &energy) in output.iter_mut().zip(window_sum.iter()) {
            if energy > COLA_EPSILON {
                *sample /= energy;
            }
        }

        // Undo the forward center padding, or honor an explicit target length
        let trim_start = self.n_fft / 2;
        let trim_end = match length {
            Some(len) => (trim_start + len).min(full_length),
            None => full_length - self.n_fft / 2,
        };

        if trim_start < trim_end && trim_start < full_length {
            let trimmed = output[trim_start..trim_end.min(full_length)].to_vec();
            return Ok(AudioBuffer::from_vec(trimmed, self.sample_rate));
        }

        Ok(AudioBuffer::from_vec(output, self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sr: u32, len: usize) -> AudioBuffer {
        let samples: Vec<f32> = (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect();
        AudioBuffer::from_vec(samples, sr)
    }

    #[test]
    fn test_empty_input_yields_empty_spectrogram() {
        let audio = AudioBuffer::empty(44100);
        let spec = Spectrogram::compute(&audio, &StftConfig::default()).unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.n_frames(), 0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let audio = sine(440.0, 44100, 4096);

        let config = StftConfig {
            n_fft: 0,
            ..StftConfig::default()
        };
        assert!(Spectrogram::compute(&audio, &config).is_err());

        let config = StftConfig {
            hop_length: 0,
            ..StftConfig::default()
        };
        assert!(Spectrogram::compute(&audio, &config).is_err());

        let config = StftConfig {
            n_fft: 1024,
            win_length: 2048,
            ..StftConfig::default()
        };
        assert!(Spectrogram::compute(&audio, &config).is_err());
    }

    #[test]
    fn test_frame_count_and_bins() {
        let sr = 44100;
        let audio = sine(440.0, sr, 4096);
        let config = StftConfig {
            n_fft: 1024,
            hop_length: 256,
            center: true,
            ..StftConfig::default()
        };
        let spec = Spectrogram::compute(&audio, &config).unwrap();

        // center pads by n_fft/2 on each side: padded = 4096 + 1024
        let padded = 4096 + 1024;
        assert_eq!(spec.n_frames(), 1 + (padded - 1024) / 256);
        assert_eq!(spec.n_bins(), 513);
        assert_eq!(spec.sample_rate(), sr);
    }

    #[test]
    fn test_short_signal_single_frame() {
        let audio = sine(440.0, 44100, 16);
        let config = StftConfig {
            n_fft: 1024,
            hop_length: 256,
            center: false,
            ..StftConfig::default()
        };
        let spec = Spectrogram::compute(&audio, &config).unwrap();
        assert_eq!(spec.n_frames(), 1);
    }

    #[test]
    fn test_peak_bin_tracks_frequency() {
        let sr = 44100;
        let freq = 1378.125; // exactly bin 32 at n_fft=1024
        let audio = sine(freq, sr, 8192);
        let config = StftConfig {
            n_fft: 1024,
            hop_length: 512,
            ..StftConfig::default()
        };
        let spec = Spectrogram::compute(&audio, &config).unwrap();

        let mid = spec.n_frames() / 2;
        let mut peak_bin = 0;
        let mut peak_mag = 0.0f32;
        for bin in 0..spec.n_bins() {
            let mag = spec.at(bin, mid).unwrap().norm();
            if mag > peak_mag {
                peak_mag = mag;
                peak_bin = bin;
            }
        }
        assert_eq!(peak_bin, 32);
    }

    #[test]
    fn test_power_equals_magnitude_squared() {
        let audio = sine(440.0, 44100, 4096);
        let spec = Spectrogram::compute(&audio, &StftConfig::default()).unwrap();
        let mag = spec.magnitude();
        let power = spec.power();
        assert_eq!(mag.len(), power.len());
        for (m, p) in mag.iter().zip(power.iter()) {
            if *p > 1e-12 {
                let rel = (m * m - p).abs() / p;
                assert!(rel < 1e-3);
            }
        }
    }

    #[test]
    fn test_at_bounds_checked() {
        let audio = sine(440.0, 44100, 4096);
        let spec = Spectrogram::compute(&audio, &StftConfig::default()).unwrap();
        assert!(spec.at(0, 0).is_ok());
        assert!(spec.at(spec.n_bins(), 0).is_err());
        assert!(spec.at(0, spec.n_frames()).is_err());
    }

    #[test]
    fn test_roundtrip_cola() {
        // Hann with 75% overlap satisfies COLA
        let sr = 22050;
        let len = 8192;
        let audio = sine(440.0, sr, len);
        let config = StftConfig {
            n_fft: 1024,
            hop_length: 256,
            window: WindowType::Hann,
            center: true,
            ..StftConfig::default()
        };
        let spec = Spectrogram::compute(&audio, &config).unwrap();
        let rec = spec.to_audio(Some(len), WindowType::Hann).unwrap();

        assert_eq!(rec.len(), len);
        // Compare away from the edges where windowing effects dominate
        let margin = 1024;
        for i in margin..len - margin {
            let err = (audio[i] - rec[i]).abs();
            assert!(err < 1e-3, "sample {} differs by {}", i, err);
        }
    }

    #[test]
    fn test_progress_reported_in_order() {
        let audio = sine(440.0, 44100, 44100);
        let mut reported: Vec<f32> = Vec::new();
        let mut cache = WindowCache::new();
        let mut cb = |p: f32| reported.push(p);
        Spectrogram::compute_with(&audio, &StftConfig::default(), &mut cache, Some(&mut cb))
            .unwrap();

        assert!(!reported.is_empty());
        assert!(reported.len() <= 101);
        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
        assert!((reported.last().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_complex_validates_shape() {
        let data = vec![Complex::new(0.0, 0.0); 10];
        assert!(Spectrogram::from_complex(data.clone(), 3, 4, 4, 2, 44100).is_err());
        assert!(Spectrogram::from_complex(data, 2, 5, 2, 2, 44100).is_ok());
    }

    #[test]
    fn test_duration() {
        let audio = sine(440.0, 44100, 44100);
        let config = StftConfig::default();
        let spec = Spectrogram::compute(&audio, &config).unwrap();
        let expected = (spec.n_frames() * config.hop_length) as f32 / 44100.0;
        assert!((spec.duration() - expected).abs() < 1e-6);
    }
}
