//! Constant-Q Transform for pitch-aligned music analysis
//!
//! The CQT correlates the signal against a bank of matched filters with
//! geometrically spaced center frequencies (one octave = `bins_per_octave`
//! bins) and per-bin filter lengths, so every bin has the same Q. Filters are
//! precomputed in the frequency domain as a [`CqtKernel`] and applied per
//! frame via frequency-domain correlation.

use std::f32::consts::TAU;
use std::sync::OnceLock;

use rustfft::num_complex::Complex;

use crate::config::CqtConfig;
use crate::error::TransformError;
use crate::io::AudioBuffer;
use crate::transforms::fft::Fft;
use crate::transforms::spectrogram::ProgressFn;
use crate::transforms::window::{create_window, WindowType};

/// Accumulated synthesis weight below this is treated as zero
const WEIGHT_EPSILON: f32 = 1e-6;

/// Center frequencies for a CQT configuration: `fmin * 2^(k / bins_per_octave)`
pub fn cqt_frequencies(fmin: f32, n_bins: usize, bins_per_octave: usize) -> Vec<f32> {
    (0..n_bins)
        .map(|k| fmin * 2.0f32.powf(k as f32 / bins_per_octave as f32))
        .collect()
}

/// Q factor for a CQT configuration
pub(crate) fn compute_q(bins_per_octave: usize, filter_scale: f32) -> f32 {
    filter_scale / (2.0f32.powf(1.0 / bins_per_octave as f32) - 1.0)
}

pub(crate) fn validate_geometry(
    fmin: f32,
    n_bins: usize,
    bins_per_octave: usize,
    sample_rate: u32,
) -> Result<(), TransformError> {
    if fmin <= 0.0 {
        return Err(TransformError::InvalidParameter(format!(
            "fmin must be > 0, got {}",
            fmin
        )));
    }
    if n_bins == 0 {
        return Err(TransformError::InvalidParameter(
            "n_bins must be > 0".to_string(),
        ));
    }
    if bins_per_octave == 0 {
        return Err(TransformError::InvalidParameter(
            "bins_per_octave must be > 0".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(TransformError::InvalidParameter(
            "sample rate must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Precomputed frequency-domain CQT filter bank
///
/// Construction is a pure function of `(sample_rate, config)`: building twice
/// from identical inputs yields identical kernels. Build once and reuse via
/// [`cqt_with_kernel`] when transforming many signals with the same
/// configuration.
#[derive(Debug, Clone)]
pub struct CqtKernel {
    fft_length: usize,
    n_bins: usize,
    frequencies: Vec<f32>,
    /// Conjugated frequency-domain filters, [n_bins * (fft_length/2 + 1)]
    data: Vec<Complex<f32>>,
    /// Time-domain filter length per bin
    lengths: Vec<usize>,
}

impl CqtKernel {
    /// Build the kernel for a sample rate and configuration
    ///
    /// Per-bin filter length is `ceil(Q * sr / f_k)`, so lower bins get
    /// proportionally longer filters; the shared FFT length is the next power
    /// of two at or above the longest filter. Each filter is a window-sum
    /// normalized real cosine, transformed and stored conjugated so that the
    /// later frequency-domain multiply is a correlation.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` for non-positive `fmin`,
    /// `n_bins`, `bins_per_octave`, or sample rate.
    pub fn build(sample_rate: u32, config: &CqtConfig) -> Result<Self, TransformError> {
        validate_geometry(config.fmin, config.n_bins, config.bins_per_octave, sample_rate)?;

        let q = compute_q(config.bins_per_octave, config.filter_scale);
        let frequencies = cqt_frequencies(config.fmin, config.n_bins, config.bins_per_octave);

        let sr = sample_rate as f32;
        let lengths: Vec<usize> = frequencies
            .iter()
            .map(|&f| (q * sr / f).ceil() as usize)
            .collect();
        let max_length = lengths.iter().copied().max().unwrap_or(1).max(1);
        let fft_length = max_length.next_power_of_two();

        log::debug!(
            "Building CQT kernel: {} bins, fmin={:.2} Hz, Q={:.2}, fft_length={}",
            config.n_bins,
            config.fmin,
            q,
            fft_length
        );

        Self::build_filters(fft_length, frequencies, lengths, sample_rate, config.window)
    }

    /// Shared FFT generation path for CQT and VQT kernels
    pub(crate) fn build_filters(
        fft_length: usize,
        frequencies: Vec<f32>,
        lengths: Vec<usize>,
        sample_rate: u32,
        window: WindowType,
    ) -> Result<Self, TransformError> {
        let n_bins = frequencies.len();
        let fft_bins = fft_length / 2 + 1;
        let sr = sample_rate as f32;

        let mut fft = Fft::new(fft_length)?;
        let mut data = vec![Complex::new(0.0, 0.0); n_bins * fft_bins];
        let mut time_kernel = vec![0.0f32; fft_length];
        let mut freq_kernel = vec![Complex::new(0.0, 0.0); fft_bins];

        for k in 0..n_bins {
            let freq = frequencies[k];
            let length = lengths[k].min(fft_length).max(1);

            let win = create_window(window, length);
            let win_sum: f32 = win.iter().sum();
            if win_sum <= 0.0 {
                return Err(TransformError::ProcessingError(format!(
                    "degenerate window for bin {} (length {})",
                    k, length
                )));
            }
            let norm = 1.0 / win_sum;

            // Windowed real cosine at the bin's center frequency
            time_kernel.fill(0.0);
            for (n, w) in win.iter().enumerate() {
                let phase = TAU * freq * n as f32 / sr;
                time_kernel[n] = w * norm * phase.cos();
            }

            fft.forward(&time_kernel, &mut freq_kernel)?;

            // Conjugate so the frequency-domain multiply correlates rather
            // than convolves
            for (i, value) in freq_kernel.iter().enumerate() {
                data[k * fft_bins + i] = value.conj();
            }
        }

        Ok(Self {
            fft_length,
            n_bins,
            frequencies,
            data,
            lengths,
        })
    }

    /// Shared FFT length used by all filters
    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    /// Number of frequency bins
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Center frequency per bin in Hz
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Time-domain filter length per bin
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Conjugated frequency-domain filter for one bin
    pub fn row(&self, bin: usize) -> &[Complex<f32>] {
        let fft_bins = self.fft_length / 2 + 1;
        &self.data[bin * fft_bins..(bin + 1) * fft_bins]
    }
}

/// Complex CQT/VQT coefficients with per-bin center frequencies
///
/// Bin-major storage like [`crate::transforms::spectrogram::Spectrogram`];
/// magnitude and power are computed lazily on first access and memoized.
#[derive(Debug, Clone)]
pub struct CqtResult {
    data: Vec<Complex<f32>>,
    n_bins: usize,
    n_frames: usize,
    hop_length: usize,
    sample_rate: u32,
    frequencies: Vec<f32>,
    magnitude_cache: OnceLock<Vec<f32>>,
    power_cache: OnceLock<Vec<f32>>,
}

impl CqtResult {
    /// Create a result from computed data (bin-major)
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` if the data or frequency
    /// array shapes do not match `n_bins`/`n_frames`.
    pub fn from_complex(
        data: Vec<Complex<f32>>,
        n_bins: usize,
        n_frames: usize,
        frequencies: Vec<f32>,
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
        if frequencies.len() != n_bins {
            return Err(TransformError::InvalidParameter(format!(
                "frequency array length {} does not match bin count {}",
                frequencies.len(),
                n_bins
            )));
        }
        Ok(Self {
            data,
            n_bins,
            n_frames,
            hop_length,
            sample_rate,
            frequencies,
            magnitude_cache: OnceLock::new(),
            power_cache: OnceLock::new(),
        })
    }

    /// Number of frequency bins
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Number of time frames
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Hop length in samples
    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Sample rate of the analyzed audio in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Center frequency per bin in Hz
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// True if the result holds no frames
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

    /// Complex coefficients, bin-major [n_bins * n_frames]
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

    /// Magnitude [n_bins * n_frames], computed lazily and memoized
    pub fn magnitude(&self) -> &[f32] {
        self.magnitude_cache
            .get_or_init(|| self.data.iter().map(|c| c.norm()).collect())
    }

    /// Power [n_bins * n_frames], computed lazily and memoized
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
}

/// Compute the Constant-Q Transform of an audio signal
///
/// # Errors
///
/// Returns `TransformError::InvalidParameter` for an empty input signal or
/// non-positive `hop_length`, `fmin`, `n_bins`, or `bins_per_octave`. An
/// empty signal is rejected (unlike the STFT) because kernel-sized framing
/// cannot be inferred from it.
pub fn cqt(audio: &AudioBuffer, config: &CqtConfig) -> Result<CqtResult, TransformError> {
    cqt_with(audio, config, None)
}

/// Compute the CQT with an optional progress callback
pub fn cqt_with(
    audio: &AudioBuffer,
    config: &CqtConfig,
    progress: Option<ProgressFn<'_>>,
) -> Result<CqtResult, TransformError> {
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

    let kernel = CqtKernel::build(audio.sample_rate(), config)?;
    cqt_with_kernel(audio, &kernel, config.hop_length, progress)
}

/// Apply a prebuilt kernel to an audio signal
///
/// The kernel must have been built for the signal's sample rate. Each
/// hop-spaced frame (zero-padded at the signal tail) is transformed once and
/// correlated against every bin's filter in the frequency domain.
pub fn cqt_with_kernel(
    audio: &AudioBuffer,
    kernel: &CqtKernel,
    hop_length: usize,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<CqtResult, TransformError> {
    if audio.is_empty() {
        return Err(TransformError::InvalidParameter(
            "empty input signal".to_string(),
        ));
    }
    if hop_length == 0 {
        return Err(TransformError::InvalidParameter(
            "hop_length must be > 0".to_string(),
        ));
    }

    let fft_length = kernel.fft_length();
    let fft_bins = fft_length / 2 + 1;
    let n_bins = kernel.n_bins();
    let n_samples = audio.len();
    let signal = audio.samples();

    let n_frames = if n_samples >= fft_length {
        1 + (n_samples - fft_length) / hop_length
    } else {
        1
    };

    log::debug!(
        "Computing CQT: {} samples, {} bins, {} frames, fft_length={}",
        n_samples,
        n_bins,
        n_frames,
        fft_length
    );

    let mut output = vec![Complex::new(0.0, 0.0); n_bins * n_frames];

    let mut fft = Fft::new(fft_length)?;
    let mut frame = vec![0.0f32; fft_length];
    let mut frame_fft = vec![Complex::new(0.0, 0.0); fft_bins];

    let norm = 1.0 / fft_length as f32;
    let progress_interval = (n_frames / 20).max(1);

    for t in 0..n_frames {
        let start = t * hop_length;
        let valid = fft_length.min(n_samples.saturating_sub(start));

        frame.fill(0.0);
        frame[..valid].copy_from_slice(&signal[start..start + valid]);

        fft.forward(&frame, &mut frame_fft)?;

        for k in 0..n_bins {
            let row = kernel.row(k);
            let mut sum = Complex::new(0.0, 0.0);
            for (x, h) in frame_fft.iter().zip(row.iter()) {
                sum += x * h;
            }
            output[k * n_frames + t] = sum * norm;
        }

        if let Some(cb) = progress.as_mut() {
            if t % progress_interval == 0 || t == n_frames - 1 {
                cb((t + 1) as f32 / n_frames as f32);
            }
        }
    }

    CqtResult::from_complex(
        output,
        n_bins,
        n_frames,
        kernel.frequencies().to_vec(),
        hop_length,
        audio.sample_rate(),
    )
}

/// Approximate inverse CQT via overlap-added windowed sinusoids
///
/// Legacy low-fidelity reconstruction: synthesis uses a fixed semitone-based
/// Q regardless of the kernel the forward pass used. Kept for convenience;
/// it does not invert the transform exactly.
#[deprecated(note = "low-fidelity reconstruction; prefer griffin_lim on the CQT magnitude")]
pub fn icqt(result: &CqtResult, length: Option<usize>) -> AudioBuffer {
    if result.is_empty() {
        return AudioBuffer::empty(result.sample_rate());
    }

    let n_bins = result.n_bins();
    let n_frames = result.n_frames();
    let hop_length = result.hop_length();
    let sr = result.sample_rate() as f32;

    let output_length = length.unwrap_or(n_frames * hop_length);
    if output_length == 0 {
        return AudioBuffer::empty(result.sample_rate());
    }

    log::debug!(
        "Inverse CQT: {} bins x {} frames -> {} samples",
        n_bins,
        n_frames,
        output_length
    );

    let mut output = vec![0.0f32; output_length];
    let mut weight = vec![0.0f32; output_length];

    // Fixed semitone Q, independent of the forward kernel
    let q = 1.0 / (2.0f32.powf(1.0 / 12.0) - 1.0);
    let frequencies = result.frequencies();

    for t in 0..n_frames {
        let center = (t * hop_length) as isize;

        for k in 0..n_bins {
            let coef = result.data()[k * n_frames + t];
            let freq = frequencies[k];

            let filter_length = ((q * sr / freq) as usize).min(output_length).max(1);

            for n in 0..filter_length {
                let idx = center + n as isize - (filter_length / 2) as isize;
                if idx < 0 || idx >= output_length as isize {
                    continue;
                }
                let phase = TAU * freq * n as f32 / sr;
                let win = 0.5 * (1.0 - (TAU * n as f32 / filter_length as f32).cos());

                // Real part of coef * e^{i phase}
                let val = coef.re * phase.cos() - coef.im * phase.sin();
                output[idx as usize] += val * win;
                weight[idx as usize] += win;
            }
        }
    }

    for (sample, &w) in output.iter_mut().zip(weight.iter()) {
        if w > WEIGHT_EPSILON {
            *sample /= w;
        }
    }

    AudioBuffer::from_vec(output, result.sample_rate())
}

/// Fold CQT/VQT magnitudes into chroma (pitch-class) features
///
/// Bin `k` contributes to pitch class `k mod n_chroma`, summed across
/// octaves; each frame's chroma vector is then max-normalized into [0, 1].
/// Returns a chroma-major [n_chroma * n_frames] array, empty when the result
/// is empty.
pub fn cqt_to_chroma(result: &CqtResult, n_chroma: usize) -> Vec<f32> {
    if result.is_empty() || n_chroma == 0 {
        return Vec::new();
    }

    let n_bins = result.n_bins();
    let n_frames = result.n_frames();
    let mag = result.magnitude();

    let mut chroma = vec![0.0f32; n_chroma * n_frames];

    for t in 0..n_frames {
        for k in 0..n_bins {
            let c = k % n_chroma;
            chroma[c * n_frames + t] += mag[k * n_frames + t];
        }
    }

    for t in 0..n_frames {
        let mut max_val = 0.0f32;
        for c in 0..n_chroma {
            max_val = max_val.max(chroma[c * n_frames + t]);
        }
        if max_val > WEIGHT_EPSILON {
            for c in 0..n_chroma {
                chroma[c * n_frames + t] /= max_val;
            }
        }
    }

    chroma
}
