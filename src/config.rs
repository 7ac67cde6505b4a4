//! Configuration parameters for the transforms

use serde::{Deserialize, Serialize};

use crate::transforms::window::WindowType;

/// STFT configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StftConfig {
    /// FFT size in samples (default: 2048)
    pub n_fft: usize,

    /// Hop length between successive frames in samples (default: 512)
    pub hop_length: usize,

    /// Window length in samples (default: 0 = use n_fft)
    /// Must not exceed n_fft; shorter windows are zero-padded symmetrically
    pub win_length: usize,

    /// Window function applied to each frame (default: Hann)
    pub window: WindowType,

    /// Pad the signal by n_fft/2 on each side so frame t is centered
    /// on sample t * hop_length (default: true)
    pub center: bool,
}

impl StftConfig {
    /// Actual window length (win_length, or n_fft when win_length is 0)
    pub fn actual_win_length(&self) -> usize {
        if self.win_length > 0 {
            self.win_length
        } else {
            self.n_fft
        }
    }
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            win_length: 0,
            window: WindowType::Hann,
            center: true,
        }
    }
}

/// Griffin-Lim configuration parameters
///
/// Griffin-Lim iteratively estimates phase from a magnitude spectrogram.
/// Momentum accelerates convergence but may oscillate if set too high.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GriffinLimConfig {
    /// Number of iterations (default: 32, typically 16-64)
    pub n_iter: usize,

    /// Momentum factor in [0, 1) (default: 0.99)
    /// 0 disables momentum blending entirely
    pub momentum: f32,
}

impl Default for GriffinLimConfig {
    fn default() -> Self {
        Self {
            n_iter: 32,
            momentum: 0.99,
        }
    }
}

/// CQT configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CqtConfig {
    /// Hop length between successive frames in samples (default: 512)
    pub hop_length: usize,

    /// Minimum (lowest bin) frequency in Hz (default: 32.7, C1)
    pub fmin: f32,

    /// Number of frequency bins (default: 84 = 7 octaves * 12)
    pub n_bins: usize,

    /// Bins per octave (default: 12 for semitone spacing)
    pub bins_per_octave: usize,

    /// Filter length scale factor (default: 1.0)
    pub filter_scale: f32,

    /// Window function applied to each filter (default: Hann)
    pub window: WindowType,

    /// Kernel sparsity threshold, reserved for future use (default: 0.01)
    pub sparsity: f32,
}

impl Default for CqtConfig {
    fn default() -> Self {
        Self {
            hop_length: 512,
            fmin: 32.7,
            n_bins: 84,
            bins_per_octave: 12,
            filter_scale: 1.0,
            window: WindowType::Hann,
            sparsity: 0.01,
        }
    }
}

/// VQT configuration parameters
///
/// The VQT extends the CQT with a variable Q factor controlled by `gamma`.
/// With `gamma = 0` the VQT is equivalent to the CQT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VqtConfig {
    /// Hop length between successive frames in samples (default: 512)
    pub hop_length: usize,

    /// Minimum (lowest bin) frequency in Hz (default: 32.7, C1)
    pub fmin: f32,

    /// Maximum frequency in Hz, unused when n_bins is given (default: 0 = auto)
    pub fmax: f32,

    /// Number of frequency bins (default: 84 = 7 octaves * 12)
    pub n_bins: usize,

    /// Bins per octave (default: 12 for semitone spacing)
    pub bins_per_octave: usize,

    /// Filter length scale factor (default: 1.0)
    pub filter_scale: f32,

    /// Bandwidth offset in Hz (default: 0 = standard CQT behavior)
    pub gamma: f32,

    /// Window function applied to each filter (default: Hann)
    pub window: WindowType,

    /// Kernel sparsity threshold, reserved for future use (default: 0.01)
    pub sparsity: f32,
}

impl VqtConfig {
    /// Convert to the equivalent CQT configuration (used for the gamma = 0 case)
    pub fn to_cqt_config(&self) -> CqtConfig {
        CqtConfig {
            hop_length: self.hop_length,
            fmin: self.fmin,
            n_bins: self.n_bins,
            bins_per_octave: self.bins_per_octave,
            filter_scale: self.filter_scale,
            window: self.window,
            sparsity: self.sparsity,
        }
    }
}

impl Default for VqtConfig {
    fn default() -> Self {
        Self {
            hop_length: 512,
            fmin: 32.7,
            fmax: 0.0,
            n_bins: 84,
            bins_per_octave: 12,
            filter_scale: 1.0,
            gamma: 0.0,
            window: WindowType::Hann,
            sparsity: 0.01,
        }
    }
}
