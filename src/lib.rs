//! # Overtone DSP
//!
//! Time-frequency transforms for music analysis: an STFT engine with
//! overlap-add inversion, kernel-based Constant-Q / Variable-Q Transforms for
//! pitch-aligned spectra, and Griffin-Lim phase reconstruction from
//! magnitude-only spectrograms.
//!
//! ## Quick Start
//!
//! ```no_run
//! use overtone_dsp::{AudioBuffer, Spectrogram, StftConfig};
//!
//! // Decoded mono samples, normalized to [-1.0, 1.0]
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let audio = AudioBuffer::from_vec(samples, 44100);
//!
//! let spec = Spectrogram::compute(&audio, &StftConfig::default())?;
//! println!("{} bins x {} frames", spec.n_bins(), spec.n_frames());
//! # Ok::<(), overtone_dsp::TransformError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Audio Input → STFT → Spectrogram → Griffin-Lim / overlap-add synthesis
//!            → CQT/VQT kernel → CqtResult → chroma folding
//! ```
//!
//! Everything is synchronous and CPU-bound. For parallel processing, give
//! each thread its own transform call; result objects are immutable value
//! types once constructed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod io;
pub mod transforms;

// Re-export main types
pub use config::{CqtConfig, GriffinLimConfig, StftConfig, VqtConfig};
pub use error::TransformError;
pub use io::AudioBuffer;
pub use transforms::cqt::{cqt, cqt_frequencies, cqt_to_chroma, CqtKernel, CqtResult};
pub use transforms::fft::Fft;
pub use transforms::griffin_lim::griffin_lim;
pub use transforms::spectrogram::Spectrogram;
pub use transforms::vqt::{vqt, vqt_bandwidths, VqtKernel, VqtResult};
pub use transforms::window::{create_window, WindowCache, WindowType};
