//! Time-frequency transform modules
//!
//! Leaves first: the FFT engine and window generators underpin the STFT, the
//! STFT underpins Griffin-Lim, and the kernel builders underpin CQT/VQT.

pub mod convert;
pub mod cqt;
pub mod fft;
pub mod griffin_lim;
pub mod spectrogram;
pub mod vqt;
pub mod window;
