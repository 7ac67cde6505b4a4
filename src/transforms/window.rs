//! Window function generators and the per-context window cache

use std::collections::HashMap;
use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowType {
    /// Hann (raised cosine) window
    Hann,
    /// Hamming window
    Hamming,
    /// Blackman window
    Blackman,
    /// Rectangular (boxcar) window
    Rectangular,
}

/// Create a window of the specified type
pub fn create_window(window: WindowType, length: usize) -> Vec<f32> {
    match window {
        WindowType::Hann => hann_window(length),
        WindowType::Hamming => hamming_window(length),
        WindowType::Blackman => blackman_window(length),
        WindowType::Rectangular => rectangular_window(length),
    }
}

/// Hann (raised cosine) window: `0.5 * (1 - cos(2*pi*i / (L-1)))`
///
/// Length 0 yields an empty vector; length 1 yields `[1.0]`.
pub fn hann_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![1.0; length];
    }
    let denom = (length - 1) as f32;
    (0..length)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / denom).cos()))
        .collect()
}

/// Hamming window: `0.54 - 0.46 * cos(2*pi*i / (L-1))`
///
/// Length 0 yields an empty vector; length 1 yields `[1.0]`.
pub fn hamming_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![1.0; length];
    }
    let denom = (length - 1) as f32;
    (0..length)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / denom).cos())
        .collect()
}

/// Blackman window: `0.42 - 0.5 * cos(2*pi*t) + 0.08 * cos(4*pi*t)`, `t = i/(L-1)`
///
/// Length 0 yields an empty vector; length 1 yields `[1.0]`.
pub fn blackman_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![1.0; length];
    }
    let denom = (length - 1) as f32;
    (0..length)
        .map(|i| {
            let t = i as f32 / denom;
            0.42 - 0.5 * (2.0 * PI * t).cos() + 0.08 * (4.0 * PI * t).cos()
        })
        .collect()
}

/// Rectangular (boxcar) window: all ones
pub fn rectangular_window(length: usize) -> Vec<f32> {
    vec![1.0; length]
}

/// Memoizing cache for window coefficient arrays
///
/// The cache is owned by the calling execution context and passed explicitly
/// where repeated lookups matter (STFT synthesis, Griffin-Lim iterations).
/// Entries are immutable once created; population is idempotent since window
/// generation is deterministic.
#[derive(Debug, Default)]
pub struct WindowCache {
    entries: HashMap<(WindowType, usize), Vec<f32>>,
}

impl WindowCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Coefficients for `(window, length)`, generating and memoizing on first use
    pub fn get(&mut self, window: WindowType, length: usize) -> &[f32] {
        self.entries
            .entry((window, length))
            .or_insert_with(|| create_window(window, length))
    }

    /// Number of distinct `(window, length)` entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no windows have been cached yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
