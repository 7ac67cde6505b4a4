//! Shared mono sample buffer with zero-copy slicing
//!
//! Samples are mono f32, normalized to [-1, 1]. Slices share the backing
//! storage through an `Arc`, so slicing never copies; the storage is freed
//! when the last referencing buffer is dropped.

use std::ops::Index;
use std::sync::Arc;

/// Mono audio buffer with shared ownership and zero-copy slicing
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Shared backing storage
    buffer: Arc<Vec<f32>>,
    /// Offset of this view into the backing storage
    offset: usize,
    /// Number of samples in this view
    length: usize,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create an empty buffer with the given sample rate
    pub fn empty(sample_rate: u32) -> Self {
        Self {
            buffer: Arc::new(Vec::new()),
            offset: 0,
            length: 0,
            sample_rate,
        }
    }

    /// Create a buffer from a vector of samples (takes ownership, no copy)
    pub fn from_vec(samples: Vec<f32>, sample_rate: u32) -> Self {
        let length = samples.len();
        Self {
            buffer: Arc::new(samples),
            offset: 0,
            length,
            sample_rate,
        }
    }

    /// Create a buffer by copying a slice of samples
    pub fn from_slice(samples: &[f32], sample_rate: u32) -> Self {
        Self::from_vec(samples.to_vec(), sample_rate)
    }

    /// Samples of this buffer (view into the shared storage)
    pub fn samples(&self) -> &[f32] {
        &self.buffer[self.offset..self.offset + self.length]
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.length
    }

    /// True if the buffer contains no samples
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.length as f32 / self.sample_rate as f32
    }

    /// Zero-copy slice by time range
    ///
    /// `end_time` of `None` means the end of the buffer. Out-of-range times
    /// are clamped. The slice shares the backing storage and keeps the
    /// parent's sample rate.
    pub fn slice(&self, start_time: f32, end_time: Option<f32>) -> AudioBuffer {
        let start = (start_time.max(0.0) * self.sample_rate as f32) as usize;
        let end = end_time.map(|t| (t.max(0.0) * self.sample_rate as f32) as usize);
        self.slice_samples(start, end)
    }

    /// Zero-copy slice by sample indices
    ///
    /// `end` of `None` means the end of the buffer. Out-of-range indices are
    /// clamped; a start past the end yields an empty slice. Index 0 of the
    /// slice maps to sample `start` of this buffer.
    pub fn slice_samples(&self, start: usize, end: Option<usize>) -> AudioBuffer {
        let start = start.min(self.length);
        let end = end.unwrap_or(self.length).min(self.length).max(start);
        AudioBuffer {
            buffer: Arc::clone(&self.buffer),
            offset: self.offset + start,
            length: end - start,
            sample_rate: self.sample_rate,
        }
    }

    /// Iterator over the samples
    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.samples().iter()
    }
}

impl Index<usize> for AudioBuffer {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.samples()[index]
    }
}
