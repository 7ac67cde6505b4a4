//! Unit conversions between Hz, MIDI notes, frames, samples, and FFT bins

use crate::error::TransformError;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert frequency in Hz to MIDI note number (A4 = 440 Hz = 69)
pub fn hz_to_midi(hz: f32) -> f32 {
    69.0 + 12.0 * (hz / 440.0).log2()
}

/// Convert MIDI note number to frequency in Hz
pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * 2.0f32.powf((midi - 69.0) / 12.0)
}

/// Convert frequency in Hz to the nearest note name (e.g. "A4", "C#5")
pub fn hz_to_note(hz: f32) -> String {
    let midi = hz_to_midi(hz).round() as i32;
    let class = midi.rem_euclid(12) as usize;
    let octave = midi / 12 - 1;
    format!("{}{}", NOTE_NAMES[class], octave)
}

/// Convert a note name (e.g. "A4", "C#5", "Db4") to frequency in Hz
///
/// # Errors
///
/// Returns `TransformError::InvalidParameter` for unparseable note names.
pub fn note_to_hz(note: &str) -> Result<f32, TransformError> {
    let bytes = note.as_bytes();
    if bytes.is_empty() {
        return Err(TransformError::InvalidParameter(
            "empty note name".to_string(),
        ));
    }

    let letter = bytes[0].to_ascii_uppercase();
    let mut class: i32 = match letter {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => {
            return Err(TransformError::InvalidParameter(format!(
                "invalid note name: {}",
                note
            )))
        }
    };

    let mut rest = &note[1..];
    if let Some(stripped) = rest.strip_prefix('#') {
        class += 1;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('b') {
        class -= 1;
        rest = stripped;
    }

    let octave: i32 = rest.parse().map_err(|_| {
        TransformError::InvalidParameter(format!("invalid note name: {}", note))
    })?;

    let midi = (octave + 1) * 12 + class;
    Ok(midi_to_hz(midi as f32))
}

/// Convert a frame index to time in seconds
pub fn frames_to_time(frames: usize, sample_rate: u32, hop_length: usize) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    (frames * hop_length) as f32 / sample_rate as f32
}

/// Convert time in seconds to a frame index (floor)
pub fn time_to_frames(time: f32, sample_rate: u32, hop_length: usize) -> usize {
    if hop_length == 0 {
        return 0;
    }
    ((time * sample_rate as f32) / hop_length as f32).floor().max(0.0) as usize
}

/// Convert a sample count to time in seconds
pub fn samples_to_time(samples: usize, sample_rate: u32) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples as f32 / sample_rate as f32
}

/// Convert time in seconds to a sample count
pub fn time_to_samples(time: f32, sample_rate: u32) -> usize {
    (time * sample_rate as f32).max(0.0) as usize
}

/// Convert an FFT bin index to its center frequency in Hz
pub fn fft_bin_to_hz(bin: usize, sample_rate: u32, n_fft: usize) -> f32 {
    if n_fft == 0 {
        return 0.0;
    }
    bin as f32 * sample_rate as f32 / n_fft as f32
}

/// Convert a frequency in Hz to the nearest FFT bin index
pub fn hz_to_fft_bin(hz: f32, sample_rate: u32, n_fft: usize) -> usize {
    if sample_rate == 0 {
        return 0;
    }
    (hz * n_fft as f32 / sample_rate as f32).round().max(0.0) as usize
}
