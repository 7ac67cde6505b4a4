//! Example: chroma features from the Constant-Q Transform
//!
//! Synthesizes an A minor arpeggio and prints the chroma vector of each
//! frame as a simple text heat map.

use std::f32::consts::TAU;

use overtone_dsp::{cqt, cqt_to_chroma, AudioBuffer, CqtConfig};

const NOTE_NAMES: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let sr = 22050u32;
    // A minor arpeggio: A3, C4, E4, repeated
    let notes = [220.0f32, 261.63, 329.63];
    let note_len = sr as usize / 2;

    let mut samples = Vec::with_capacity(note_len * notes.len() * 2);
    for _ in 0..2 {
        for &freq in &notes {
            for i in 0..note_len {
                samples.push(0.5 * (TAU * freq * i as f32 / sr as f32).sin());
            }
        }
    }
    let audio = AudioBuffer::from_vec(samples, sr);

    let config = CqtConfig {
        fmin: 110.0, // A2
        n_bins: 48,
        hop_length: 2048,
        ..CqtConfig::default()
    };
    let result = cqt(&audio, &config)?;
    let chroma = cqt_to_chroma(&result, 12);

    println!(
        "CQT: {} bins x {} frames, {:.2}s",
        result.n_bins(),
        result.n_frames(),
        result.duration()
    );

    for c in 0..12 {
        print!("{:>2} ", NOTE_NAMES[c]);
        for t in 0..result.n_frames() {
            let v = chroma[c * result.n_frames() + t];
            let glyph = match (v * 4.0) as u32 {
                0 => ' ',
                1 => '.',
                2 => ':',
                3 => '*',
                _ => '#',
            };
            print!("{}", glyph);
        }
        println!();
    }

    Ok(())
}
