//! Example: Griffin-Lim reconstruction from a magnitude spectrogram
//!
//! Synthesizes a two-tone signal, discards its phase, reconstructs it with
//! Griffin-Lim, and writes both versions to WAV files for comparison.

use std::f32::consts::TAU;

use overtone_dsp::{griffin_lim, AudioBuffer, GriffinLimConfig, Spectrogram, StftConfig};

fn write_wav(path: &str, audio: &AudioBuffer) -> Result<(), Box<dyn std::error::Error>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in audio.iter() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let sr = 22050;
    let samples: Vec<f32> = (0..sr * 2)
        .map(|i| {
            let t = i as f32 / sr as f32;
            0.5 * (TAU * 220.0 * t).sin() + 0.3 * (TAU * 440.0 * t).sin()
        })
        .collect();
    let audio = AudioBuffer::from_vec(samples, sr as u32);

    let stft_config = StftConfig {
        n_fft: 1024,
        hop_length: 256,
        ..StftConfig::default()
    };
    let spec = Spectrogram::compute(&audio, &stft_config)?;
    println!(
        "Spectrogram: {} bins x {} frames ({:.2}s)",
        spec.n_bins(),
        spec.n_frames(),
        spec.duration()
    );

    let gl_config = GriffinLimConfig {
        n_iter: 32,
        momentum: 0.99,
    };
    let reconstructed = griffin_lim(
        spec.magnitude(),
        stft_config.n_fft,
        stft_config.hop_length,
        audio.sample_rate(),
        &gl_config,
    )?;
    println!("Reconstructed {} samples", reconstructed.len());

    write_wav("original.wav", &audio)?;
    write_wav("reconstructed.wav", &reconstructed)?;
    println!("Wrote original.wav and reconstructed.wav");

    Ok(())
}
