/// Sound engine: procedural animal calls and the hot/cold bell via rodio.
///
/// Every sound is synthesised into an in-memory WAV buffer at init time
/// and looked up by its asset handle (`Animal::sound`, `BELL_SOUND`).
/// Playback is fire-and-forget (non-blocking) via rodio's Sink; the
/// per-request volume goes on the sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::{debug, info, warn};

    use crate::sim::round::BELL_SOUND;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<&'static str, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    info!(error = %e, "no audio output; running silent");
                    return None;
                }
            };
            let buffers = bank()
                .into_iter()
                .map(|(asset, samples)| (asset, Arc::new(make_wav(&samples))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        /// Play `asset` at `volume` (0..1). Unknown assets and playback
        /// failures are logged and skipped.
        pub fn play(&self, asset: &str, volume: f32) {
            let buf = match self.buffers.get(asset) {
                Some(b) => b,
                None => {
                    debug!(asset, "no sound for asset");
                    return;
                }
            };
            if volume <= 0.0 { return; }
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, asset, "could not open audio sink");
                    return;
                }
            };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.set_volume(volume.clamp(0.0, 1.0));
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
                Err(e) => warn!(error = %e, asset, "could not decode sound"),
            }
        }
    }

    /// Asset handle → samples, for every sound the game can ask for.
    pub(super) fn bank() -> Vec<(&'static str, Vec<f32>)> {
        vec![
            (BELL_SOUND, gen_bell()),
            ("cow-sound", gen_moo()),
            ("pig-sound", gen_oink()),
            ("chicken-sound", gen_cluck()),
            ("sheep-sound", gen_baa()),
            ("horse-sound", gen_neigh()),
        ]
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Struck bell: inharmonic partials, exponential decay.
    fn gen_bell() -> Vec<f32> {
        let n = samples_for(0.6);
        let partials = [(880.0_f32, 0.6), (880.0 * 2.76, 0.25), (880.0 * 5.4, 0.15)];
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (-t * 6.0).exp();
                let wave: f32 = partials.iter()
                    .map(|&(f, a)| (t * f * 2.0 * PI).sin() * a)
                    .sum();
                wave * env * 0.35
            })
            .collect()
    }

    /// Moo: low buzzy glide down, slow swell and fade.
    fn gen_moo() -> Vec<f32> {
        let n = samples_for(0.9);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let r = i as f32 / n as f32;
                let freq = 160.0 - r * 50.0;
                phase += freq / SAMPLE_RATE as f32;
                // Sawtooth with a little sine to soften it
                let saw = 2.0 * (phase - phase.floor()) - 1.0;
                let wave = saw * 0.6 + (phase * 2.0 * PI).sin() * 0.4;
                let env = (r * 6.0).min(1.0) * (1.0 - r).powf(0.7);
                wave * env * 0.3
            })
            .collect()
    }

    /// Oink: three short nasal grunts.
    fn gen_oink() -> Vec<f32> {
        let mut samples = Vec::new();
        let mut rng: u32 = 2024;
        for grunt in 0..3 {
            let n = samples_for(0.11);
            let base = 220.0 + grunt as f32 * 30.0;
            for i in 0..n {
                let r = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let tone = (t * base * 2.0 * PI).sin().signum() * 0.5
                    + (t * base * 3.0 * 2.0 * PI).sin() * 0.3;
                let env = (1.0 - r).powf(1.5);
                samples.push((tone * 0.7 + noise * 0.3) * env * 0.28);
            }
            samples.extend(std::iter::repeat(0.0).take(samples_for(0.05)));
        }
        samples
    }

    /// Cluck: quick rising chirps.
    fn gen_cluck() -> Vec<f32> {
        let mut samples = Vec::new();
        for (k, dur) in [0.05_f32, 0.05, 0.12].into_iter().enumerate() {
            let n = samples_for(dur);
            for i in 0..n {
                let r = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                let freq = 700.0 + k as f32 * 150.0 + r * 400.0;
                let env = (1.0 - r).powf(0.5);
                samples.push((t * freq * 2.0 * PI).sin() * env * 0.25);
            }
            samples.extend(std::iter::repeat(0.0).take(samples_for(0.04)));
        }
        samples
    }

    /// Baa: bleating tone with fast tremolo.
    fn gen_baa() -> Vec<f32> {
        let n = samples_for(0.7);
        (0..n)
            .map(|i| {
                let r = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                let tremolo = 0.6 + 0.4 * (t * 28.0 * 2.0 * PI).sin();
                let wave = (t * 420.0 * 2.0 * PI).sin() * 0.6
                    + (t * 840.0 * 2.0 * PI).sin() * 0.25
                    + (t * 1260.0 * 2.0 * PI).sin() * 0.15;
                let env = (r * 10.0).min(1.0) * (1.0 - r);
                wave * tremolo * env * 0.3
            })
            .collect()
    }

    /// Neigh: high whinny sliding down with heavy vibrato.
    fn gen_neigh() -> Vec<f32> {
        let n = samples_for(1.0);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let r = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                let vibrato = (t * 12.0 * 2.0 * PI).sin() * 60.0 * (1.0 - r * 0.5);
                let freq = 950.0 - r * 500.0 + vibrato;
                phase += freq / SAMPLE_RATE as f32;
                let wave = (phase * 2.0 * PI).sin() * 0.8 + (phase * 4.0 * PI).sin() * 0.2;
                let env = (r * 12.0).min(1.0) * (1.0 - r).powf(1.2);
                wave * env * 0.25
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _asset: &str, _volume: f32) {}
}
