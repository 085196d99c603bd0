/// Sound engine: procedural chiptune effects via rodio.
///
/// Effect buffers are rendered to in-memory WAV once at startup;
/// countdown blips are rendered on demand since their pitch varies.
/// Effects are fire-and-forget through detached Sinks. Background music
/// is a short generated phrase looped forever on its own quieter Sink.
///
/// Without the "sound" feature the stub SoundEngine below does nothing.

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    const SAMPLE_RATE: u32 = 22050;
    const MUSIC_VOLUME: f32 = 0.3;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_flip: Arc<Vec<u8>>,
        sfx_match: Arc<Vec<u8>>,
        sfx_fail: Arc<Vec<u8>>,
        sfx_go: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
        music: Arc<Vec<u8>>,
        music_sink: Option<Sink>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let music_sink = Sink::try_new(&handle).ok();
            if let Some(sink) = &music_sink {
                sink.set_volume(MUSIC_VOLUME);
            }

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_flip: Arc::new(make_wav(&gen_flip())),
                sfx_match: Arc::new(make_wav(&gen_match())),
                sfx_fail: Arc::new(make_wav(&gen_fail())),
                sfx_go: Arc::new(make_wav(&gen_go())),
                sfx_win: Arc::new(make_wav(&gen_win())),
                music: Arc::new(make_wav(&gen_music())),
                music_sink,
            })
        }

        fn play_bytes(&self, bytes: Vec<u8>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(bytes)) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            self.play_bytes(buf.as_ref().clone());
        }

        /// Memorize countdown tick; the last three seconds sound higher.
        pub fn play_countdown_blip(&self, remaining: u32) {
            let freq = if remaining <= 3 { 880.0 } else { 440.0 };
            self.play_bytes(make_wav(&notes(&[(freq, 0.06)], 0.2, 0.22)));
        }

        /// Start the music loop if it isn't already running.
        pub fn start_music(&self) {
            let sink = match &self.music_sink {
                Some(s) => s,
                None => return,
            };
            if sink.empty() {
                match rodio::Decoder::new(Cursor::new(self.music.as_ref().clone())) {
                    Ok(src) => sink.append(src.repeat_infinite()),
                    Err(e) => {
                        tracing::warn!("music unavailable: {e}");
                        return;
                    }
                }
            }
            sink.play();
        }

        pub fn stop_music(&self) {
            if let Some(sink) = &self.music_sink {
                sink.stop();
            }
        }

        pub fn play_flip(&self) { self.play(&self.sfx_flip); }
        pub fn play_match(&self) { self.play(&self.sfx_match); }
        pub fn play_fail(&self) { self.play(&self.sfx_fail); }
        pub fn play_go(&self) { self.play(&self.sfx_go); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
    }

    // ── Waveform generators (mono f32 samples) ──

    /// Sequence of (freq, seconds) notes. `overtone` mixes in the octave
    /// for a brighter timbre; each note decays linearly.
    fn notes(seq: &[(f32, f32)], overtone: f32, volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, dur) in seq {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                let wave = (t * freq * TAU).sin() * (1.0 - overtone)
                    + (t * freq * 2.0 * TAU).sin() * overtone;
                out.push(wave * env * volume);
            }
        }
        out
    }

    /// Card turn: very short upward chirp
    fn gen_flip() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.04) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                let freq = 700.0 + p * 500.0;
                (t * freq * TAU).sin() * (1.0 - p) * 0.2
            })
            .collect()
    }

    /// Pair found: bright rising fifth E5→B5
    fn gen_match() -> Vec<f32> {
        notes(&[(659.0, 0.07), (988.0, 0.16)], 0.3, 0.28)
    }

    /// Pair turned back: low falling minor second with square-ish edge
    fn gen_fail() -> Vec<f32> {
        let mut s = notes(&[(233.0, 0.09), (220.0, 0.16)], 0.0, 0.25);
        for v in s.iter_mut() {
            *v = v.signum() * v.abs().sqrt() * 0.5;
        }
        s
    }

    /// Play phase begins
    fn gen_go() -> Vec<f32> {
        notes(&[(1319.0, 0.12)], 0.25, 0.25)
    }

    /// Board cleared: C major arpeggio with a held top note
    fn gen_win() -> Vec<f32> {
        notes(
            &[(523.0, 0.09), (659.0, 0.09), (784.0, 0.09), (1047.0, 0.35)],
            0.3,
            0.3,
        )
    }

    /// Background loop: a soft four-bar phrase over I-vi-IV-V
    fn gen_music() -> Vec<f32> {
        const BEAT: f32 = 0.25;
        let phrase = [
            523.0, 659.0, 784.0, 659.0, // C
            440.0, 523.0, 659.0, 523.0, // Am
            349.0, 440.0, 523.0, 440.0, // F
            392.0, 494.0, 587.0, 494.0, // G
        ];
        let seq: Vec<(f32, f32)> = phrase.iter().map(|&f| (f, BEAT)).collect();
        let mut out = notes(&seq, 0.15, 0.2);
        // Bass roots, one note per bar
        let bass: Vec<(f32, f32)> = [131.0, 110.0, 87.0, 98.0]
            .iter()
            .map(|&f| (f, BEAT * 4.0))
            .collect();
        for (o, b) in out.iter_mut().zip(notes(&bass, 0.0, 0.15)) {
            *o += b;
        }
        out
    }

    // ── WAV encoder: 16-bit mono PCM ──

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let channels: u16 = 1;
        let bits: u16 = 16;
        let byte_rate = SAMPLE_RATE * channels as u32 * bits as u32 / 8;
        let block_align = channels * bits / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes_match_payload() {
            let samples = gen_match();
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
        }

        #[test]
        fn music_loop_covers_four_bars() {
            let samples = gen_music();
            let expected = (SAMPLE_RATE as f32 * 0.25) as usize * 16;
            assert_eq!(samples.len(), expected);
        }

        #[test]
        fn generated_effects_stay_in_range() {
            for s in [gen_flip(), gen_match(), gen_fail(), gen_go(), gen_win(), gen_music()] {
                assert!(!s.is_empty());
                assert!(s.iter().all(|v| v.abs() <= 1.0));
            }
        }
    }
}

// ── Public API; no-ops when the sound feature is off ──

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn start_music(&self) {}
    pub fn stop_music(&self) {}
    pub fn play_countdown_blip(&self, _remaining: u32) {}
    pub fn play_flip(&self) {}
    pub fn play_match(&self) {}
    pub fn play_fail(&self) {}
    pub fn play_go(&self) {}
    pub fn play_win(&self) {}
}
