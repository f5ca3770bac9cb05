//! Mock speech adapter.
//!
//! Synthesis produces properly framed, silent WAV audio (16 kHz mono,
//! 16-bit PCM) sized from the text's word count at an assumed 150 words per
//! minute. Transcription derives its voice metrics from the audio size, so
//! the same input always yields the same metrics.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use intervo_core::domain::VoiceMetrics;
use intervo_core::error::ProviderError;
use intervo_core::ports::{SpeechToText, TextToSpeech, Transcription};

const SAMPLE_RATE: u32 = 16_000;
const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const WORDS_PER_MINUTE: f64 = 150.0;

#[derive(Default)]
pub struct MockSpeech {
  /// Fixed transcript override; the default synthesizes one from the audio
  /// size.
  transcript: Option<String>,
}

impl MockSpeech {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_transcript(mut self, text: impl Into<String>) -> Self {
    self.transcript = Some(text.into());
    self
  }

  fn build_wav(num_samples: u32) -> Vec<u8> {
    let block_align = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);
    let byte_rate = SAMPLE_RATE * u32::from(block_align);
    let data_size = num_samples * u32::from(block_align);

    let mut wav = Vec::with_capacity(44 + data_size as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&NUM_CHANNELS.to_le_bytes());
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk, silent
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.resize(44 + data_size as usize, 0);
    wav
  }

  fn voice_metrics(audio_size: usize, word_count: usize, duration_seconds: f64) -> VoiceMetrics {
    // Seed from the audio size so a given recording always scores the same.
    let mut rng = StdRng::seed_from_u64(audio_size as u64);
    let size_factor = (audio_size as f64 / 100_000.0).min(1.0);

    let intonation = (0.5 + rng.gen::<f64>() * 0.3 + size_factor * 0.2).clamp(0.0, 1.0);
    let fluency = (0.6 + rng.gen::<f64>() * 0.25 + size_factor * 0.15).clamp(0.0, 1.0);
    let confidence = (0.7 + rng.gen::<f64>() * 0.2 + size_factor * 0.1).clamp(0.0, 1.0);

    let speaking_rate_wpm = if duration_seconds > 0.0 {
      (word_count as f64 / duration_seconds * 60.0).clamp(80.0, 200.0)
    } else {
      150.0
    };

    VoiceMetrics {
      intonation,
      fluency,
      confidence,
      speaking_rate_wpm,
    }
  }
}

#[async_trait]
impl TextToSpeech for MockSpeech {
  async fn synthesize(
    &self,
    text: &str,
    _voice: Option<&str>,
    speed: f32,
  ) -> Result<Vec<u8>, ProviderError> {
    let word_count = text.split_whitespace().count();
    let duration_seconds =
      ((word_count as f64 / WORDS_PER_MINUTE) * 60.0 / f64::from(speed.max(0.1))).max(0.5);
    let num_samples = (f64::from(SAMPLE_RATE) * duration_seconds) as u32;
    Ok(Self::build_wav(num_samples))
  }
}

#[async_trait]
impl SpeechToText for MockSpeech {
  async fn transcribe(
    &self,
    audio: &[u8],
    _language: &str,
  ) -> Result<Transcription, ProviderError> {
    let audio_size = audio.len();
    // 2 bytes per sample at 16 kHz mono.
    let duration_seconds = audio_size as f64 / (f64::from(SAMPLE_RATE) * 2.0);

    let text = self.transcript.clone().unwrap_or_else(|| {
      let word_count = (audio_size / 1000).max(10);
      format!("Mock transcription with approximately {word_count} words from {audio_size} bytes")
    });
    let word_count = text.split_whitespace().count();

    Ok(Transcription {
      voice_metrics: Self::voice_metrics(audio_size, word_count, duration_seconds),
      duration_seconds,
      text,
    })
  }
}
