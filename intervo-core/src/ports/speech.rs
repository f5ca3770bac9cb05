use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::VoiceMetrics;
use crate::error::ProviderError;

/// Result of transcribing one answer's audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
  pub text: String,
  pub voice_metrics: VoiceMetrics,
  pub duration_seconds: f64,
}

/// Speech-to-text capability. Transcription is synchronous per answer and
/// produces voice-quality metrics alongside the text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
  async fn transcribe(&self, audio: &[u8], language: &str) -> Result<Transcription, ProviderError>;
}

/// Text-to-speech capability. Output bytes are opaque to the engine; by
/// convention they are WAV, 16 kHz mono, 16-bit PCM.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
  async fn synthesize(
    &self,
    text: &str,
    voice: Option<&str>,
    speed: f32,
  ) -> Result<Vec<u8>, ProviderError>;
}
