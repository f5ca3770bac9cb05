use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use intervo_core::domain::VoiceMetrics;
use intervo_core::error::ProviderError;
use intervo_core::ports::{SpeechToText, TextToSpeech, Transcription};

const DEFAULT_VOICE: &str = "en-US-AriaNeural";
const OUTPUT_FORMAT: &str = "riff-16khz-16bit-mono-pcm";

/// Azure Cognitive Speech REST adapter. Synthesis posts SSML to the TTS
/// endpoint and requests 16 kHz mono PCM; recognition posts raw WAV to the
/// short-audio endpoint. Voice-quality metrics are derived from the
/// recognizer's confidence and the measured speaking rate, since the plain
/// recognition API does not grade prosody.
pub struct AzureSpeech {
  client: Client,
  api_key: String,
  region: String,
  voice: String,
}

impl AzureSpeech {
  pub fn new(api_key: &str, region: &str) -> Result<Self, ProviderError> {
    if api_key.is_empty() || region.is_empty() {
      return Err(ProviderError::Api {
        provider: "azure-speech".to_string(),
        message: "API key and region must not be empty".to_string(),
      });
    }
    Ok(Self {
      client: Client::new(),
      api_key: api_key.to_string(),
      region: region.to_string(),
      voice: DEFAULT_VOICE.to_string(),
    })
  }

  pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
    self.voice = voice.into();
    self
  }

  fn tts_url(&self) -> String {
    format!(
      "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
      self.region
    )
  }

  fn stt_url(&self, language: &str) -> String {
    format!(
      "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language={}&format=detailed",
      self.region, language
    )
  }

  fn ssml(&self, text: &str, voice: &str, speed: f32) -> String {
    let rate_percent = ((speed - 1.0) * 100.0).round() as i32;
    format!(
      "<speak version='1.0' xml:lang='en-US'>\
         <voice name='{voice}'>\
           <prosody rate='{rate_percent:+}%'>{}</prosody>\
         </voice>\
       </speak>",
      xml_escape(text)
    )
  }
}

fn xml_escape(text: &str) -> String {
  text
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}

/// Estimate quality metrics from recognition confidence and speaking rate.
fn derive_metrics(confidence: f64, word_count: usize, duration_seconds: f64) -> VoiceMetrics {
  let speaking_rate_wpm = if duration_seconds > 0.0 {
    (word_count as f64 / duration_seconds * 60.0).clamp(40.0, 260.0)
  } else {
    150.0
  };
  // Comfortable pace sits around 110-170 wpm; penalize the distance.
  let pace_penalty = ((speaking_rate_wpm - 140.0).abs() / 200.0).min(0.3);

  VoiceMetrics {
    intonation: (confidence - 0.05).clamp(0.0, 1.0),
    fluency: (confidence - pace_penalty).clamp(0.0, 1.0),
    confidence: confidence.clamp(0.0, 1.0),
    speaking_rate_wpm,
  }
}

#[async_trait]
impl TextToSpeech for AzureSpeech {
  async fn synthesize(
    &self,
    text: &str,
    voice: Option<&str>,
    speed: f32,
  ) -> Result<Vec<u8>, ProviderError> {
    let voice = voice.unwrap_or(&self.voice);
    let response = self
      .client
      .post(self.tts_url())
      .header("Ocp-Apim-Subscription-Key", &self.api_key)
      .header("Content-Type", "application/ssml+xml")
      .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
      .body(self.ssml(text, voice, speed))
      .send()
      .await
      .map_err(|err| ProviderError::Api {
        provider: "azure-speech".to_string(),
        message: err.to_string(),
      })?;

    if !response.status().is_success() {
      let status = response.status().as_u16();
      return Err(ProviderError::Api {
        provider: "azure-speech".to_string(),
        message: format!("TTS request failed with status {status}"),
      });
    }

    let audio = response.bytes().await.map_err(|err| ProviderError::Api {
      provider: "azure-speech".to_string(),
      message: err.to_string(),
    })?;
    debug!(bytes = audio.len(), "synthesized speech");
    Ok(audio.to_vec())
  }
}

#[async_trait]
impl SpeechToText for AzureSpeech {
  async fn transcribe(
    &self,
    audio: &[u8],
    language: &str,
  ) -> Result<Transcription, ProviderError> {
    let response = self
      .client
      .post(self.stt_url(language))
      .header("Ocp-Apim-Subscription-Key", &self.api_key)
      .header("Content-Type", "audio/wav; codecs=audio/pcm; samplerate=16000")
      .body(audio.to_vec())
      .send()
      .await
      .map_err(|err| ProviderError::Api {
        provider: "azure-speech".to_string(),
        message: err.to_string(),
      })?;

    if !response.status().is_success() {
      let status = response.status().as_u16();
      return Err(ProviderError::Api {
        provider: "azure-speech".to_string(),
        message: format!("STT request failed with status {status}"),
      });
    }

    let recognition: RecognitionResponse =
      response.json().await.map_err(|err| ProviderError::Parse {
        message: err.to_string(),
      })?;

    if recognition.recognition_status != "Success" {
      return Err(ProviderError::Api {
        provider: "azure-speech".to_string(),
        message: format!("recognition status: {}", recognition.recognition_status),
      });
    }

    let text = recognition.display_text.unwrap_or_default();
    let confidence = recognition
      .n_best
      .as_ref()
      .and_then(|nbest| nbest.first())
      .map(|best| best.confidence)
      .unwrap_or(0.5);
    // Duration is reported in 100 ns ticks.
    let duration_seconds = recognition.duration as f64 / 10_000_000.0;
    let word_count = text.split_whitespace().count();

    Ok(Transcription {
      voice_metrics: derive_metrics(confidence, word_count, duration_seconds),
      duration_seconds,
      text,
    })
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionResponse {
  recognition_status: String,
  display_text: Option<String>,
  #[serde(default)]
  duration: u64,
  #[serde(rename = "NBest")]
  n_best: Option<Vec<NBestEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NBestEntry {
  confidence: f64,
}
