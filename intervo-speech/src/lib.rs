//! # Intervo Speech
//!
//! Implementations of the engine's `SpeechToText` and `TextToSpeech` ports:
//! an Azure Cognitive Speech REST adapter and a mock that synthesizes
//! silent WAV audio and deterministic voice metrics.

pub mod azure;
pub mod mock;

pub use azure::AzureSpeech;
pub use mock::MockSpeech;
