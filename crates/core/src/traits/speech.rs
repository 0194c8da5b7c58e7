//! Speech vendor trait boundary (spec §4.8/§4.9 "voice pipeline").
//!
//! These are intentionally thin: the vendor is out of scope (spec §1), so the
//! trait only needs to carry bytes in and out. Implementations live outside
//! this crate (an HTTP client against a speech vendor).

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::Result;

/// Speech-to-text ingestion (spec §1 "speech-to-text ingestion").
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe raw audio bytes (as uploaded via `process-audio`, spec
    /// §6.1) into text.
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Text-to-speech synthesis backing the TTS cache (spec §4.9).
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize the full utterance and return the concatenated audio
    /// bytes (mp3).
    async fn synthesize(&self, text: &str, voice: &str, language: &str) -> Result<Vec<u8>>;

    /// Synthesize via the provider's streaming API, yielding audio chunks as
    /// they arrive (spec §4.9 step 3: "synthesize via the TTS provider
    /// streaming API, concatenate chunks").
    fn synthesize_stream<'a>(
        &'a self,
        text: &'a str,
        voice: &'a str,
        language: &'a str,
    ) -> Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send + 'a>>;

    fn model_name(&self) -> &str;
}
