//! Resolves a phrase type (plus optional dynamic text) to a playable audio
//! URL (spec §4.8): a pre-rendered canned file when the phrase is fixed and
//! no restaurant-specific audio exists yet, otherwise the TTS cache.

use std::sync::Arc;

use drivethru_core::error::Result;
use drivethru_core::traits::{ObjectStore, TextToSpeech};
use drivethru_core::PhraseType;
use drivethru_store::TtsCache;

pub struct VoiceGenerator {
    tts: Arc<dyn TextToSpeech>,
    objects: Arc<dyn ObjectStore>,
    tts_cache: Arc<TtsCache>,
    voice: String,
    language: String,
    canned_phrase_prefix: String,
}

impl VoiceGenerator {
    pub fn new(
        tts: Arc<dyn TextToSpeech>,
        objects: Arc<dyn ObjectStore>,
        tts_cache: Arc<TtsCache>,
        voice: impl Into<String>,
        language: impl Into<String>,
        canned_phrase_prefix: impl Into<String>,
    ) -> Self {
        Self {
            tts,
            objects,
            tts_cache,
            voice: voice.into(),
            language: language.into(),
            canned_phrase_prefix: canned_phrase_prefix.into(),
        }
    }

    /// Returns the audio URL for this turn's response (spec §4.8). A
    /// low-confidence turn always goes through TTS, since the appended
    /// "Could you please repeat that?" has no canned counterpart.
    pub async fn generate(
        &self,
        phrase_type: PhraseType,
        restaurant_id: &str,
        custom_text: Option<&str>,
        low_confidence: bool,
    ) -> Result<String> {
        let text = Self::resolve_text(phrase_type, custom_text, low_confidence);

        if phrase_type.is_dynamic() || custom_text.is_some() || low_confidence {
            return self.synthesize_cached(&text, restaurant_id).await;
        }

        let path = Self::canned_path(&self.canned_phrase_prefix, restaurant_id, phrase_type);
        if self.objects.exists(&path).await? {
            return Ok(self.objects.url_for(&path));
        }

        let audio = self.tts.synthesize(&text, &self.voice, &self.language).await?;
        self.objects.put(&path, audio, "audio/mpeg").await?;
        Ok(self.objects.url_for(&path))
    }

    async fn synthesize_cached(&self, text: &str, restaurant_id: &str) -> Result<String> {
        if let Some(url) = self.tts_cache.lookup(text, &self.voice, &self.language, restaurant_id).await? {
            return Ok(url);
        }
        let audio = self.tts.synthesize(text, &self.voice, &self.language).await?;
        self.tts_cache.store(text, &self.voice, &self.language, restaurant_id, audio).await
    }

    /// Exposed to `orchestrator` so the textual response returned to the
    /// caller matches exactly what gets synthesized here.
    pub(crate) fn resolve_text(phrase_type: PhraseType, custom_text: Option<&str>, low_confidence: bool) -> String {
        let mut text = custom_text.unwrap_or_else(|| phrase_type.fallback_text()).to_string();
        if low_confidence {
            text.push_str(" Could you please repeat that?");
        }
        text
    }

    fn canned_path(prefix: &str, restaurant_id: &str, phrase_type: PhraseType) -> String {
        format!("{prefix}/restaurant-{restaurant_id}/{}.mp3", phrase_type.as_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_confidence_appends_repeat_prompt_to_fallback_text() {
        let text = VoiceGenerator::resolve_text(PhraseType::Greeting, None, true);
        assert_eq!(text, format!("{} Could you please repeat that?", PhraseType::Greeting.fallback_text()));
    }

    #[test]
    fn custom_text_overrides_fallback_text() {
        let text = VoiceGenerator::resolve_text(PhraseType::CustomResponse, Some("Your total is $4.99."), false);
        assert_eq!(text, "Your total is $4.99.");
    }

    #[test]
    fn canned_path_matches_restaurant_scoped_layout() {
        let path = VoiceGenerator::canned_path("canned-phrases", "42", PhraseType::Greeting);
        assert_eq!(path, "canned-phrases/restaurant-42/greeting.mp3");
    }
}
