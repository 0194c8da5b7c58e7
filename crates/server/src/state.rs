//! Composition root: builds every real backend (spec §1's "external
//! collaborators") and wires them into the `drivethru-pipeline` types the
//! HTTP handlers call (grounded on the teacher's `state.rs` /
//! `AppState::with_full_persistence` shape, stripped of ScyllaDB/RAG/domain
//! config that has no counterpart here).

use std::sync::Arc;

use drivethru_config::Settings;
use drivethru_core::traits::{ObjectStore, SpeechToText};
use drivethru_llm::{IntentClassifier, ItemExtractor, MenuResolver, MutationParser, OllamaConfig, OllamaLanguageModel};
use drivethru_menu::MenuCache;
use drivethru_pipeline::{Orchestrator, ParserRouter, VoiceGenerator};
use drivethru_safety::SafetyGate;
use drivethru_store::{S3ObjectStore, SessionRepository, SqlxMenuRepository, SqlxOrderArchive, TtsCache};

use crate::metrics::RequestCounters;
use crate::vendor::{HttpSpeechToText, HttpSttConfig, HttpTextToSpeech, HttpTtsConfig};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub orchestrator: Arc<Orchestrator>,
    pub sessions: Arc<SessionRepository>,
    pub objects: Arc<dyn ObjectStore>,
    pub stt: Arc<dyn SpeechToText>,
    pub audio_upload_prefix: String,
    pub metrics: Arc<RequestCounters>,
}

impl AppState {
    /// Connects every real backend. Returns an error on the first
    /// unreachable dependency rather than starting half-wired (spec §5:
    /// the orchestrator assumes these are all live for the lifetime of the
    /// process).
    pub async fn connect(settings: Settings) -> anyhow::Result<Self> {
        let redis_store = drivethru_store::RedisSessionStore::connect(&settings.store.redis_url).await?;
        let sessions_store: Arc<dyn drivethru_core::traits::SessionStore> = Arc::new(redis_store);
        let archive = Arc::new(SqlxOrderArchive::connect(&settings.store.database_url).await?);
        let sessions = Arc::new(SessionRepository::new(sessions_store, archive));

        let objects: Arc<dyn ObjectStore> = Arc::new(
            S3ObjectStore::from_env(settings.store.s3_bucket.clone(), object_store_public_base_url(&settings)).await,
        );

        let menu_repository = Arc::new(SqlxMenuRepository::connect(&settings.store.database_url).await?);
        let menu = Arc::new(MenuCache::new(menu_repository));

        let llm = Arc::new(OllamaLanguageModel::new(OllamaConfig {
            model: settings.llm.model.clone(),
            endpoint: settings.llm.endpoint.clone(),
            timeout: std::time::Duration::from_millis(settings.llm.timeout_ms),
            max_retries: settings.llm.max_retries,
            initial_backoff: std::time::Duration::from_millis(100),
        })?);

        let stt: Arc<dyn SpeechToText> = Arc::new(HttpSpeechToText::new(HttpSttConfig {
            url: settings.voice.stt_endpoint.clone(),
            timeout: std::time::Duration::from_millis(settings.voice.vendor_timeout_ms),
        })?);
        let tts = Arc::new(HttpTextToSpeech::new(HttpTtsConfig {
            url: settings.voice.tts_endpoint.clone(),
            timeout: std::time::Duration::from_millis(settings.voice.vendor_timeout_ms),
        })?);

        let redis_client = redis::Client::open(settings.store.redis_url.as_str())?;
        let tts_cache = Arc::new(TtsCache::new(redis_client.get_connection_manager().await?, objects.clone()));

        let safety = SafetyGate::new(settings.safety_threshold, Vec::new());
        let classifier = IntentClassifier::new(llm.clone(), settings.ai_confidence_threshold);
        let router = ParserRouter::new(
            Arc::new(ItemExtractor::new(llm.clone())),
            Arc::new(MenuResolver::new(llm.clone(), menu.clone())),
            Arc::new(MutationParser::new(llm.clone())),
            menu.clone(),
        );
        let voice = VoiceGenerator::new(
            tts,
            objects.clone(),
            tts_cache,
            settings.voice.tts_voice.clone(),
            settings.voice.default_language.clone(),
            settings.voice.canned_phrase_prefix.clone(),
        );

        let orchestrator = Arc::new(Orchestrator::new(safety, classifier, router, voice, sessions.clone(), menu, settings.clone()));

        Ok(Self {
            audio_upload_prefix: "restaurants".to_string(),
            settings: Arc::new(settings),
            orchestrator,
            sessions,
            objects,
            stt,
            metrics: Arc::new(RequestCounters::default()),
        })
    }
}

fn object_store_public_base_url(settings: &Settings) -> String {
    format!("https://{}.s3.amazonaws.com", settings.store.s3_bucket)
}
