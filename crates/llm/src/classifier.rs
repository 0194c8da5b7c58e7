//! Intent classification (spec §4.2). The classifier never touches the menu
//! or order state for validation — it is purely descriptive.

use serde::{Deserialize, Serialize};

use drivethru_core::llm_types::GenerateRequest;
use drivethru_core::traits::LanguageModel;
use drivethru_core::IntentType;

const SYSTEM_PROMPT: &str = "You are an intent classifier for a drive-thru ordering system. \
Read the customer's utterance plus recent order context and return strict JSON: \
{\"intent\": one of ADD_ITEM, REMOVE_ITEM, MODIFY_ITEM, SET_QUANTITY, CLEAR_ORDER, \
CONFIRM_ORDER, REPEAT, QUESTION, SMALL_TALK, UNKNOWN, \"confidence\": a float in [0,1], \
\"cleansed_input\": the utterance with filler words and disfluencies removed}. \
Output only the JSON object.";

/// Output of the classifier (spec §4.2): only three fields are consumed from
/// the raw model response.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentClassificationResult {
    pub intent: IntentType,
    pub confidence: f32,
    pub cleansed_input: String,
}

impl IntentClassificationResult {
    /// Canonical low-confidence / transport-failure result (spec §4.2:
    /// "On any LLM/transport error: return `{UNKNOWN, 0.1, raw_transcript}`").
    fn fallback(raw_transcript: &str) -> Self {
        Self {
            intent: IntentType::Unknown,
            confidence: 0.1,
            cleansed_input: raw_transcript.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: String,
    confidence: f32,
    cleansed_input: String,
}

pub struct IntentClassifier {
    llm: std::sync::Arc<dyn LanguageModel>,
    confidence_floor: f32,
}

impl IntentClassifier {
    pub fn new(llm: std::sync::Arc<dyn LanguageModel>, confidence_floor: f32) -> Self {
        Self { llm, confidence_floor }
    }

    /// Classify one turn. Never returns an `Err` — every failure mode
    /// collapses to the canonical fallback result (spec §4.2).
    pub async fn classify(
        &self,
        raw_transcript: &str,
        history: &[String],
        order_summary: &str,
        current_state: &str,
    ) -> IntentClassificationResult {
        let context = format!(
            "Current state: {current_state}\nOrder so far: {order_summary}\n\
             Recent turns: {}\nUtterance: {raw_transcript}",
            history.join(" | ")
        );

        let request = GenerateRequest::new(SYSTEM_PROMPT)
            .with_temperature(0.1)
            .with_max_tokens(200)
            .with_user_message(context);

        let response = match self.llm.generate(request).await {
            Ok(r) => r,
            Err(_) => return IntentClassificationResult::fallback(raw_transcript),
        };

        let parsed: RawClassification = match serde_json::from_str(response.text.trim()) {
            Ok(p) => p,
            Err(_) => return IntentClassificationResult::fallback(raw_transcript),
        };

        let intent = parse_intent(&parsed.intent).unwrap_or(IntentType::Unknown);

        if parsed.confidence < self.confidence_floor {
            return IntentClassificationResult {
                intent: IntentType::Unknown,
                confidence: parsed.confidence,
                cleansed_input: parsed.cleansed_input,
            };
        }

        IntentClassificationResult {
            intent,
            confidence: parsed.confidence,
            cleansed_input: parsed.cleansed_input,
        }
    }
}

fn parse_intent(raw: &str) -> Option<IntentType> {
    use IntentType::*;
    Some(match raw.to_uppercase().as_str() {
        "ADD_ITEM" => AddItem,
        "REMOVE_ITEM" => RemoveItem,
        "MODIFY_ITEM" => ModifyItem,
        "SET_QUANTITY" => SetQuantity,
        "CLEAR_ORDER" => ClearOrder,
        "CONFIRM_ORDER" => ConfirmOrder,
        "REPEAT" => Repeat,
        "QUESTION" => Question,
        "SMALL_TALK" => SmallTalk,
        "UNKNOWN" => Unknown,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use drivethru_core::llm_types::{GenerateResponse, StreamChunk, ToolDefinition};
    use drivethru_core::Result;
    use std::pin::Pin;

    struct ScriptedLlm(String);

    #[async_trait]
    impl LanguageModel for ScriptedLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
            Ok(GenerateResponse::text(self.0.clone()))
        }

        fn generate_stream<'a>(
            &'a self,
            _request: GenerateRequest,
        ) -> Pin<Box<dyn futures::Stream<Item = Result<StreamChunk>> + Send + 'a>> {
            Box::pin(futures::stream::empty())
        }

        async fn generate_with_tools(
            &self,
            request: GenerateRequest,
            _tools: &[ToolDefinition],
        ) -> Result<GenerateResponse> {
            self.generate(request).await
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn low_confidence_is_coerced_to_unknown() {
        let body = r#"{"intent": "ADD_ITEM", "confidence": 0.79, "cleansed_input": "a big mac"}"#;
        let classifier = IntentClassifier::new(std::sync::Arc::new(ScriptedLlm(body.to_string())), 0.8);
        let result = classifier.classify("a big mac", &[], "empty", "ORDERING").await;
        assert_eq!(result.intent, IntentType::Unknown);
        assert_eq!(result.confidence, 0.79);
    }

    #[tokio::test]
    async fn confidence_at_floor_proceeds() {
        let body = r#"{"intent": "ADD_ITEM", "confidence": 0.80, "cleansed_input": "a big mac"}"#;
        let classifier = IntentClassifier::new(std::sync::Arc::new(ScriptedLlm(body.to_string())), 0.8);
        let result = classifier.classify("a big mac", &[], "empty", "ORDERING").await;
        assert_eq!(result.intent, IntentType::AddItem);
    }

    #[tokio::test]
    async fn malformed_response_falls_back() {
        let classifier =
            IntentClassifier::new(std::sync::Arc::new(ScriptedLlm("not json".to_string())), 0.8);
        let result = classifier.classify("mumble mumble", &[], "empty", "ORDERING").await;
        assert_eq!(result.intent, IntentType::Unknown);
        assert_eq!(result.confidence, 0.1);
        assert_eq!(result.cleansed_input, "mumble mumble");
    }
}
