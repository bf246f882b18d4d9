//! Translation of UI strings through an OpenAI-compatible gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use owr_common::config::TranslationSettings;
use owr_common::{AppError, AppResult};

/// Longest accepted string, in characters.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Most strings translated per request.
pub const MAX_BATCH: usize = 500;

const TOOL_NAME: &str = "deliver_translations";
const TOOL_DESCRIPTION: &str =
    "Return translations for the provided strings in the same order as input.";

const SYSTEM_PROMPT: &str = "You are a professional UI translator. Translate the provided UI \
strings into the target language. Maintain meaning, tone, and keep emojis, brand names, and \
variables unchanged. Return only the translations via the provided tool. Do not add explanations.";

/// Translation request input.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateInput {
    /// Strings to translate.
    #[serde(default)]
    pub texts: Vec<String>,
    /// Target language code, e.g. "es".
    #[serde(default)]
    pub target_lang: Option<String>,
}

/// Translation response; one entry per sanitized input string.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
    /// Translated strings in input order.
    pub translations: Vec<String>,
}

/// Backend that turns a batch of strings into translations.
#[async_trait]
pub trait TranslationGateway: Send + Sync {
    /// Translate `texts` into `target_lang`. The result may be shorter than
    /// the input; missing positions are filled by the caller.
    async fn translate_batch(&self, texts: &[String], target_lang: &str) -> AppResult<Vec<String>>;
}

/// Gateway speaking the chat-completions protocol with a function tool.
pub struct ChatCompletionsGateway {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: Option<String>,
}

impl ChatCompletionsGateway {
    /// Create a gateway from settings. An API key is required.
    pub fn new(settings: &TranslationSettings) -> AppResult<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Config("translation.api_key is not configured".to_string()))?;

        Ok(Self {
            http_client: reqwest::Client::new(),
            endpoint: settings.endpoint.clone(),
            api_key,
            model: settings.model.clone(),
        })
    }

    fn request_body(&self, texts: &[String], target_lang: &str) -> Value {
        let mut body = json!({
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Translate this array of UI strings into '{target_lang}'. \
                         Preserve emojis and punctuation."
                    ),
                },
                {
                    "role": "user",
                    "content": json!({ "targetLang": target_lang, "texts": texts }).to_string(),
                },
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": TOOL_NAME,
                    "description": TOOL_DESCRIPTION,
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "translations": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["translations"],
                        "additionalProperties": false,
                    },
                },
            }],
            "tool_choice": { "type": "function", "function": { "name": TOOL_NAME } },
        });
        if let Some(model) = &self.model {
            body["model"] = json!(model);
        }
        body
    }
}

#[async_trait]
impl TranslationGateway for ChatCompletionsGateway {
    async fn translate_batch(&self, texts: &[String], target_lang: &str) -> AppResult<Vec<String>> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(texts, target_lang))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Translation request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::RateLimited);
        }
        if status.as_u16() == 402 {
            return Err(AppError::PaymentRequired(
                "Translation credits exhausted".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Translation gateway error");
            return Err(AppError::ExternalService("Translation gateway error".to_string()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid gateway response: {e}")))?;

        parse_gateway_response(&payload)
            .ok_or_else(|| AppError::ExternalService("Invalid translation response".to_string()))
    }
}

/// Extract translations from a chat-completions payload.
///
/// Tool-call arguments are preferred; message content holding either
/// `{"translations": [...]}` or a bare array is accepted as a fallback.
#[must_use]
pub fn parse_gateway_response(payload: &Value) -> Option<Vec<String>> {
    let message = payload.pointer("/choices/0/message")?;

    let from_tool = message
        .pointer("/tool_calls/0/function/arguments")
        .and_then(Value::as_str)
        .and_then(|args| serde_json::from_str::<Value>(args).ok())
        .map(|args| string_array(args.get("translations")).unwrap_or_default());
    if from_tool.is_some() {
        return from_tool;
    }

    let content: Value = serde_json::from_str(message.get("content")?.as_str()?).ok()?;
    string_array(content.get("translations")).or_else(|| string_array(Some(&content)))
}

fn string_array(value: Option<&Value>) -> Option<Vec<String>> {
    value?.as_array().map(|items| {
        items
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect()
    })
}

/// Trim, drop empties, truncate long entries and cap the batch.
#[must_use]
pub fn sanitize_texts(texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.chars().take(MAX_TEXT_CHARS).collect())
        .take(MAX_BATCH)
        .collect()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    expires_at: Instant,
}

/// Translation service with a small in-memory cache.
#[derive(Clone)]
pub struct TranslationService {
    gateway: Option<Arc<dyn TranslationGateway>>,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    cache_ttl: Duration,
}

impl TranslationService {
    /// Create a service from settings. A disabled service answers every
    /// request with `ServiceUnavailable`.
    pub fn new(settings: &TranslationSettings) -> AppResult<Self> {
        let gateway: Option<Arc<dyn TranslationGateway>> = if settings.enabled {
            Some(Arc::new(ChatCompletionsGateway::new(settings)?))
        } else {
            None
        };
        Ok(Self::with_gateway(
            gateway,
            Duration::from_secs(settings.cache_ttl_seconds),
        ))
    }

    /// Create a service around an explicit gateway.
    #[must_use]
    pub fn with_gateway(gateway: Option<Arc<dyn TranslationGateway>>, cache_ttl: Duration) -> Self {
        Self {
            gateway,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl,
        }
    }

    fn cache_key(target_lang: &str, text: &str) -> String {
        format!("{target_lang}:{text}")
    }

    /// Translate a batch of strings.
    pub async fn translate(&self, input: TranslateInput) -> AppResult<TranslationResponse> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("Translation is not enabled".to_string()))?;

        let target_lang = input
            .target_lang
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| AppError::Validation("targetLang is required".to_string()))?
            .to_string();

        let clean = sanitize_texts(&input.texts);
        if clean.is_empty() {
            return Ok(TranslationResponse {
                translations: Vec::new(),
            });
        }

        let mut resolved: Vec<Option<String>> = {
            let cache = self.cache.read().await;
            let now = Instant::now();
            clean
                .iter()
                .map(|text| {
                    cache
                        .get(&Self::cache_key(&target_lang, text))
                        .filter(|entry| entry.expires_at > now)
                        .map(|entry| entry.text.clone())
                })
                .collect()
        };

        let misses: Vec<String> = clean
            .iter()
            .zip(&resolved)
            .filter(|(_, hit)| hit.is_none())
            .map(|(text, _)| text.clone())
            .collect();

        if !misses.is_empty() {
            tracing::debug!(
                target_lang = %target_lang,
                count = misses.len(),
                cached = clean.len() - misses.len(),
                "Translating strings"
            );
            let translated = gateway.translate_batch(&misses, &target_lang).await?;

            let mut fresh = Vec::with_capacity(misses.len());
            {
                let mut cache = self.cache.write().await;
                let expires_at = Instant::now() + self.cache_ttl;
                cache.retain(|_, entry| entry.expires_at > Instant::now());
                for (i, original) in misses.iter().enumerate() {
                    match translated.get(i) {
                        Some(text) => {
                            cache.insert(
                                Self::cache_key(&target_lang, original),
                                CacheEntry {
                                    text: text.clone(),
                                    expires_at,
                                },
                            );
                            fresh.push(text.clone());
                        }
                        None => fresh.push(original.clone()),
                    }
                }
            }

            let mut fresh = fresh.into_iter();
            for slot in resolved.iter_mut().filter(|slot| slot.is_none()) {
                *slot = fresh.next();
            }
        }

        Ok(TranslationResponse {
            translations: resolved
                .into_iter()
                .zip(clean)
                .map(|(translated, original)| translated.unwrap_or(original))
                .collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Uppercases everything but the last string, to exercise padding.
    struct ShoutingGateway {
        calls: AtomicUsize,
        drop_last: bool,
    }

    #[async_trait]
    impl TranslationGateway for ShoutingGateway {
        async fn translate_batch(&self, texts: &[String], _lang: &str) -> AppResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut out: Vec<String> = texts.iter().map(|t| t.to_uppercase()).collect();
            if self.drop_last {
                out.pop();
            }
            Ok(out)
        }
    }

    fn service(drop_last: bool) -> (TranslationService, Arc<ShoutingGateway>) {
        let gateway = Arc::new(ShoutingGateway {
            calls: AtomicUsize::new(0),
            drop_last,
        });
        let service = TranslationService::with_gateway(
            Some(gateway.clone() as Arc<dyn TranslationGateway>),
            Duration::from_secs(60),
        );
        (service, gateway)
    }

    fn input(texts: &[&str], lang: Option<&str>) -> TranslateInput {
        TranslateInput {
            texts: texts.iter().map(|t| (*t).to_string()).collect(),
            target_lang: lang.map(str::to_string),
        }
    }

    #[test]
    fn test_sanitize_texts() {
        let long = "x".repeat(MAX_TEXT_CHARS + 10);
        let texts = vec!["  hi ".to_string(), "   ".to_string(), long];
        let clean = sanitize_texts(&texts);

        assert_eq!(clean.len(), 2);
        assert_eq!(clean[0], "hi");
        assert_eq!(clean[1].chars().count(), MAX_TEXT_CHARS);

        let many: Vec<String> = (0..MAX_BATCH + 5).map(|i| format!("t{i}")).collect();
        assert_eq!(sanitize_texts(&many).len(), MAX_BATCH);
    }

    #[test]
    fn test_parse_tool_call_arguments() {
        let payload = json!({
            "choices": [{ "message": { "tool_calls": [{ "function": {
                "name": TOOL_NAME,
                "arguments": "{\"translations\":[\"Hola\",\"Adiós\"]}"
            }}]}}]
        });
        assert_eq!(
            parse_gateway_response(&payload).unwrap(),
            vec!["Hola".to_string(), "Adiós".to_string()]
        );
    }

    #[test]
    fn test_parse_content_fallbacks() {
        let object = json!({
            "choices": [{ "message": { "content": "{\"translations\":[\"Bonjour\"]}" } }]
        });
        let array = json!({
            "choices": [{ "message": { "content": "[\"Ciao\"]" } }]
        });
        let junk = json!({
            "choices": [{ "message": { "content": "not json" } }]
        });

        assert_eq!(parse_gateway_response(&object).unwrap(), vec!["Bonjour"]);
        assert_eq!(parse_gateway_response(&array).unwrap(), vec!["Ciao"]);
        assert!(parse_gateway_response(&junk).is_none());
    }

    #[tokio::test]
    async fn test_missing_target_lang_is_validation_error() {
        let (service, _) = service(false);
        let result = service.translate(input(&["Hello"], None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_disabled_service() {
        let service = TranslationService::with_gateway(None, Duration::from_secs(1));
        let result = service.translate(input(&["Hello"], Some("es"))).await;
        assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_gateway() {
        let (service, gateway) = service(false);
        let result = service.translate(input(&["  ", ""], Some("es"))).await.unwrap();

        assert!(result.translations.is_empty());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_gateway_answer_is_padded_with_originals() {
        let (service, _) = service(true);
        let result = service
            .translate(input(&["vote", "news"], Some("es")))
            .await
            .unwrap();

        assert_eq!(result.translations, vec!["VOTE", "news"]);
    }

    #[tokio::test]
    async fn test_cached_strings_are_not_resent() {
        let (service, gateway) = service(false);

        service.translate(input(&["vote"], Some("es"))).await.unwrap();
        let result = service
            .translate(input(&["vote", "news"], Some("es")))
            .await
            .unwrap();

        assert_eq!(result.translations, vec!["VOTE", "NEWS"]);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);

        service.translate(input(&["news", "vote"], Some("es"))).await.unwrap();
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);

        service.translate(input(&["vote"], Some("fr"))).await.unwrap();
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }
}
