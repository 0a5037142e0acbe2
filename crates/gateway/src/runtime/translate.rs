//! Translates model-facing review text into the session's target locale.
//!
//! Most sessions run `Locale::En` and never touch this module — the prompt
//! assembler already asks the model to answer in the target locale directly.
//! Translation exists for the minority of cases where `check_response_language`
//! (see [`crate::runtime::prompt`]) flags a response as wrong-language and a
//! second pass is cheaper than a full regeneration.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use forge_domain::error::Result;
use forge_domain::locale::Locale;
use forge_providers::{ChatRequest, LlmProvider};

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, locale: Locale) -> Result<String>;
}

/// No-op translator, used when `locale` is `En` or no translation provider
/// is configured. Returns the input unchanged.
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str, _locale: Locale) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Translates via an LLM provider, caching results in-process so a repeated
/// (text, locale) pair — common across retries of the same turn — costs one
/// round trip instead of many.
pub struct LlmTranslator {
    provider: Arc<dyn LlmProvider>,
    model: Option<String>,
    cache: Mutex<HashMap<(String, Locale), String>>,
}

impl LlmTranslator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: Option<String>) -> Self {
        Self { provider, model, cache: Mutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, locale: Locale) -> Result<String> {
        if locale == Locale::En {
            return Ok(text.to_string());
        }
        let key = (text.to_string(), locale);
        if let Some(cached) = self.cache.lock().get(&key) {
            return Ok(cached.clone());
        }

        let prompt = format!(
            "Translate the following text into {} ({}). Preserve markdown formatting and \
             any code blocks verbatim. Return only the translated text, nothing else.\n\n{}",
            locale.as_str(),
            locale,
            text
        );
        let req = ChatRequest {
            messages: vec![forge_domain::tool::Message::user(prompt)],
            model: self.model.clone(),
            temperature: Some(0.0),
            ..Default::default()
        };
        let resp = self.provider.chat(req).await?;
        self.cache.lock().insert(key, resp.content.clone());
        Ok(resp.content)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Review-event translation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Translate the free-text fields of a `review_*`/`knowledge_document`
/// payload (see `runtime::review`) into `locale`. A no-op at `Locale::En`.
/// IDs, URLs, enum tags, booleans, and numbers are left untouched; a
/// translation failure on any one field falls back to the original text
/// rather than failing the whole event.
pub async fn translate_review_event(translator: &dyn Translator, event_type: &str, data: Value, locale: Locale) -> Value {
    if locale == Locale::En {
        return data;
    }
    match event_type {
        "review_decompose" => translate_decompose(translator, data, locale).await,
        "review_explore" => translate_explore(translator, data, locale).await,
        "review_claims" | "review_verdicts" => translate_claims(translator, data, locale).await,
        "review_build" => translate_build(translator, data, locale).await,
        "knowledge_document" => {
            let text = data.as_str().unwrap_or_default();
            Value::String(translate_text(translator, text, locale).await)
        }
        _ => data,
    }
}

async fn translate_text(translator: &dyn Translator, text: &str, locale: Locale) -> String {
    translator.translate(text, locale).await.unwrap_or_else(|_| text.to_string())
}

/// Translate each named string field of `obj` in place, leaving missing or
/// non-string fields untouched.
async fn translate_fields(translator: &dyn Translator, obj: &mut serde_json::Map<String, Value>, keys: &[&str], locale: Locale) {
    for key in keys {
        if let Some(Value::String(s)) = obj.get(*key).cloned() {
            obj.insert((*key).to_string(), Value::String(translate_text(translator, &s, locale).await));
        }
    }
}

async fn translate_string_array(translator: &dyn Translator, value: &mut Value, locale: Locale) {
    if let Value::Array(arr) = value {
        for item in arr.iter_mut() {
            if let Some(s) = item.as_str() {
                *item = Value::String(translate_text(translator, s, locale).await);
            }
        }
    }
}

async fn translate_array_items(
    translator: &dyn Translator,
    value: &mut Value,
    keys: &[&str],
    locale: Locale,
) {
    if let Value::Array(arr) = value {
        for item in arr.iter_mut() {
            if let Some(obj) = item.as_object_mut() {
                translate_fields(translator, obj, keys, locale).await;
            }
        }
    }
}

async fn translate_decompose(translator: &dyn Translator, mut data: Value, locale: Locale) -> Value {
    if let Some(obj) = data.as_object_mut() {
        if let Some(fundamentals) = obj.get_mut("fundamentals") {
            translate_string_array(translator, fundamentals, locale).await;
        }
        if let Some(assumptions) = obj.get_mut("assumptions") {
            translate_array_items(translator, assumptions, &["text", "source"], locale).await;
        }
        if let Some(reframings) = obj.get_mut("reframings") {
            translate_array_items(translator, reframings, &["text", "reasoning"], locale).await;
        }
    }
    data
}

async fn translate_explore(translator: &dyn Translator, mut data: Value, locale: Locale) -> Value {
    if let Some(obj) = data.as_object_mut() {
        if let Some(Value::Object(mbox)) = obj.get_mut("morphological_box") {
            if let Some(Value::Array(params)) = mbox.get_mut("parameters") {
                for param in params.iter_mut() {
                    if let Some(p) = param.as_object_mut() {
                        translate_fields(translator, p, &["name"], locale).await;
                        if let Some(values) = p.get_mut("values") {
                            translate_string_array(translator, values, locale).await;
                        }
                    }
                }
            }
        }
        if let Some(analogies) = obj.get_mut("analogies") {
            translate_array_items(translator, analogies, &["domain", "description"], locale).await;
        }
        if let Some(contradictions) = obj.get_mut("contradictions") {
            translate_array_items(translator, contradictions, &["property_a", "property_b", "description"], locale).await;
        }
        if let Some(adjacent) = obj.get_mut("adjacent") {
            translate_array_items(translator, adjacent, &["description"], locale).await;
        }
    }
    data
}

async fn translate_claims(translator: &dyn Translator, mut data: Value, locale: Locale) -> Value {
    if let Some(obj) = data.as_object_mut() {
        if let Some(Value::Array(claims)) = obj.get_mut("claims") {
            for claim in claims.iter_mut() {
                if let Some(c) = claim.as_object_mut() {
                    translate_fields(
                        translator,
                        c,
                        &["claim_text", "thesis_text", "antithesis_text", "falsifiability_condition", "qualification"],
                        locale,
                    )
                    .await;
                    if let Some(evidence) = c.get_mut("evidence") {
                        translate_array_items(translator, evidence, &["title", "summary"], locale).await;
                    }
                }
            }
        }
    }
    data
}

async fn translate_build(translator: &dyn Translator, mut data: Value, locale: Locale) -> Value {
    if let Some(obj) = data.as_object_mut() {
        if let Some(gaps) = obj.get_mut("gaps") {
            translate_string_array(translator, gaps, locale).await;
        }
        if let Some(negative_knowledge) = obj.get_mut("negative_knowledge") {
            translate_string_array(translator, negative_knowledge, locale).await;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn identity_translator_passes_text_through() {
        let t = IdentityTranslator;
        let out = t.translate("hello", Locale::PtBr).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn english_locale_leaves_review_payload_untouched() {
        let data = json!({ "fundamentals": ["a", "b"] });
        let out = translate_review_event(&IdentityTranslator, "review_decompose", data.clone(), Locale::En).await;
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn decompose_translation_preserves_confirmed_flag_and_touches_text() {
        let data = json!({
            "fundamentals": ["reduce latency"],
            "assumptions": [{"text": "users tolerate delay", "source": "model", "options": ["a"], "confirmed": true}],
            "reframings": [],
        });
        let out = translate_review_event(&IdentityTranslator, "review_decompose", data, Locale::PtBr).await;
        assert_eq!(out["assumptions"][0]["confirmed"], true);
        assert_eq!(out["assumptions"][0]["text"], "users tolerate delay");
    }

    #[tokio::test]
    async fn knowledge_document_translates_the_whole_markdown_string() {
        let data = json!("# Document");
        let out = translate_review_event(&IdentityTranslator, "knowledge_document", data, Locale::PtBr).await;
        assert_eq!(out, "# Document");
    }
}
