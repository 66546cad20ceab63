//! Body normalization.
//!
//! Turns whatever the page (or a script) posted into one canonical
//! [`IncomingRequest`], then derives the [`ForwardedPayload`] sent to the
//! engine.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{RelayError, Result};

/// Body field carrying string-encoded extra parameters.
pub const EXTRA_JSON_FIELD: &str = "extraJson";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Canonical view of a caller request, independent of transport format.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingRequest {
    /// Raw topic as sent (untrimmed). Empty when absent or not a string.
    pub topic: String,

    /// Country code as sent, if any.
    pub country: Option<String>,

    /// Every body field except the `extraJson` envelope, with the decoded
    /// envelope shallow-merged on top.
    pub extra: Map<String, Value>,
}

/// The JSON object forwarded to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ForwardedPayload(Map<String, Value>);

impl ForwardedPayload {
    pub fn prompt(&self) -> &str {
        self.0.get("prompt").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn mode(&self) -> Option<&Value> {
        self.0.get("mode")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Parse a raw request body into a JSON object.
///
/// Empty bodies become `{}`. Form bodies become an object of strings.
/// Anything else must be JSON; non-object JSON becomes `{}`.
pub fn parse_body(body: &[u8], content_type: Option<&str>) -> Result<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    if content_type.is_some_and(is_form) {
        return Ok(url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(e) => Err(RelayError::InvalidJson(e.to_string())),
    }
}

fn is_form(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// Decode the `extraJson` envelope. Blank strings and non-object JSON
/// contribute nothing; malformed JSON is a client error.
fn decode_extra(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::String(text) if text.trim().is_empty() => Ok(Map::new()),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Ok(Map::new()),
            Err(e) => Err(RelayError::InvalidJson(format!("{EXTRA_JSON_FIELD}: {e}"))),
        },
        _ => Ok(Map::new()),
    }
}

impl IncomingRequest {
    /// Build the canonical request from a parsed body object.
    ///
    /// The decoded envelope is merged first, so `topic` and `country`
    /// supplied there override the body's own.
    pub fn from_fields(mut fields: Map<String, Value>) -> Result<Self> {
        if let Some(envelope) = fields.remove(EXTRA_JSON_FIELD) {
            fields.extend(decode_extra(envelope)?);
        }

        let topic = fields
            .get("topic")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let country = fields
            .get("country")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            topic,
            country,
            extra: fields,
        })
    }

    /// Prompt sent upstream: an explicit non-blank `prompt` wins over the
    /// trimmed topic.
    pub fn final_prompt(&self) -> String {
        match self.extra.get("prompt").and_then(Value::as_str) {
            Some(prompt) if !prompt.trim().is_empty() => prompt.to_string(),
            _ => self.topic.trim().to_string(),
        }
    }

    /// Mode sent upstream: explicit `mode`, else the uppercased country,
    /// else `default_mode`.
    pub fn final_mode(&self, default_mode: &str) -> Value {
        match self.extra.get("mode") {
            Some(Value::Null) | None => {}
            Some(Value::String(mode)) if mode.trim().is_empty() => {}
            Some(mode) => return mode.clone(),
        }

        let country = self
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        match country {
            Some(country) => Value::String(country.to_uppercase()),
            None => Value::String(default_mode.to_string()),
        }
    }

    /// Derive the forwarded payload, failing with `EmptyTopic` when there
    /// is nothing to ask the engine.
    pub fn into_payload(self, default_mode: &str) -> Result<ForwardedPayload> {
        let prompt = self.final_prompt();
        if prompt.is_empty() {
            return Err(RelayError::EmptyTopic);
        }
        let mode = self.final_mode(default_mode);

        let mut payload = self.extra;
        payload.insert("prompt".to_string(), Value::String(prompt));
        payload.insert("mode".to_string(), mode);
        Ok(ForwardedPayload(payload))
    }
}

/// Full normalization step: raw body to forwarded payload.
pub fn normalize(
    body: &[u8],
    content_type: Option<&str>,
    default_mode: &str,
) -> Result<ForwardedPayload> {
    let fields = parse_body(body, content_type)?;
    IncomingRequest::from_fields(fields)?.into_payload(default_mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JSON: Option<&str> = Some("application/json");

    fn run(body: &str) -> Result<ForwardedPayload> {
        normalize(body.as_bytes(), JSON, "KR")
    }

    #[test]
    fn test_topic_becomes_prompt() {
        let payload = run(r#"{"topic":"  exchange rate spike ","country":"kr"}"#).unwrap();
        assert_eq!(payload.prompt(), "exchange rate spike");
        assert_eq!(payload.mode(), Some(&json!("KR")));
        assert_eq!(payload.as_map()["topic"], "  exchange rate spike ");
        assert_eq!(payload.as_map()["country"], "kr");
    }

    #[test]
    fn test_explicit_prompt_wins() {
        let payload = run(r#"{"topic":"ignored","prompt":"use me","mode":"deep"}"#).unwrap();
        assert_eq!(payload.prompt(), "use me");
        assert_eq!(payload.mode(), Some(&json!("deep")));
    }

    #[test]
    fn test_blank_prompt_falls_back_to_topic() {
        let payload = run(r#"{"topic":"rates","prompt":"   "}"#).unwrap();
        assert_eq!(payload.prompt(), "rates");
    }

    #[test]
    fn test_extra_json_envelope_is_inlined() {
        let payload = run(
            r#"{"topic":"rates","country":"us","extraJson":"{\"tone\":\"calm\",\"mode\":\"brief\"}"}"#,
        )
        .unwrap();

        assert_eq!(payload.as_map()["tone"], "calm");
        assert_eq!(payload.mode(), Some(&json!("brief")));
        assert!(!payload.as_map().contains_key(EXTRA_JSON_FIELD));
    }

    #[test]
    fn test_extra_json_object_accepted() {
        let payload = run(r#"{"topic":"t","extraJson":{"prompt":"p","n":3}}"#).unwrap();
        assert_eq!(payload.prompt(), "p");
        assert_eq!(payload.as_map()["n"], 3);
    }

    #[test]
    fn test_blank_extra_json_ignored() {
        let payload = run(r#"{"topic":"t","extraJson":"  "}"#).unwrap();
        assert_eq!(payload.as_map().len(), 3);
    }

    #[test]
    fn test_extra_json_country_drives_mode() {
        let payload = run(r#"{"topic":"t","country":"KR","extraJson":"{\"country\":\"jp\"}"}"#).unwrap();
        assert_eq!(payload.as_map()["country"], "jp");
        assert_eq!(payload.mode(), Some(&json!("JP")));
    }

    #[test]
    fn test_extra_json_topic_drives_prompt() {
        let payload =
            run(r#"{"topic":"body topic","extraJson":"{\"topic\":\"extra topic\"}"}"#).unwrap();
        assert_eq!(payload.as_map()["topic"], "extra topic");
        assert_eq!(payload.prompt(), "extra topic");
    }

    #[test]
    fn test_topic_only_in_extra_json() {
        let payload = run(r#"{"extraJson":"{\"topic\":\"  from extra \"}"}"#).unwrap();
        assert_eq!(payload.prompt(), "from extra");
    }

    #[test]
    fn test_malformed_extra_json() {
        let err = run(r#"{"topic":"t","extraJson":"{oops"}"#).unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");
    }

    #[test]
    fn test_malformed_body() {
        let err = run("{\"topic\": ").unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");

        let err = normalize(b"topic=plain text", Some("text/plain"), "KR").unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");
    }

    #[test]
    fn test_empty_body_is_empty_topic() {
        for body in ["", "   \n", "[1,2]", "42", "{}"] {
            let err = run(body).unwrap_err();
            assert_eq!(err.code(), "EMPTY_TOPIC", "body {body:?}");
        }
    }

    #[test]
    fn test_whitespace_topic_rejected() {
        let err = run(r#"{"topic":"   ","country":"KR"}"#).unwrap_err();
        assert_eq!(err.code(), "EMPTY_TOPIC");
    }

    #[test]
    fn test_default_mode_when_nothing_given() {
        let payload = normalize(br#"{"topic":"t"}"#, None, "default").unwrap();
        assert_eq!(payload.mode(), Some(&json!("default")));

        let payload = run(r#"{"topic":"t","mode":null,"country":" "}"#).unwrap();
        assert_eq!(payload.mode(), Some(&json!("KR")));
    }

    #[test]
    fn test_form_body() {
        let payload = normalize(
            b"topic=exchange+rate+spike&country=jp&extraJson=%7B%22tone%22%3A%22calm%22%7D",
            Some("application/x-www-form-urlencoded; charset=UTF-8"),
            "KR",
        )
        .unwrap();

        assert_eq!(payload.prompt(), "exchange rate spike");
        assert_eq!(payload.mode(), Some(&json!("JP")));
        assert_eq!(payload.as_map()["tone"], "calm");
    }

    #[test]
    fn test_non_string_topic_kept_but_not_used() {
        let err = run(r#"{"topic":7}"#).unwrap_err();
        assert_eq!(err.code(), "EMPTY_TOPIC");

        let payload = run(r#"{"topic":7,"prompt":"p"}"#).unwrap();
        assert_eq!(payload.as_map()["topic"], 7);
    }
}
