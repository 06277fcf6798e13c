use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use roomcraft_contracts::error::{error_chain_text, truncate_text};
use roomcraft_contracts::{DesignError, DesignResult};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Settings;

const ERROR_BODY_MAX_CHARS: usize = 512;
const RAW_RESPONSE_MAX_CHARS: usize = 2000;

/// Transport seam for every hosted-model call.
///
/// Payloads and responses are the REST JSON shapes; the engine builds the
/// former and checks the latter without knowing which transport is behind
/// the trait.
pub trait ModelBackend {
    fn name(&self) -> &str;

    fn generate_content(&self, model: &str, payload: &Value) -> DesignResult<Value>;

    fn predict(&self, model: &str, _payload: &Value) -> DesignResult<Value> {
        Err(DesignError::unsupported(model, "the predict endpoint"))
    }
}

/// Blocking client for the Gemini REST API.
pub struct GeminiClient {
    api_base: String,
    api_key: String,
    http: HttpClient,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> DesignResult<Self> {
        let http = HttpClient::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| {
                DesignError::configuration(format!(
                    "http client init failed: {}",
                    error_chain_text(&err, ERROR_BODY_MAX_CHARS)
                ))
            })?;
        Ok(Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            http,
        })
    }

    fn endpoint_for_model(&self, model: &str, method: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:{method}", self.api_base, model_path)
    }

    fn post(&self, model: &str, method: &str, payload: &Value) -> DesignResult<Value> {
        let endpoint = self.endpoint_for_model(model, method);
        debug!(%endpoint, "posting model request");
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(payload)
            .send()
            .map_err(|err| {
                DesignError::service(
                    self.name(),
                    format!(
                        "request to {model} failed: {}",
                        error_chain_text(&err, ERROR_BODY_MAX_CHARS)
                    ),
                )
            })?;
        response_json_or_error(self.name(), response)
    }
}

impl ModelBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate_content(&self, model: &str, payload: &Value) -> DesignResult<Value> {
        self.post(model, "generateContent", payload)
    }

    fn predict(&self, model: &str, payload: &Value) -> DesignResult<Value> {
        self.post(model, "predict", payload)
    }
}

fn response_json_or_error(backend: &str, response: HttpResponse) -> DesignResult<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response.text().map_err(|err| {
        DesignError::service(
            backend,
            format!(
                "response body read failed: {}",
                error_chain_text(&err, ERROR_BODY_MAX_CHARS)
            ),
        )
    })?;
    if !status.is_success() {
        return Err(DesignError::service(
            backend,
            format!("HTTP {code}: {}", truncate_text(&body, ERROR_BODY_MAX_CHARS)),
        ));
    }
    serde_json::from_str(&body).map_err(|err| {
        DesignError::malformed(
            format!("{backend} returned invalid JSON: {err}"),
            Some(truncate_text(&body, RAW_RESPONSE_MAX_CHARS)),
        )
    })
}

pub fn text_part(text: &str) -> Value {
    json!({ "text": text })
}

pub fn user_content(parts: Vec<Value>) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": parts,
        }]
    })
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Reads and decodes an image, returning it as an inline request part.
///
/// Decoding is the only validation; anything the `image` crate loads is
/// accepted.
pub fn image_part_from_path(path: &Path) -> DesignResult<Value> {
    let bytes = fs::read(path)?;
    let decoded_format = image::guess_format(&bytes).ok();
    image::load_from_memory(&bytes).map_err(|err| {
        DesignError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{} is not a loadable image: {err}", path.display()),
        ))
    })?;
    let mime = decoded_format
        .map(|format| format.to_mime_type())
        .or_else(|| mime_for_path(path))
        .unwrap_or("image/png");
    Ok(json!({
        "inlineData": {
            "mimeType": mime,
            "data": BASE64.encode(bytes),
        }
    }))
}

/// Concatenated text parts of every candidate.
pub fn response_text(payload: &Value) -> String {
    let mut out = String::new();
    let candidates = payload
        .get("candidates")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for candidate in candidates {
        let parts = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
    }
    out
}

fn block_reason(payload: &Value) -> Option<&str> {
    payload
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
}

/// One text-output call. An empty reply is a malformed response.
pub fn generate_text(
    backend: &dyn ModelBackend,
    model: &str,
    parts: Vec<Value>,
    generation_config: Option<Value>,
) -> DesignResult<String> {
    let mut payload = user_content(parts);
    if let (Some(config), Some(object)) = (generation_config, payload.as_object_mut()) {
        object.insert("generationConfig".to_string(), config);
    }
    let response = backend.generate_content(model, &payload)?;
    if let Some(reason) = block_reason(&response) {
        return Err(DesignError::service(
            backend.name(),
            format!("prompt blocked by {model}: {reason}"),
        ));
    }
    let text = response_text(&response);
    if text.trim().is_empty() {
        return Err(DesignError::malformed(
            format!("{model} returned no text content"),
            Some(truncate_text(&response.to_string(), RAW_RESPONSE_MAX_CHARS)),
        ));
    }
    Ok(text)
}
