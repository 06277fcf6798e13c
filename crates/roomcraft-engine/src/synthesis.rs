use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageFormat;
use roomcraft_contracts::chain::{BackendChain, NamedBackend};
use roomcraft_contracts::error::truncate_text;
use roomcraft_contracts::models::{ModelRegistry, CAP_EDIT, CAP_IMAGE};
use roomcraft_contracts::runs::naming::OutputNaming;
use roomcraft_contracts::{DesignError, DesignResult};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::client::{image_part_from_path, response_text, text_part, user_content, ModelBackend};
use crate::config::Settings;

pub const RENDER_PREFIX: &str = "transformation";
const RESPONSE_TEXT_MAX_CHARS: usize = 500;

/// One way of asking a hosted model for image bytes.
pub trait SynthesisBackend: NamedBackend {
    fn model(&self) -> &str;

    fn build_request(&self, prompt: &str, reference: Option<&Path>) -> DesignResult<Value>;

    fn send(&self, client: &dyn ModelBackend, payload: &Value) -> DesignResult<Value>;
}

/// `generateContent` with image output requested.
#[derive(Debug, Clone)]
pub struct GeminiImageBackend {
    name: String,
    model: String,
}

impl GeminiImageBackend {
    pub fn new(model: impl Into<String>) -> Self {
        Self::named("gemini-image", model)
    }

    pub fn named(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

impl NamedBackend for GeminiImageBackend {
    fn name(&self) -> &str {
        &self.name
    }
}

impl SynthesisBackend for GeminiImageBackend {
    fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str, reference: Option<&Path>) -> DesignResult<Value> {
        let mut parts = vec![text_part(prompt)];
        if let Some(path) = reference {
            parts.push(image_part_from_path(path)?);
        }
        let mut payload = user_content(parts);
        if let Some(object) = payload.as_object_mut() {
            object.insert(
                "generationConfig".to_string(),
                json!({
                    "responseModalities": ["IMAGE"],
                    "temperature": 0.4,
                }),
            );
        }
        Ok(payload)
    }

    fn send(&self, client: &dyn ModelBackend, payload: &Value) -> DesignResult<Value> {
        client.generate_content(&self.model, payload)
    }
}

/// Imagen `:predict`. Text-to-image only.
#[derive(Debug, Clone)]
pub struct ImagenBackend {
    model: String,
}

impl ImagenBackend {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl NamedBackend for ImagenBackend {
    fn name(&self) -> &str {
        "imagen"
    }
}

impl SynthesisBackend for ImagenBackend {
    fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str, reference: Option<&Path>) -> DesignResult<Value> {
        if reference.is_some() {
            return Err(DesignError::unsupported(&self.model, "reference image editing"));
        }
        Ok(json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "1:1",
            }
        }))
    }

    fn send(&self, client: &dyn ModelBackend, payload: &Value) -> DesignResult<Value> {
        client.predict(&self.model, payload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedImage {
    pub path: PathBuf,
    pub base64: String,
    pub width: u32,
    pub height: u32,
    pub sha256: String,
    pub backend: String,
    pub model: String,
}

/// Result of walking the backend chain. Only `Generated` carries an image;
/// the other two are degradations, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Generated(SynthesizedImage),
    /// At least one backend answered, none with image bytes.
    NoImage {
        reason: String,
        response_text: String,
    },
    /// Every backend was skipped or errored.
    Failed { reason: String },
}

impl SynthesisOutcome {
    pub fn image(&self) -> Option<&SynthesizedImage> {
        match self {
            Self::Generated(image) => Some(image),
            _ => None,
        }
    }

    /// Human-readable note for the rendering result.
    pub fn note(&self) -> String {
        match self {
            Self::Generated(image) => format!(
                "Image generated with {} ({})",
                image.backend, image.model
            ),
            Self::NoImage { reason, .. } => {
                format!("Text description only: image generation returned no image ({reason})")
            }
            Self::Failed { reason } => {
                format!("Text description only: image generation failed ({reason})")
            }
        }
    }
}

fn inline_payload(part: &Value) -> Option<&str> {
    let inline = part.get("inlineData").or_else(|| part.get("inline_data"))?;
    let data = match inline {
        Value::String(data) => data.as_str(),
        Value::Object(fields) => fields.get("data").and_then(Value::as_str)?,
        _ => return None,
    };
    Some(data).filter(|data| !data.is_empty())
}

fn parts_payloads<'v>(parts: Option<&'v Value>, out: &mut Vec<&'v str>) {
    if let Some(parts) = parts.and_then(Value::as_array) {
        out.extend(parts.iter().filter_map(inline_payload));
    }
}

fn array<'v>(response: &'v Value, key: &str) -> &'v [Value] {
    response
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Every encoded payload in lookup order: candidate parts, then the flat
/// encodings.
fn encoded_images(response: &Value) -> Vec<&str> {
    let mut found = Vec::new();
    for candidate in array(response, "candidates") {
        parts_payloads(candidate.pointer("/content/parts"), &mut found);
    }
    parts_payloads(response.get("parts"), &mut found);
    found.extend(array(response, "predictions").iter().filter_map(|prediction| {
        prediction
            .get("bytesBase64Encoded")
            .and_then(Value::as_str)
    }));
    found.extend(array(response, "generatedImages").iter().filter_map(|entry| {
        entry.pointer("/image/imageBytes").and_then(Value::as_str)
    }));
    found.retain(|data| !data.is_empty());
    found
}

/// Image bytes from any response encoding we know, or `None`.
///
/// Candidate parts are checked first, then the flat encodings (top-level
/// parts, predictions, generated images). The first payload that decodes
/// wins; it is an error only when payloads exist and none decode.
pub fn extract_inline_image(response: &Value) -> DesignResult<Option<Vec<u8>>> {
    let mut last_error = None;
    for encoded in encoded_images(response) {
        match BASE64.decode(encoded.as_bytes()) {
            Ok(bytes) => return Ok(Some(bytes)),
            Err(err) => last_error = Some(err),
        }
    }
    match last_error {
        Some(err) => Err(DesignError::malformed(
            format!("inline image is not valid base64: {err}"),
            None,
        )),
        None => Ok(None),
    }
}

/// Walks a backend chain until one produces an image and persists it.
pub struct ImageSynthesizer<'a> {
    client: &'a dyn ModelBackend,
    chain: BackendChain<Box<dyn SynthesisBackend>>,
    registry: ModelRegistry,
    output_dir: PathBuf,
    naming: OutputNaming,
}

impl<'a> ImageSynthesizer<'a> {
    pub fn new(
        client: &'a dyn ModelBackend,
        chain: BackendChain<Box<dyn SynthesisBackend>>,
        output_dir: impl Into<PathBuf>,
        naming: OutputNaming,
    ) -> Self {
        Self {
            client,
            chain,
            registry: ModelRegistry::default(),
            output_dir: output_dir.into(),
            naming,
        }
    }

    /// Primary image model first, then the optional secondary model on
    /// whichever endpoint its provider uses.
    pub fn from_settings(client: &'a dyn ModelBackend, settings: &Settings) -> Self {
        let registry = ModelRegistry::default();
        let mut chain: BackendChain<Box<dyn SynthesisBackend>> = BackendChain::default();
        chain.push(Box::new(GeminiImageBackend::new(settings.image_model.clone())));
        if let Some(model) = &settings.fallback_image_model {
            if registry.resolve(model).uses_predict_endpoint() {
                chain.push(Box::new(ImagenBackend::new(model.clone())));
            } else {
                chain.push(Box::new(GeminiImageBackend::named(
                    "gemini-image-secondary",
                    model.clone(),
                )));
            }
        }
        Self {
            client,
            chain,
            registry,
            output_dir: settings.rendered_dir(),
            naming: settings.output_naming,
        }
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.chain.names()
    }

    pub fn synthesize(&self, prompt: &str, reference: Option<&Path>) -> SynthesisOutcome {
        let mut notes: Vec<String> = Vec::new();
        let mut answered_text: Option<String> = None;

        for backend in self.chain.iter() {
            let name = backend.name();
            let model = backend.model();
            let spec = self.registry.resolve(model);
            if !spec.supports(CAP_IMAGE) {
                notes.push(format!("{name}: {}", DesignError::unsupported(model, "image output")));
                continue;
            }
            if reference.is_some() && !spec.supports(CAP_EDIT) {
                let err = DesignError::unsupported(model, "reference image editing");
                debug!(backend = name, "skipping: {err}");
                notes.push(format!("{name}: {err}"));
                continue;
            }

            let attempt = backend
                .build_request(prompt, reference)
                .and_then(|payload| backend.send(self.client, &payload));
            let response = match attempt {
                Ok(response) => response,
                Err(err) => {
                    warn!(backend = name, kind = err.kind(), "image synthesis failed: {err}");
                    notes.push(format!("{name}: {err}"));
                    continue;
                }
            };

            let bytes = match extract_inline_image(&response) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    info!(backend = name, "no image data in response");
                    notes.push(format!("{name}: no image data in response"));
                    answered_text.get_or_insert_with(|| {
                        truncate_text(&response_text(&response), RESPONSE_TEXT_MAX_CHARS)
                    });
                    continue;
                }
                Err(err) => {
                    notes.push(format!("{name}: {err}"));
                    continue;
                }
            };

            match self.persist(&bytes, name, model) {
                Ok(image) => {
                    info!(backend = name, path = %image.path.display(), "image persisted");
                    return SynthesisOutcome::Generated(image);
                }
                Err(err) => {
                    warn!(backend = name, kind = err.kind(), "image persist failed: {err}");
                    notes.push(format!("{name}: {err}"));
                }
            }
        }

        if self.chain.is_empty() {
            notes.push("no image backend configured".to_string());
        }
        let reason = notes.join("; ");
        match answered_text {
            Some(response_text) => SynthesisOutcome::NoImage {
                reason,
                response_text,
            },
            None => SynthesisOutcome::Failed { reason },
        }
    }

    fn persist(&self, bytes: &[u8], backend: &str, model: &str) -> DesignResult<SynthesizedImage> {
        let decoded = image::load_from_memory(bytes).map_err(|err| {
            DesignError::malformed(format!("image payload could not be decoded: {err}"), None)
        })?;
        let mut png = Cursor::new(Vec::new());
        decoded.write_to(&mut png, ImageFormat::Png).map_err(|err| {
            DesignError::Io(std::io::Error::other(format!("png encode failed: {err}")))
        })?;
        let png = png.into_inner();

        fs::create_dir_all(&self.output_dir)?;
        let path = self.naming.path_in(&self.output_dir, RENDER_PREFIX, "png");
        fs::write(&path, &png)?;

        Ok(SynthesizedImage {
            path,
            base64: BASE64.encode(&png),
            width: decoded.width(),
            height: decoded.height(),
            sha256: hex::encode(Sha256::digest(&png)),
            backend: backend.to_string(),
            model: model.to_string(),
        })
    }
}
