use roomcraft_contracts::records::{AnalysisRecord, DesignRequest, RenderingResult};
use roomcraft_contracts::DesignResult;
use serde_json::json;
use tracing::{info, warn};

use crate::client::{generate_text, image_part_from_path, text_part, ModelBackend};
use crate::prompts::{reference_prompt, refinement_prompt, rendering_prompt, synthesis_prompt};
use crate::synthesis::{ImageSynthesizer, SynthesisOutcome};

const NOTE_SYNTHESIS_UNAVAILABLE: &str = "Text description only: no image backend available";
const NOTE_REFINEMENT_TEXT_ONLY: &str = "Text description only: refinements are not re-rendered";

/// Produces the redesign description and, best-effort, an image.
pub struct RenderingGenerator<'a> {
    backend: &'a dyn ModelBackend,
    text_model: String,
    vision_model: String,
    synthesizer: Option<ImageSynthesizer<'a>>,
}

impl<'a> RenderingGenerator<'a> {
    pub fn new(
        backend: &'a dyn ModelBackend,
        text_model: impl Into<String>,
        vision_model: impl Into<String>,
        synthesizer: Option<ImageSynthesizer<'a>>,
    ) -> Self {
        Self {
            backend,
            text_model: text_model.into(),
            vision_model: vision_model.into(),
            synthesizer,
        }
    }

    /// Success depends only on the text step; a missing image is recorded
    /// in `note`.
    pub fn generate_rendering(
        &self,
        record: &AnalysisRecord,
        brief: &str,
        request: &DesignRequest,
    ) -> RenderingResult {
        let style = request.style.as_str();
        let custom_prompt = request.instruction();
        let reference = request.reference_image.as_deref();
        let prompt = match reference {
            Some(_) => reference_prompt(record, brief, style, custom_prompt),
            None => rendering_prompt(record, brief, style),
        };

        let description = match reference {
            Some(path) => image_part_from_path(path).and_then(|image| {
                generate_text(
                    self.backend,
                    &self.vision_model,
                    vec![text_part(&prompt), image],
                    Some(json!({ "responseMimeType": "text/plain" })),
                )
            }),
            None => generate_text(self.backend, &self.text_model, vec![text_part(&prompt)], None),
        };

        let description = match description {
            Ok(text) => text,
            Err(err) => {
                warn!(kind = err.kind(), "rendering description failed: {err}");
                let mut failed = RenderingResult::failed(&err, Some(prompt));
                failed.style = Some(style.to_string());
                failed.custom_prompt = custom_prompt.map(str::to_string);
                failed.used_reference_image = reference.is_some();
                failed.room_type = Some(record.analysis.room_type.clone());
                return failed;
            }
        };
        info!(chars = description.len(), "rendering description generated");

        let mut result = RenderingResult::described(description, prompt);
        result.style = Some(style.to_string());
        result.custom_prompt = custom_prompt.map(str::to_string);
        result.used_reference_image = reference.is_some();
        result.room_type = Some(record.analysis.room_type.clone());
        result.image_gen_available = self.synthesizer.is_some();

        let Some(synthesizer) = &self.synthesizer else {
            result.note = Some(NOTE_SYNTHESIS_UNAVAILABLE.to_string());
            return result;
        };
        let synthesis = synthesizer.synthesize(
            &synthesis_prompt(record, style, custom_prompt, reference.is_some()),
            reference,
        );
        result.note = Some(synthesis.note());
        if let SynthesisOutcome::Generated(image) = synthesis {
            result.image_path = Some(image.path.display().to_string());
            result.image_sha256 = Some(image.sha256);
            result.image_backend = Some(image.backend);
            result.image_width = Some(image.width);
            result.image_height = Some(image.height);
            result.image_base64 = Some(image.base64);
        }
        result
    }

    /// One text call over the previous description; never re-renders.
    pub fn refine_rendering(&self, previous: &RenderingResult, request: &str) -> RenderingResult {
        let prompt = refinement_prompt(previous.description().unwrap_or_default(), request);
        let outcome: DesignResult<String> =
            generate_text(self.backend, &self.text_model, vec![text_part(&prompt)], None);

        let mut result = match outcome {
            Ok(text) => {
                let mut refined = RenderingResult::described(text, prompt);
                refined.note = Some(NOTE_REFINEMENT_TEXT_ONLY.to_string());
                refined
            }
            Err(err) => {
                warn!(kind = err.kind(), "refinement failed: {err}");
                RenderingResult::failed(&err, Some(prompt))
            }
        };
        result.refinement_applied = Some(request.to_string());
        result.version = Some(previous.next_version());
        result.style = previous.style.clone();
        result.room_type = previous.room_type.clone();
        result
    }
}
