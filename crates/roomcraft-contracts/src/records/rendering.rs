use serde::{Deserialize, Serialize};

use crate::error::{error_chain_text, DesignError};

const ERROR_DETAIL_MAX_CHARS: usize = 4000;

/// Output of one generation (or refinement) call.
///
/// Invariants, upheld by the constructors:
/// - `success == true` ⇒ at least one of `rendering_description` / `image_path`
/// - `success == false` ⇒ `error` is set and `image_path` is not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderingResult {
    pub success: bool,
    pub rendering_description: Option<String>,
    pub prompt_used: Option<String>,
    pub style: Option<String>,
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub used_reference_image: bool,
    pub note: Option<String>,
    pub room_type: Option<String>,
    pub image_path: Option<String>,
    pub image_sha256: Option<String>,
    pub image_backend: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    /// In-memory copy of the rendered image; reports reference `image_path`.
    #[serde(default, skip_serializing)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub image_gen_available: bool,
    pub refinement_applied: Option<String>,
    pub version: Option<u32>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
    pub error_details: Option<String>,
}

impl RenderingResult {
    pub fn described(description: impl Into<String>, prompt_used: impl Into<String>) -> Self {
        Self {
            success: true,
            rendering_description: Some(description.into()),
            prompt_used: Some(prompt_used.into()),
            ..Self::empty()
        }
    }

    pub fn failed(err: &DesignError, prompt_used: Option<String>) -> Self {
        Self {
            success: false,
            prompt_used,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
            error_details: Some(error_chain_text(err, ERROR_DETAIL_MAX_CHARS)),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            success: false,
            rendering_description: None,
            prompt_used: None,
            style: None,
            custom_prompt: None,
            used_reference_image: false,
            note: None,
            room_type: None,
            image_path: None,
            image_sha256: None,
            image_backend: None,
            image_width: None,
            image_height: None,
            image_base64: None,
            image_gen_available: false,
            refinement_applied: None,
            version: None,
            error: None,
            error_kind: None,
            error_details: None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.rendering_description.as_deref()
    }

    /// Version the next refinement of this rendering gets; an unversioned
    /// rendering counts as version 1.
    pub fn next_version(&self) -> u32 {
        self.version.unwrap_or(1) + 1
    }

    pub fn is_consistent(&self) -> bool {
        if self.success {
            self.rendering_description.is_some() || self.image_path.is_some()
        } else {
            self.error.is_some() && self.image_path.is_none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn described_result_is_consistent() {
        let result = RenderingResult::described("A bright coastal den", "prompt");
        assert!(result.success);
        assert!(result.is_consistent());
        assert_eq!(result.description(), Some("A bright coastal den"));
        assert!(result.image_path.is_none());
    }

    #[test]
    fn failed_result_carries_error_kind_and_no_image() {
        let err = DesignError::service("gemini", "connection reset");
        let result = RenderingResult::failed(&err, Some("prompt".to_string()));
        assert!(!result.success);
        assert!(result.is_consistent());
        assert_eq!(result.error_kind.as_deref(), Some("service_error"));
        assert!(result
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("connection reset"));
        assert!(result.image_path.is_none());
    }

    #[test]
    fn next_version_defaults_to_two() {
        let mut result = RenderingResult::described("x", "p");
        assert_eq!(result.next_version(), 2);
        result.version = Some(4);
        assert_eq!(result.next_version(), 5);
    }

    #[test]
    fn inline_image_stays_out_of_serialized_reports() -> anyhow::Result<()> {
        let mut result = RenderingResult::described("x", "p");
        result.image_path = Some("rendered/den.png".to_string());
        result.image_width = Some(8);
        result.image_base64 = Some("aW1n".to_string());

        let value = serde_json::to_value(&result)?;
        assert!(value.get("image_base64").is_none());
        assert_eq!(value["image_width"], 8);

        let back: RenderingResult = serde_json::from_value(value)?;
        assert_eq!(back.image_base64, None);
        assert_eq!(back.image_width, Some(8));
        Ok(())
    }

    #[test]
    fn success_without_output_is_inconsistent() {
        let mut result = RenderingResult::described("x", "p");
        result.rendering_description = None;
        assert!(!result.is_consistent());
    }
}
