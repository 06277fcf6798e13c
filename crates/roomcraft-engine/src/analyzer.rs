use std::path::Path;

use roomcraft_contracts::records::{AnalysisOutcome, AnalysisRecord, RoomAnalysis};
use roomcraft_contracts::{DesignError, DesignResult};
use tracing::{info, warn};

use crate::client::{generate_text, image_part_from_path, text_part, ModelBackend};

pub const ANALYSIS_INSTRUCTION: &str = r#"Analyze this room photo and provide a detailed assessment in JSON format.

Please identify:
1. room_type: (bedroom, living_room, kitchen, bathroom, dining_room, office, other)
2. current_style: (modern, traditional, minimalist, industrial, farmhouse, eclectic, etc.)
3. features: List all notable features you see (windows, doors, built-ins, fireplace, etc.)
4. furniture: List current furniture pieces
5. colors: Dominant colors in the space
6. lighting: (natural, artificial, mixed, poor, good, excellent)
7. dimensions_estimate: (small <100sqft, medium 100-200sqft, large 200-400sqft, very_large >400sqft)
8. condition: (excellent, good, needs_refresh, needs_renovation)
9. challenges: List any design challenges (awkward layout, limited light, etc.)
10. opportunities: Design opportunities you see

Return ONLY valid JSON, no other text."#;

/// Vision-model wrapper producing one [`AnalysisOutcome`] per photo.
pub struct RoomAnalyzer<'a> {
    backend: &'a dyn ModelBackend,
    model: String,
}

impl<'a> RoomAnalyzer<'a> {
    pub fn new(backend: &'a dyn ModelBackend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Never fails: service and parse errors come back as outcome variants.
    pub fn analyze(&self, image_path: &Path) -> AnalysisOutcome {
        let path_text = image_path.display().to_string();
        match self.try_analyze(image_path) {
            Ok(record) => {
                info!(image = %path_text, room_type = %record.analysis.room_type, "room analyzed");
                AnalysisOutcome::Analyzed(record)
            }
            Err(err) => {
                warn!(image = %path_text, kind = err.kind(), "room analysis failed: {err}");
                AnalysisOutcome::from_error(&err, path_text)
            }
        }
    }

    fn try_analyze(&self, image_path: &Path) -> DesignResult<AnalysisRecord> {
        let image = image_part_from_path(image_path)?;
        let text = generate_text(
            self.backend,
            &self.model,
            vec![text_part(ANALYSIS_INSTRUCTION), image],
            None,
        )?;
        parse_analysis(&text, &image_path.display().to_string(), &self.model)
    }
}

/// Drops a leading ```` ```json ```` / ```` ``` ```` and a trailing ```` ``` ````.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

pub fn parse_analysis(text: &str, image_path: &str, model: &str) -> DesignResult<AnalysisRecord> {
    let analysis: RoomAnalysis = serde_json::from_str(strip_code_fences(text)).map_err(|err| {
        DesignError::malformed(
            format!("Failed to parse JSON response: {err}"),
            Some(text.to_string()),
        )
    })?;
    Ok(AnalysisRecord {
        analysis,
        image_path: image_path.to_string(),
        model_used: model.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use roomcraft_contracts::records::{AnalysisOutcome, ANALYSIS_FIELDS};
    use roomcraft_contracts::DesignError;
    use serde_json::{json, Value};

    use super::{parse_analysis, strip_code_fences, RoomAnalyzer, ANALYSIS_INSTRUCTION};
    use crate::fakes::{analysis_json, write_test_png, ScriptedBackend};

    #[test]
    fn strip_code_fences_handles_json_and_bare_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"b\":2}  "), "{\"b\":2}");
    }

    #[test]
    fn fenced_response_parses_into_a_complete_record() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let photo = temp.path().join("office.png");
        write_test_png(&photo, 8, 6)?;

        let backend = ScriptedBackend::new();
        backend.push_text(&format!("```json\n{}\n```", analysis_json()));
        let analyzer = RoomAnalyzer::new(&backend, "gemini-2.5-flash-image");

        let outcome = analyzer.analyze(&photo);
        let Some(record) = outcome.record() else {
            anyhow::bail!("expected an analysis record, got {outcome:?}");
        };
        assert_eq!(record.analysis.room_type, "office");
        assert_eq!(record.analysis.furniture, vec!["desk", "office chair"]);
        assert_eq!(record.model_used, "gemini-2.5-flash-image");

        let serialized = serde_json::to_value(&outcome)?;
        for field in ANALYSIS_FIELDS {
            let value = &serialized[field];
            let populated = match value {
                Value::String(text) => !text.trim().is_empty(),
                Value::Array(items) => !items.is_empty(),
                _ => false,
            };
            assert!(populated, "{field} should be populated");
        }
        assert!(serialized.get("error").is_none());

        let calls = backend.calls();
        let parts = &calls[0].payload["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], json!(ANALYSIS_INSTRUCTION));
        assert_eq!(parts[1]["inlineData"]["mimeType"], json!("image/png"));
        Ok(())
    }

    #[test]
    fn unparseable_reply_is_malformed_with_raw_text() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let photo = temp.path().join("room.png");
        write_test_png(&photo, 4, 4)?;

        let backend = ScriptedBackend::new();
        backend.push_text("I think this is a bedroom.");
        let outcome = RoomAnalyzer::new(&backend, "m").analyze(&photo);

        assert_eq!(outcome.signal(), Some("malformed_response"));
        let AnalysisOutcome::Malformed { raw_response, .. } = &outcome else {
            anyhow::bail!("expected malformed outcome");
        };
        assert_eq!(raw_response, "I think this is a bedroom.");
        let serialized = serde_json::to_value(&outcome)?;
        assert!(serialized.get("room_type").is_none());
        Ok(())
    }

    #[test]
    fn service_failure_and_bad_image_are_service_errors() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let photo = temp.path().join("room.png");
        write_test_png(&photo, 4, 4)?;

        let backend = ScriptedBackend::new();
        backend.push_error(DesignError::service("gemini", "HTTP 429: quota"));
        let outcome = RoomAnalyzer::new(&backend, "m").analyze(&photo);
        assert_eq!(outcome.signal(), Some("service_error"));
        assert!(outcome.error().unwrap_or_default().contains("quota"));

        let missing = RoomAnalyzer::new(&backend, "m").analyze(&temp.path().join("absent.jpg"));
        assert_eq!(missing.signal(), Some("service_error"));
        assert_eq!(backend.calls().len(), 1);
        Ok(())
    }

    #[test]
    fn partial_records_are_rejected() {
        let mut raw = analysis_json();
        if let Some(obj) = raw.as_object_mut() {
            obj.remove("condition");
        }
        let err = parse_analysis(&raw.to_string(), "a.jpg", "m").err();
        assert_eq!(err.map(|err| err.kind()), Some("malformed_response"));
    }
}
