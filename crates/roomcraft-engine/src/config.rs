use std::path::{Path, PathBuf};
use std::time::Duration;

use roomcraft_contracts::runs::naming::OutputNaming;
use roomcraft_contracts::{DesignError, DesignResult};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_MAX_PHOTOS: usize = 5;
pub const DEFAULT_INPUT_DIR: &str = "test_photos";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const PLACEHOLDER_API_KEY: &str = "your_google_api_key_here";

const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Process-wide configuration, resolved once at startup.
///
/// `rendered_dir` and `events_path` follow `output_dir` unless set
/// explicitly, so overriding the output directory moves both.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_base: String,
    pub vision_model: String,
    pub image_model: String,
    pub fallback_image_model: Option<String>,
    pub text_model: String,
    pub max_photos: usize,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub rendered_dir: Option<PathBuf>,
    pub events_path: Option<PathBuf>,
    pub output_naming: OutputNaming,
    pub request_timeout: Option<Duration>,
}

impl Settings {
    pub fn from_lookup<F>(lookup: F) -> DesignResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|key| value(key))
            .unwrap_or_default();

        let max_photos = match value("ROOMCRAFT_MAX_PHOTOS") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                DesignError::configuration(format!("ROOMCRAFT_MAX_PHOTOS must be a number, got '{raw}'"))
            })?,
            None => DEFAULT_MAX_PHOTOS,
        };

        let request_timeout = match value("ROOMCRAFT_REQUEST_TIMEOUT") {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => None,
        };

        let output_naming = match value("ROOMCRAFT_OUTPUT_NAMING") {
            Some(raw) => raw.parse::<OutputNaming>()?,
            None => OutputNaming::default(),
        };

        let settings = Self {
            api_key,
            api_base: value("GEMINI_API_BASE")
                .map(|raw| raw.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            vision_model: value("ROOMCRAFT_VISION_MODEL")
                .unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            image_model: value("ROOMCRAFT_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            fallback_image_model: value("ROOMCRAFT_FALLBACK_IMAGE_MODEL"),
            text_model: value("ROOMCRAFT_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            max_photos,
            input_dir: value("ROOMCRAFT_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR)),
            output_dir: value("ROOMCRAFT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            rendered_dir: value("ROOMCRAFT_RENDERED_DIR").map(PathBuf::from),
            events_path: value("ROOMCRAFT_EVENTS_FILE").map(PathBuf::from),
            output_naming,
            request_timeout,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Re-checked after CLI overrides are applied.
    pub fn validate(&self) -> DesignResult<()> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(DesignError::configuration(
                "GOOGLE_API_KEY (or GEMINI_API_KEY) is not set",
            ));
        }
        if key == PLACEHOLDER_API_KEY {
            return Err(DesignError::configuration(
                "GOOGLE_API_KEY still holds the placeholder value; set a real key",
            ));
        }
        for (label, model) in [
            ("vision model", &self.vision_model),
            ("image model", &self.image_model),
            ("text model", &self.text_model),
        ] {
            if model.trim().is_empty() {
                return Err(DesignError::configuration(format!("{label} is empty")));
            }
        }
        if let Some(model) = &self.fallback_image_model {
            if model.trim().is_empty() {
                return Err(DesignError::configuration("fallback image model is empty"));
            }
        }
        Ok(())
    }

    pub fn rendered_dir(&self) -> PathBuf {
        self.rendered_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("rendered_images"))
    }

    pub fn events_path(&self) -> PathBuf {
        self.events_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join("events.jsonl"))
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }
}

pub fn parse_timeout(raw: &str) -> DesignResult<Duration> {
    let seconds = raw.trim().parse::<f64>().map_err(|_| {
        DesignError::configuration(format!("request timeout must be seconds, got '{raw}'"))
    })?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(DesignError::configuration(format!(
            "request timeout must be positive, got '{raw}'"
        )));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        DesignError::configuration(format!("request timeout is out of range, got '{raw}'"))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use roomcraft_contracts::runs::naming::OutputNaming;

    use super::{Settings, DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL, PLACEHOLDER_API_KEY};

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, roomcraft_contracts::DesignError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_with_only_a_key() -> anyhow::Result<()> {
        let settings = settings_from(&[("GOOGLE_API_KEY", "k-123")])?;
        assert_eq!(settings.api_key, "k-123");
        assert_eq!(settings.vision_model, DEFAULT_VISION_MODEL);
        assert_eq!(settings.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(settings.max_photos, 5);
        assert_eq!(settings.output_dir, PathBuf::from("output"));
        assert_eq!(
            settings.rendered_dir(),
            PathBuf::from("output").join("rendered_images")
        );
        assert_eq!(settings.output_naming, OutputNaming::Timestamp);
        assert!(settings.request_timeout.is_none());
        assert!(settings.fallback_image_model.is_none());
        Ok(())
    }

    #[test]
    fn gemini_key_is_a_fallback_and_overrides_are_read() -> anyhow::Result<()> {
        let settings = settings_from(&[
            ("GEMINI_API_KEY", "g-456"),
            ("GEMINI_API_BASE", "http://localhost:9000/v1beta/"),
            ("ROOMCRAFT_OUTPUT_DIR", "runs"),
            ("ROOMCRAFT_OUTPUT_NAMING", "timestamp-uuid"),
            ("ROOMCRAFT_REQUEST_TIMEOUT", "30"),
            ("ROOMCRAFT_FALLBACK_IMAGE_MODEL", "imagen-4.0-generate-001"),
        ])?;
        assert_eq!(settings.api_key, "g-456");
        assert_eq!(settings.api_base, "http://localhost:9000/v1beta");
        assert_eq!(settings.events_path(), PathBuf::from("runs").join("events.jsonl"));
        assert_eq!(settings.output_naming, OutputNaming::TimestampUuid);
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            settings.fallback_image_model.as_deref(),
            Some("imagen-4.0-generate-001")
        );
        Ok(())
    }

    #[test]
    fn missing_or_placeholder_key_is_a_configuration_error() {
        let missing = settings_from(&[]).err().map(|err| err.kind());
        assert_eq!(missing, Some("configuration_error"));

        let placeholder = settings_from(&[("GOOGLE_API_KEY", PLACEHOLDER_API_KEY)])
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert!(placeholder.contains("placeholder"));
    }

    #[test]
    fn invalid_numbers_and_naming_are_rejected() {
        assert!(settings_from(&[("GOOGLE_API_KEY", "k"), ("ROOMCRAFT_MAX_PHOTOS", "many")]).is_err());
        assert!(settings_from(&[("GOOGLE_API_KEY", "k"), ("ROOMCRAFT_REQUEST_TIMEOUT", "-2")]).is_err());
        let huge = settings_from(&[("GOOGLE_API_KEY", "k"), ("ROOMCRAFT_REQUEST_TIMEOUT", "1e30")])
            .err()
            .map(|err| err.kind());
        assert_eq!(huge, Some("configuration_error"));
        assert!(settings_from(&[("GOOGLE_API_KEY", "k"), ("ROOMCRAFT_OUTPUT_NAMING", "random")]).is_err());
    }
}
