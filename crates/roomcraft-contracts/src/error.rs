use thiserror::Error;

pub type DesignResult<T> = Result<T, DesignError>;

/// Failure taxonomy shared by every stage of a design run.
///
/// Stage components fold these into result values (`AnalysisOutcome`,
/// `RenderingResult`); only configuration and persistence failures are
/// propagated to callers as `Err`.
#[derive(Debug, Error)]
pub enum DesignError {
    /// The hosted model call itself failed: transport, auth, quota, or a
    /// non-success HTTP status.
    #[error("{backend} request failed: {message}")]
    Service { backend: String, message: String },

    /// The call succeeded but the payload did not match the expected shape.
    #[error("malformed response: {message}")]
    MalformedResponse {
        message: String,
        raw_response: Option<String>,
    },

    #[error("model '{model}' does not support {capability}")]
    UnsupportedCapability { model: String, capability: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DesignError {
    pub fn service(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>, raw_response: Option<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            raw_response,
        }
    }

    pub fn unsupported(model: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::UnsupportedCapability {
            model: model.into(),
            capability: capability.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Stable tag written into run logs and persisted reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Service { .. } => "service_error",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::UnsupportedCapability { .. } => "unsupported_capability",
            Self::Configuration(_) => "configuration_error",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

/// Flattens a source chain into `outer | caused by: inner`, skipping repeats.
pub fn error_chain_text(err: &(dyn std::error::Error + 'static), max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(cause) = current {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty()
            && !parts
                .last()
                .map(|existing| existing == trimmed)
                .unwrap_or(false)
        {
            parts.push(trimmed.to_string());
        }
        current = cause.source();
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::{error_chain_text, truncate_text, DesignError};

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(DesignError::service("gemini", "boom").kind(), "service_error");
        assert_eq!(
            DesignError::malformed("bad json", None).kind(),
            "malformed_response"
        );
        assert_eq!(
            DesignError::unsupported("gemini-2.0-flash", "image output").kind(),
            "unsupported_capability"
        );
        assert_eq!(
            DesignError::configuration("missing key").kind(),
            "configuration_error"
        );
    }

    #[test]
    fn chain_text_includes_io_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "room.jpg missing");
        let err = DesignError::from(io);
        let text = error_chain_text(&err, 200);
        assert!(text.starts_with("io error: room.jpg missing"));
    }

    #[test]
    fn truncate_appends_ellipsis_only_when_needed() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc…");
    }
}
