use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::DesignError;

/// The ten domain keys the vision model is asked to return.
pub const ANALYSIS_FIELDS: [&str; 10] = [
    "room_type",
    "current_style",
    "features",
    "furniture",
    "colors",
    "lighting",
    "dimensions_estimate",
    "condition",
    "challenges",
    "opportunities",
];

/// Structured description of one room photo.
///
/// Every field is required when deserializing; list fields also accept a
/// single string and scalar fields also accept a list (joined with `, `),
/// since vision models drift between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAnalysis {
    #[serde(deserialize_with = "flexible_text")]
    pub room_type: String,
    #[serde(deserialize_with = "flexible_text")]
    pub current_style: String,
    #[serde(deserialize_with = "flexible_list")]
    pub features: Vec<String>,
    #[serde(deserialize_with = "flexible_list")]
    pub furniture: Vec<String>,
    #[serde(deserialize_with = "flexible_list")]
    pub colors: Vec<String>,
    #[serde(deserialize_with = "flexible_text")]
    pub lighting: String,
    #[serde(deserialize_with = "flexible_text")]
    pub dimensions_estimate: String,
    #[serde(deserialize_with = "flexible_text")]
    pub condition: String,
    #[serde(deserialize_with = "flexible_list")]
    pub challenges: Vec<String>,
    #[serde(deserialize_with = "flexible_list")]
    pub opportunities: Vec<String>,
}

/// A successful analysis plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(flatten)]
    pub analysis: RoomAnalysis,
    pub image_path: String,
    pub model_used: String,
}

impl AnalysisRecord {
    pub fn summary(&self) -> String {
        let room = &self.analysis;
        format!(
            "ROOM ANALYSIS SUMMARY\n\
             ------------------------\n\
             Room Type: {}\n\
             Current Style: {}\n\
             Size: {}\n\
             Condition: {}\n\
             \n\
             Features: {}\n\
             Colors: {}\n\
             Lighting: {}\n\
             \n\
             Challenges: {}\n\
             Opportunities: {}\n",
            room.room_type,
            room.current_style,
            room.dimensions_estimate,
            room.condition,
            room.features.join(", "),
            room.colors.join(", "),
            room.lighting,
            room.challenges.join(", "),
            room.opportunities.join(", "),
        )
    }
}

/// Result of one analysis call. Either the full record or an error, never a
/// mix of the two; serializes to the flat shape written into run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Analyzed(AnalysisRecord),
    Malformed {
        error: String,
        raw_response: String,
        image_path: String,
    },
    ServiceFailed {
        error: String,
        image_path: String,
    },
}

impl AnalysisOutcome {
    pub fn from_error(err: &DesignError, image_path: impl Into<String>) -> Self {
        let image_path = image_path.into();
        match err {
            DesignError::MalformedResponse {
                message,
                raw_response,
            } => Self::Malformed {
                error: message.clone(),
                raw_response: raw_response.clone().unwrap_or_default(),
                image_path,
            },
            other => Self::ServiceFailed {
                error: other.to_string(),
                image_path,
            },
        }
    }

    pub fn record(&self) -> Option<&AnalysisRecord> {
        match self {
            Self::Analyzed(record) => Some(record),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Analyzed(_) => None,
            Self::Malformed { error, .. } | Self::ServiceFailed { error, .. } => Some(error),
        }
    }

    /// `malformed_response` / `service_error`, matching [`DesignError::kind`].
    pub fn signal(&self) -> Option<&'static str> {
        match self {
            Self::Analyzed(_) => None,
            Self::Malformed { .. } => Some("malformed_response"),
            Self::ServiceFailed { .. } => Some("service_error"),
        }
    }

    pub fn into_result(self) -> Result<AnalysisRecord, DesignError> {
        match self {
            Self::Analyzed(record) => Ok(record),
            Self::Malformed {
                error,
                raw_response,
                ..
            } => Err(DesignError::malformed(error, Some(raw_response))),
            Self::ServiceFailed { error, .. } => Err(DesignError::service("analysis", error)),
        }
    }
}

fn flexible_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.trim().to_string())
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<String, A::Error> {
            Ok(collect_items(seq)?.join(", "))
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

fn flexible_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ListVisitor;

    impl<'de> Visitor<'de> for ListVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a list of strings or a single string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Vec<String>, E> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![trimmed.to_string()])
        }

        fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Vec<String>, A::Error> {
            collect_items(seq)
        }
    }

    deserializer.deserialize_any(ListVisitor)
}

fn collect_items<'de, A: SeqAccess<'de>>(mut seq: A) -> Result<Vec<String>, A::Error> {
    let mut items = Vec::new();
    while let Some(item) = seq.next_element::<serde_json::Value>()? {
        let text = match item {
            serde_json::Value::String(text) => text.trim().to_string(),
            serde_json::Value::Null => continue,
            other => other.to_string(),
        };
        if !text.is_empty() {
            items.push(text);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn living_room() -> Value {
        json!({
            "room_type": "living_room",
            "current_style": "traditional",
            "features": ["bay window", "fireplace"],
            "furniture": ["sofa", "coffee table"],
            "colors": ["beige", "brown"],
            "lighting": "natural",
            "dimensions_estimate": "medium 100-200sqft",
            "condition": "needs_refresh",
            "challenges": ["dark corners"],
            "opportunities": ["accent wall"],
            "image_path": "photos/living.jpg",
            "model_used": "gemini-2.5-flash-image"
        })
    }

    #[test]
    fn record_keeps_every_domain_field() -> anyhow::Result<()> {
        let record: AnalysisRecord = serde_json::from_value(living_room())?;
        assert_eq!(record.analysis.room_type, "living_room");
        assert_eq!(record.analysis.features, vec!["bay window", "fireplace"]);
        assert_eq!(record.model_used, "gemini-2.5-flash-image");

        let back = serde_json::to_value(&record)?;
        for field in ANALYSIS_FIELDS {
            assert!(back.get(field).is_some(), "missing {field}");
        }
        Ok(())
    }

    #[test]
    fn lenient_shapes_are_normalized() -> anyhow::Result<()> {
        let mut raw = living_room();
        raw["features"] = json!("fireplace");
        raw["lighting"] = json!(["natural", "artificial"]);
        raw["challenges"] = json!("");
        let record: AnalysisRecord = serde_json::from_value(raw)?;
        assert_eq!(record.analysis.features, vec!["fireplace"]);
        assert_eq!(record.analysis.lighting, "natural, artificial");
        assert!(record.analysis.challenges.is_empty());
        Ok(())
    }

    #[test]
    fn missing_domain_field_is_rejected() {
        let mut raw = living_room();
        if let Some(obj) = raw.as_object_mut() {
            obj.remove("condition");
        }
        assert!(serde_json::from_value::<AnalysisRecord>(raw).is_err());
    }

    #[test]
    fn outcome_serializes_flat_and_never_mixes() -> anyhow::Result<()> {
        let failed = AnalysisOutcome::from_error(
            &DesignError::malformed("Failed to parse JSON response", Some("not json".into())),
            "photos/living.jpg",
        );
        let value = serde_json::to_value(&failed)?;
        assert_eq!(value["error"], json!("Failed to parse JSON response"));
        assert_eq!(value["raw_response"], json!("not json"));
        assert!(value.get("room_type").is_none());
        assert_eq!(failed.signal(), Some("malformed_response"));

        let ok: AnalysisOutcome = serde_json::from_value(living_room())?;
        assert!(ok.error().is_none());
        assert!(ok.record().is_some());

        let service: AnalysisOutcome =
            serde_json::from_value(json!({"error": "quota", "image_path": "a.jpg"}))?;
        assert_eq!(service.signal(), Some("service_error"));
        assert!(service.into_result().is_err());
        Ok(())
    }

    #[test]
    fn summary_lists_features_and_opportunities() -> anyhow::Result<()> {
        let record: AnalysisRecord = serde_json::from_value(living_room())?;
        let summary = record.summary();
        assert!(summary.contains("Room Type: living_room"));
        assert!(summary.contains("Features: bay window, fireplace"));
        assert!(summary.contains("Opportunities: accent wall"));
        Ok(())
    }
}
