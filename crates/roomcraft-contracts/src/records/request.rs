use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DesignError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Low,
    #[default]
    Moderate,
    High,
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 3] = [BudgetTier::Low, BudgetTier::Moderate, BudgetTier::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    pub fn price_band(self) -> &'static str {
        match self {
            Self::Low => "$1,000 - $3,000",
            Self::Moderate => "$3,000 - $7,000",
            Self::High => "$7,000+",
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the tier names in any case and the menu numbers `1`-`3`.
impl FromStr for BudgetTier {
    type Err = DesignError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" | "1" => Ok(Self::Low),
            "moderate" | "2" => Ok(Self::Moderate),
            "high" | "3" => Ok(Self::High),
            other => Err(DesignError::configuration(format!(
                "unknown budget tier '{other}' (expected low, moderate or high)"
            ))),
        }
    }
}

/// What the user asked for on one transformation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignRequest {
    pub instruction: Option<String>,
    pub style: String,
    pub budget: BudgetTier,
    pub reference_image: Option<PathBuf>,
}

impl DesignRequest {
    pub fn new(style: impl Into<String>, budget: BudgetTier) -> Self {
        Self {
            instruction: None,
            style: style.into(),
            budget,
            reference_image: None,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        let text = instruction.into();
        let trimmed = text.trim();
        self.instruction = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_reference_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_image = Some(path.into());
        self
    }

    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_parses_names_and_menu_numbers() {
        assert_eq!("HIGH".parse::<BudgetTier>().ok(), Some(BudgetTier::High));
        assert_eq!(" 1 ".parse::<BudgetTier>().ok(), Some(BudgetTier::Low));
        assert_eq!("2".parse::<BudgetTier>().ok(), Some(BudgetTier::Moderate));
        assert!("lavish".parse::<BudgetTier>().is_err());
    }

    #[test]
    fn budget_serializes_lowercase() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&BudgetTier::Moderate)?, "\"moderate\"");
        let parsed: BudgetTier = serde_json::from_str("\"low\"")?;
        assert_eq!(parsed, BudgetTier::Low);
        assert_eq!(BudgetTier::High.price_band(), "$7,000+");
        Ok(())
    }

    #[test]
    fn blank_instruction_is_dropped() {
        let request = DesignRequest::new("coastal", BudgetTier::Low).with_instruction("   ");
        assert!(request.instruction().is_none());

        let request = request
            .with_instruction("  add a reading chair ")
            .with_reference_image("photos/den.jpg");
        assert_eq!(request.instruction(), Some("add a reading chair"));
        assert!(request.reference_image.is_some());
    }
}
