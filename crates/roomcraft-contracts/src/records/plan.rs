use serde::{Deserialize, Serialize};

use super::analysis::AnalysisRecord;
use super::rendering::RenderingResult;
use super::request::BudgetTier;

/// Analysis plus the assessment narrative written from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub raw_analysis: AnalysisRecord,
    pub professional_assessment: String,
    pub image_path: String,
}

impl Assessment {
    pub fn room_type(&self) -> &str {
        &self.raw_analysis.analysis.room_type
    }
}

/// Terminal entity of a run: rendering, plan narrative and request context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPlan {
    pub rendering: RenderingResult,
    pub project_plan: String,
    pub design_style: String,
    pub budget_range: BudgetTier,
    pub room_type: String,
    pub room_summary: String,
    pub version: Option<u32>,
    pub refinement_applied: Option<String>,
    pub original_style: Option<String>,
}

impl ProjectPlan {
    /// Version a refinement of this plan gets; an unversioned plan counts
    /// as version 1.
    pub fn next_version(&self) -> u32 {
        self.version.unwrap_or(1) + 1
    }
}
