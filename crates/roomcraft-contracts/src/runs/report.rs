use std::path::Path;

use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::error::{DesignError, DesignResult};
use crate::records::{AnalysisRecord, Assessment, BudgetTier, ProjectPlan, RenderingResult};

pub const STEP_VISUAL_ASSESSMENT: &str = "visual_assessment";
pub const STEP_PROJECT_COORDINATION: &str = "project_coordination";
pub const STEP_CUSTOM_TRANSFORMATION: &str = "custom_design_transformation";
pub const STEP_REFINEMENT: &str = "design_refinement";
pub const STEP_RENDERING: &str = "rendering_generation";

pub const AGENT_ASSESSOR: &str = "VisualAssessor";
pub const AGENT_COORDINATOR: &str = "ProjectCoordinator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Untagged; variants are tried in order, so a plan never reads back as a
/// bare rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepOutput {
    Assessment(Assessment),
    Plan(ProjectPlan),
    /// A rendering that never became a plan, kept for failed runs.
    Rendering(RenderingResult),
    /// An analysis whose assessment narrative failed.
    Analysis(AnalysisRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub step: String,
    pub agent: String,
    pub custom_prompt: Option<String>,
    pub output: StepOutput,
}

/// Persisted record of one run; partial reports are written on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub timestamp: String,
    pub input_image: String,
    pub design_prompt: Option<String>,
    pub target_style: String,
    pub budget_range: BudgetTier,
    #[serde(default)]
    pub workflow_steps: Vec<WorkflowStep>,
    pub status: Option<RunStatus>,
    pub final_state: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl RunReport {
    pub fn new(
        run_id: impl Into<String>,
        input_image: impl Into<String>,
        design_prompt: Option<String>,
        target_style: impl Into<String>,
        budget_range: BudgetTier,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            input_image: input_image.into(),
            design_prompt,
            target_style: target_style.into(),
            budget_range,
            workflow_steps: Vec::new(),
            status: None,
            final_state: None,
            error: None,
            error_kind: None,
            raw_response: None,
        }
    }

    pub fn push_step(
        &mut self,
        step: &str,
        agent: &str,
        custom_prompt: Option<String>,
        output: StepOutput,
    ) {
        self.workflow_steps.push(WorkflowStep {
            step: step.to_string(),
            agent: agent.to_string(),
            custom_prompt,
            output,
        });
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        self.workflow_steps.iter().find_map(|step| match &step.output {
            StepOutput::Assessment(assessment) => Some(assessment),
            _ => None,
        })
    }

    /// The room analysis, whether or not its narrative was written.
    pub fn analysis(&self) -> Option<&AnalysisRecord> {
        if let Some(assessment) = self.assessment() {
            return Some(&assessment.raw_analysis);
        }
        self.workflow_steps.iter().find_map(|step| match &step.output {
            StepOutput::Analysis(record) => Some(record),
            _ => None,
        })
    }

    /// Most recent plan, refinements included.
    pub fn latest_plan(&self) -> Option<&ProjectPlan> {
        self.workflow_steps
            .iter()
            .rev()
            .find_map(|step| match &step.output {
                StepOutput::Plan(plan) => Some(plan),
                _ => None,
            })
    }

    pub fn mark_success(&mut self, final_state: &str) {
        self.status = Some(RunStatus::Success);
        self.final_state = Some(final_state.to_string());
        self.error = None;
        self.error_kind = None;
    }

    pub fn mark_error(&mut self, final_state: &str, error: &str, kind: &str) {
        self.status = Some(RunStatus::Error);
        self.final_state = Some(final_state.to_string());
        self.error = Some(error.to_string());
        self.error_kind = Some(kind.to_string());
    }
}

pub fn write_report(path: &Path, report: &RunReport) -> DesignResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

pub fn load_report(path: &Path) -> DesignResult<RunReport> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(DesignError::from)
}
