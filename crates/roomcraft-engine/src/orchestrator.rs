use std::fmt;
use std::path::{Path, PathBuf};

use roomcraft_contracts::events::{payload, RunLog};
use roomcraft_contracts::records::{
    AnalysisRecord, Assessment, DesignRequest, ProjectPlan, RenderingResult,
};
use roomcraft_contracts::runs::naming::{new_run_id, OutputNaming};
use roomcraft_contracts::runs::report::{
    write_report, RunReport, StepOutput, AGENT_ASSESSOR, AGENT_COORDINATOR,
    STEP_CUSTOM_TRANSFORMATION, STEP_PROJECT_COORDINATION, STEP_REFINEMENT, STEP_RENDERING,
    STEP_VISUAL_ASSESSMENT,
};
use roomcraft_contracts::{DesignError, DesignResult};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::agents::{AssessmentAgent, CoordinatorAgent, PlanOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Analyzing,
    Generating,
    Refining,
    Persisted,
    Failed,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Generating => "generating",
            Self::Refining => "refining",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        }
    }

    /// Forward-only transitions. `Failed` and `Persisted` are terminal.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Analyzing)
                | (Idle, Refining)
                | (Analyzing, Generating)
                | (Analyzing, Failed)
                | (Generating, Refining)
                | (Generating, Persisted)
                | (Generating, Failed)
                | (Refining, Persisted)
                | (Refining, Failed)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing progress sink. The engine never prints.
pub trait Progress {
    fn stage(&self, state: RunState);

    fn message(&self, text: &str);
}

pub struct SilentProgress;

impl Progress for SilentProgress {
    fn stage(&self, _state: RunState) {}

    fn message(&self, _text: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    OneShot,
    Interactive,
}

impl RunKind {
    pub fn report_prefix(self) -> &'static str {
        match self {
            Self::OneShot => "poc_results",
            Self::Interactive => "interactive_results",
        }
    }

    fn plan_step(self) -> &'static str {
        match self {
            Self::OneShot => STEP_PROJECT_COORDINATION,
            Self::Interactive => STEP_CUSTOM_TRANSFORMATION,
        }
    }
}

pub const REFINED_PREFIX: &str = "refined_results";

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: RunState,
    pub report: RunReport,
    pub report_path: PathBuf,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Persisted
    }

    pub fn analysis(&self) -> Option<&AnalysisRecord> {
        self.report.analysis()
    }

    pub fn plan(&self) -> Option<&ProjectPlan> {
        self.report.latest_plan()
    }
}

struct Tracker<'p> {
    state: RunState,
    log: RunLog,
    progress: &'p dyn Progress,
}

impl Tracker<'_> {
    fn enter(&mut self, next: RunState) {
        if !self.state.can_advance_to(next) {
            warn!(from = %self.state, to = %next, "unexpected run state transition");
        }
        self.state = next;
        self.progress.stage(next);
        self.emit("stage_entered", json!({ "state": next.as_str() }));
    }

    fn emit(&self, event: &str, value: Value) {
        if let Err(err) = self.log.record(event, payload(value)) {
            warn!(event, "run log write failed: {err:#}");
        }
    }
}

/// Sequences analyze → generate → (refine) → persist for one run.
pub struct Orchestrator<'a> {
    assessor: AssessmentAgent<'a>,
    coordinator: CoordinatorAgent<'a>,
    output_dir: PathBuf,
    naming: OutputNaming,
    events_path: Option<PathBuf>,
    progress: &'a dyn Progress,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        assessor: AssessmentAgent<'a>,
        coordinator: CoordinatorAgent<'a>,
        output_dir: impl Into<PathBuf>,
        naming: OutputNaming,
        progress: &'a dyn Progress,
    ) -> Self {
        Self {
            assessor,
            coordinator,
            output_dir: output_dir.into(),
            naming,
            events_path: None,
            progress,
        }
    }

    pub fn with_events_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.events_path = Some(path.into());
        self
    }

    fn tracker(&self) -> Tracker<'a> {
        let run_id = new_run_id();
        let log = match &self.events_path {
            Some(path) => RunLog::new(path, run_id),
            None => RunLog::disabled(run_id),
        };
        Tracker {
            state: RunState::Idle,
            log,
            progress: self.progress,
        }
    }

    pub fn analyze_only(&self, image_path: &Path) -> DesignResult<Assessment> {
        let record = self.assessor.analyze(image_path).into_result()?;
        self.assessor.assess(record)
    }

    /// Runs every stage once. `Err` only when the report cannot be written;
    /// stage failures come back as a `Failed` outcome with the partial
    /// report already on disk.
    pub fn run(
        &self,
        image_path: &Path,
        request: &DesignRequest,
        kind: RunKind,
    ) -> DesignResult<RunOutcome> {
        let mut tracker = self.tracker();
        let mut report = RunReport::new(
            tracker.log.run_id(),
            image_path.display().to_string(),
            request.instruction().map(str::to_string),
            request.style.clone(),
            request.budget,
        );
        info!(run_id = %report.run_id, image = %report.input_image, "run started");
        tracker.emit(
            "run_started",
            json!({
                "input_image": report.input_image,
                "target_style": report.target_style,
                "budget_range": request.budget.as_str(),
                "reference_image": request.reference_image.as_ref().map(|path| path.display().to_string()),
            }),
        );

        tracker.enter(RunState::Analyzing);
        self.progress.message(&format!("Analyzing {}", image_path.display()));
        let record = match self.assessor.analyze(image_path).into_result() {
            Ok(record) => record,
            Err(err) => {
                if let DesignError::MalformedResponse { raw_response, .. } = &err {
                    report.raw_response = raw_response.clone();
                }
                return self.fail(tracker, report, kind.report_prefix(), Failure::from(&err));
            }
        };
        tracker.emit(
            "analysis_completed",
            json!({
                "room_type": record.analysis.room_type,
                "model_used": record.model_used,
            }),
        );
        let assessment = match self.assessor.assess(record.clone()) {
            Ok(assessment) => assessment,
            Err(err) => {
                report.push_step(
                    STEP_VISUAL_ASSESSMENT,
                    AGENT_ASSESSOR,
                    None,
                    StepOutput::Analysis(record),
                );
                return self.fail(tracker, report, kind.report_prefix(), Failure::from(&err));
            }
        };
        report.push_step(
            STEP_VISUAL_ASSESSMENT,
            AGENT_ASSESSOR,
            None,
            StepOutput::Assessment(assessment.clone()),
        );

        tracker.enter(RunState::Generating);
        self.progress.message(&format!("Designing a {} {}", request.style, assessment.room_type()));
        let custom_prompt = request.instruction().map(str::to_string);
        match self.coordinator.generate_project_plan(&assessment, request) {
            PlanOutcome::Planned(plan) => {
                note_rendering(&tracker, &plan.rendering);
                tracker.emit(
                    "plan_completed",
                    json!({ "design_style": plan.design_style, "room_type": plan.room_type }),
                );
                report.push_step(
                    kind.plan_step(),
                    AGENT_COORDINATOR,
                    custom_prompt,
                    StepOutput::Plan(plan),
                );
            }
            PlanOutcome::RenderingFailed(rendering) => {
                note_rendering(&tracker, &rendering);
                let failure = Failure::from(&rendering);
                report.push_step(
                    STEP_RENDERING,
                    AGENT_COORDINATOR,
                    custom_prompt,
                    StepOutput::Rendering(rendering),
                );
                return self.fail(tracker, report, kind.report_prefix(), failure);
            }
            PlanOutcome::PlanningFailed { rendering, error } => {
                note_rendering(&tracker, &rendering);
                report.push_step(
                    STEP_RENDERING,
                    AGENT_COORDINATOR,
                    custom_prompt,
                    StepOutput::Rendering(rendering),
                );
                return self.fail(tracker, report, kind.report_prefix(), Failure::from(&error));
            }
        }

        self.persist(tracker, report, kind.report_prefix())
    }

    /// Refines the newest plan in `report` and writes a new
    /// `refined_results` report; the input report is left untouched.
    pub fn refine(&self, mut report: RunReport, request: &str) -> DesignResult<RunOutcome> {
        let Some(plan) = report.latest_plan().cloned() else {
            return Err(DesignError::configuration(
                "report has no project plan to refine",
            ));
        };
        let mut tracker = self.tracker();
        report.run_id = tracker.log.run_id().to_string();

        tracker.enter(RunState::Refining);
        self.progress.message(&format!("Refining: {request}"));
        let refined = self.coordinator.refine_design(&plan, request);
        let success = refined.rendering.success;
        let failure = (!success).then(|| Failure::from(&refined.rendering));
        tracker.emit(
            "refinement_completed",
            json!({ "success": success, "version": refined.version }),
        );
        report.push_step(
            STEP_REFINEMENT,
            AGENT_COORDINATOR,
            Some(request.to_string()),
            StepOutput::Plan(refined),
        );
        if let Some(failure) = failure {
            return self.fail(tracker, report, REFINED_PREFIX, failure);
        }
        self.persist(tracker, report, REFINED_PREFIX)
    }

    fn fail(
        &self,
        mut tracker: Tracker<'_>,
        mut report: RunReport,
        prefix: &str,
        failure: Failure,
    ) -> DesignResult<RunOutcome> {
        let failed_in = tracker.state;
        error!(state = %failed_in, kind = %failure.kind, "run failed: {}", failure.message);
        self.progress
            .message(&format!("Failed while {failed_in}: {}", failure.message));
        tracker.enter(RunState::Failed);
        tracker.emit(
            "run_failed",
            json!({
                "state": failed_in.as_str(),
                "error": failure.message,
                "error_kind": failure.kind,
            }),
        );
        report.mark_error(RunState::Failed.as_str(), &failure.message, &failure.kind);
        let report_path = self.write(&tracker, &report, prefix)?;
        Ok(RunOutcome {
            state: RunState::Failed,
            report,
            report_path,
        })
    }

    fn persist(
        &self,
        mut tracker: Tracker<'_>,
        mut report: RunReport,
        prefix: &str,
    ) -> DesignResult<RunOutcome> {
        tracker.enter(RunState::Persisted);
        report.mark_success(RunState::Persisted.as_str());
        let report_path = self.write(&tracker, &report, prefix)?;
        Ok(RunOutcome {
            state: RunState::Persisted,
            report,
            report_path,
        })
    }

    fn write(&self, tracker: &Tracker<'_>, report: &RunReport, prefix: &str) -> DesignResult<PathBuf> {
        let path = self.naming.path_in(&self.output_dir, prefix, "json");
        write_report(&path, report)?;
        info!(path = %path.display(), "report written");
        self.progress.message(&format!("Results saved to {}", path.display()));
        tracker.emit(
            "run_persisted",
            json!({
                "path": path.display().to_string(),
                "status": if report.error.is_some() { "error" } else { "success" },
            }),
        );
        Ok(path)
    }
}

fn note_rendering(tracker: &Tracker<'_>, rendering: &RenderingResult) {
    tracker.emit(
        "rendering_completed",
        json!({
            "success": rendering.success,
            "image_path": rendering.image_path,
            "image_backend": rendering.image_backend,
            "image_width": rendering.image_width,
            "image_height": rendering.image_height,
        }),
    );
    if rendering.success && rendering.image_path.is_none() {
        tracker.emit("synthesis_degraded", json!({ "note": rendering.note }));
    }
}

/// Error text and kind tag as they land in the report.
struct Failure {
    message: String,
    kind: String,
}

impl From<&DesignError> for Failure {
    fn from(err: &DesignError) -> Self {
        Self {
            message: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

impl From<&RenderingResult> for Failure {
    fn from(rendering: &RenderingResult) -> Self {
        Self {
            message: rendering
                .error
                .clone()
                .unwrap_or_else(|| "rendering failed".to_string()),
            kind: rendering
                .error_kind
                .clone()
                .unwrap_or_else(|| "service_error".to_string()),
        }
    }
}

const PHOTO_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Room photos in `dir`, sorted by file name, at most `limit` of them.
pub fn discover_photos(dir: &Path, limit: usize) -> DesignResult<Vec<PathBuf>> {
    let mut photos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_photo = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| PHOTO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_photo && path.is_file() {
            photos.push(path);
        }
    }
    photos.sort();
    photos.truncate(limit);
    Ok(photos)
}
