use std::path::Path;

use roomcraft_contracts::records::{
    AnalysisOutcome, AnalysisRecord, Assessment, DesignRequest, ProjectPlan, RenderingResult,
};
use roomcraft_contracts::{DesignError, DesignResult};
use tracing::info;

use crate::analyzer::RoomAnalyzer;
use crate::client::{generate_text, text_part, ModelBackend};
use crate::prompts::{assessment_task, custom_brief, design_brief, plan_task};
use crate::rendering::RenderingGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

pub const VISUAL_ASSESSOR: AgentProfile = AgentProfile {
    role: "Visual Assessment Specialist",
    goal: "Analyze room photos to extract detailed information about space, style, and design opportunities",
    backstory: "You are an expert interior designer with 15 years of experience analyzing spaces. \
                You have a keen eye for identifying room characteristics, design challenges, and \
                opportunities. You can assess a room's potential and provide actionable insights \
                for transformation.",
};

pub const PROJECT_COORDINATOR: AgentProfile = AgentProfile {
    role: "Design Project Coordinator",
    goal: "Generate photorealistic renderings and comprehensive project plans including budget and timeline",
    backstory: "You are a seasoned project coordinator with expertise in interior design \
                execution. You translate design visions into actionable plans with realistic \
                budgets and timelines. You work with contractors, understand material costs, and \
                ensure projects stay on track.",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub description: String,
    pub expected_output: String,
}

impl TaskSpec {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Generic "agent performs task" facility. Output is opaque prose.
pub trait TaskRunner {
    fn run_task(&self, agent: &AgentProfile, task: &TaskSpec) -> DesignResult<String>;
}

/// One text-model call per task.
pub struct LlmTaskRunner<'a> {
    backend: &'a dyn ModelBackend,
    model: String,
}

impl<'a> LlmTaskRunner<'a> {
    pub fn new(backend: &'a dyn ModelBackend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }
}

pub fn task_prompt(agent: &AgentProfile, task: &TaskSpec) -> String {
    format!(
        "You are {role}.\n\
         Your goal: {goal}\n\
         Background: {backstory}\n\
         \n\
         TASK:\n\
         {description}\n\
         \n\
         EXPECTED OUTPUT:\n\
         {expected}",
        role = agent.role,
        goal = agent.goal,
        backstory = agent.backstory,
        description = task.description,
        expected = task.expected_output,
    )
}

impl TaskRunner for LlmTaskRunner<'_> {
    fn run_task(&self, agent: &AgentProfile, task: &TaskSpec) -> DesignResult<String> {
        generate_text(
            self.backend,
            &self.model,
            vec![text_part(&task_prompt(agent, task))],
            None,
        )
    }
}

pub struct AssessmentAgent<'a> {
    analyzer: RoomAnalyzer<'a>,
    runner: &'a dyn TaskRunner,
}

impl<'a> AssessmentAgent<'a> {
    pub fn new(analyzer: RoomAnalyzer<'a>, runner: &'a dyn TaskRunner) -> Self {
        Self { analyzer, runner }
    }

    pub fn analyze(&self, image_path: &Path) -> AnalysisOutcome {
        self.analyzer.analyze(image_path)
    }

    /// Wraps a successful analysis in the assessor's narrative.
    pub fn assess(&self, record: AnalysisRecord) -> DesignResult<Assessment> {
        let analysis_json = serde_json::to_string_pretty(&record)?;
        let task = TaskSpec::new(
            assessment_task(&analysis_json),
            "Structured assessment with recommendations",
        );
        let professional_assessment = self.runner.run_task(&VISUAL_ASSESSOR, &task)?;
        info!(room_type = %record.analysis.room_type, "assessment written");
        Ok(Assessment {
            image_path: record.image_path.clone(),
            raw_analysis: record,
            professional_assessment,
        })
    }
}

/// What [`CoordinatorAgent::generate_project_plan`] produced.
#[derive(Debug)]
pub enum PlanOutcome {
    Planned(ProjectPlan),
    RenderingFailed(RenderingResult),
    PlanningFailed {
        rendering: RenderingResult,
        error: DesignError,
    },
}

pub struct CoordinatorAgent<'a> {
    generator: RenderingGenerator<'a>,
    runner: &'a dyn TaskRunner,
}

impl<'a> CoordinatorAgent<'a> {
    pub fn new(generator: RenderingGenerator<'a>, runner: &'a dyn TaskRunner) -> Self {
        Self { generator, runner }
    }

    /// Uses the user's instruction for the brief when there is one, the
    /// preset style brief otherwise.
    pub fn generate_project_plan(
        &self,
        assessment: &Assessment,
        request: &DesignRequest,
    ) -> PlanOutcome {
        let record = &assessment.raw_analysis;
        let brief = match request.instruction() {
            Some(instruction) => custom_brief(record, instruction, request.budget),
            None => design_brief(record, &request.style, request.budget),
        };

        let rendering = self.generator.generate_rendering(record, &brief, request);
        if !rendering.success {
            return PlanOutcome::RenderingFailed(rendering);
        }

        let project_plan = match self.plan_narrative(record, &rendering, request) {
            Ok(text) => text,
            Err(error) => return PlanOutcome::PlanningFailed { rendering, error },
        };
        PlanOutcome::Planned(ProjectPlan {
            rendering,
            project_plan,
            design_style: request.style.clone(),
            budget_range: request.budget,
            room_type: record.analysis.room_type.clone(),
            room_summary: record.summary(),
            version: None,
            refinement_applied: None,
            original_style: None,
        })
    }

    fn plan_narrative(
        &self,
        record: &AnalysisRecord,
        rendering: &RenderingResult,
        request: &DesignRequest,
    ) -> DesignResult<String> {
        let rendering_json = serde_json::to_string_pretty(rendering)?;
        let task = TaskSpec::new(
            plan_task(
                &rendering_json,
                &record.analysis.dimensions_estimate,
                &record.analysis.room_type,
                request.budget,
            ),
            "Structured project plan with budget and timeline",
        );
        self.runner.run_task(&PROJECT_COORDINATOR, &task)
    }

    /// New plan with a refined rendering; the caller checks
    /// `rendering.success`.
    pub fn refine_design(&self, plan: &ProjectPlan, request: &str) -> ProjectPlan {
        let rendering = self.generator.refine_rendering(&plan.rendering, request);
        ProjectPlan {
            rendering,
            project_plan: plan.project_plan.clone(),
            design_style: plan.design_style.clone(),
            budget_range: plan.budget_range,
            room_type: plan.room_type.clone(),
            room_summary: plan.room_summary.clone(),
            version: Some(plan.next_version()),
            refinement_applied: Some(request.to_string()),
            original_style: Some(plan.design_style.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use roomcraft_contracts::records::{BudgetTier, DesignRequest};
    use roomcraft_contracts::DesignError;
    use serde_json::json;

    use super::{
        task_prompt, AssessmentAgent, CoordinatorAgent, LlmTaskRunner, PlanOutcome, TaskRunner,
        TaskSpec, PROJECT_COORDINATOR, VISUAL_ASSESSOR,
    };
    use crate::analyzer::RoomAnalyzer;
    use crate::fakes::{analysis_json, write_test_png, ScriptedBackend, ScriptedRunner};
    use crate::rendering::RenderingGenerator;

    #[test]
    fn llm_runner_frames_role_and_task() -> anyhow::Result<()> {
        let backend = ScriptedBackend::new();
        backend.push_text("Looks promising.");
        let runner = LlmTaskRunner::new(&backend, "gemini-2.0-flash-exp");
        let task = TaskSpec::new("Assess it", "An assessment");

        assert_eq!(runner.run_task(&VISUAL_ASSESSOR, &task)?, "Looks promising.");
        let sent = backend.calls()[0].payload["contents"][0]["parts"][0]["text"].clone();
        assert_eq!(sent, json!(task_prompt(&VISUAL_ASSESSOR, &task)));
        let text = sent.as_str().unwrap_or_default();
        assert!(text.starts_with("You are Visual Assessment Specialist."));
        assert!(text.contains("EXPECTED OUTPUT:\nAn assessment"));
        Ok(())
    }

    #[test]
    fn assessment_wraps_analysis_with_narrative() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let photo = temp.path().join("office.png");
        write_test_png(&photo, 4, 4)?;
        let backend = ScriptedBackend::new();
        backend.push_text(&analysis_json().to_string());
        let runner = ScriptedRunner::new();
        runner.push("Great light, tight footprint.");

        let agent = AssessmentAgent::new(RoomAnalyzer::new(&backend, "vision"), &runner);
        let record = agent.analyze(&photo).into_result()?;
        let assessment = agent.assess(record)?;

        assert_eq!(assessment.room_type(), "office");
        assert_eq!(assessment.professional_assessment, "Great light, tight footprint.");
        assert_eq!(assessment.image_path, photo.display().to_string());
        let tasks = runner.tasks();
        assert_eq!(tasks[0].0, VISUAL_ASSESSOR.role);
        assert!(tasks[0].1.contains("\"room_type\": \"office\""));
        Ok(())
    }

    fn assessment() -> anyhow::Result<roomcraft_contracts::records::Assessment> {
        let mut raw = analysis_json();
        if let Some(obj) = raw.as_object_mut() {
            obj.insert("image_path".to_string(), "office.png".into());
            obj.insert("model_used".to_string(), "m".into());
        }
        Ok(roomcraft_contracts::records::Assessment {
            raw_analysis: serde_json::from_value(raw)?,
            professional_assessment: "ok".to_string(),
            image_path: "office.png".to_string(),
        })
    }

    #[test]
    fn plan_uses_custom_brief_and_budget() -> anyhow::Result<()> {
        let backend = ScriptedBackend::new();
        backend.push_text("Walnut desk and linen drapes.");
        let runner = ScriptedRunner::new();
        runner.push("Budget: $4,800 over 3 weeks");
        let coordinator = CoordinatorAgent::new(
            RenderingGenerator::new(&backend, "text", "vision", None),
            &runner,
        );
        let request = DesignRequest::new("modern", BudgetTier::High).with_instruction("modern study nook");

        let PlanOutcome::Planned(plan) = coordinator.generate_project_plan(&assessment()?, &request)
        else {
            anyhow::bail!("expected a plan");
        };
        assert_eq!(plan.project_plan, "Budget: $4,800 over 3 weeks");
        assert_eq!(plan.budget_range, BudgetTier::High);
        assert_eq!(plan.room_type, "office");
        assert!(plan.room_summary.contains("Room Type: office"));
        assert!(!plan.rendering.image_gen_available);

        let rendering_prompt = backend.calls()[0].payload["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        assert!(rendering_prompt.contains("USER'S VISION: modern study nook"));
        let tasks = runner.tasks();
        assert_eq!(tasks[0].0, PROJECT_COORDINATOR.role);
        assert!(tasks[0].1.contains("with high budget ($7,000+)"));
        Ok(())
    }

    #[test]
    fn failures_surface_as_plan_outcomes() -> anyhow::Result<()> {
        let backend = ScriptedBackend::new();
        backend.push_error(DesignError::service("gemini", "HTTP 500"));
        backend.push_text("described");
        let runner = ScriptedRunner::new();
        runner.push_error(DesignError::service("gemini", "quota exceeded"));
        let coordinator = CoordinatorAgent::new(
            RenderingGenerator::new(&backend, "text", "vision", None),
            &runner,
        );
        let request = DesignRequest::new("coastal", BudgetTier::Low);

        assert!(matches!(
            coordinator.generate_project_plan(&assessment()?, &request),
            PlanOutcome::RenderingFailed(rendering) if !rendering.success
        ));
        assert!(matches!(
            coordinator.generate_project_plan(&assessment()?, &request),
            PlanOutcome::PlanningFailed { rendering, .. } if rendering.success
        ));
        Ok(())
    }

    #[test]
    fn refine_design_versions_the_plan() -> anyhow::Result<()> {
        let backend = ScriptedBackend::new();
        backend.push_text("first");
        backend.push_text("refined");
        let runner = ScriptedRunner::new();
        runner.push("plan");
        let coordinator = CoordinatorAgent::new(
            RenderingGenerator::new(&backend, "text", "vision", None),
            &runner,
        );
        let request = DesignRequest::new("coastal", BudgetTier::Low);
        let PlanOutcome::Planned(plan) = coordinator.generate_project_plan(&assessment()?, &request)
        else {
            anyhow::bail!("expected a plan");
        };
        assert_eq!(plan.version, None);

        let refined = coordinator.refine_design(&plan, "warmer colours");
        assert_eq!(refined.version, Some(2));
        assert_eq!(refined.original_style.as_deref(), Some("coastal"));
        assert_eq!(refined.refinement_applied.as_deref(), Some("warmer colours"));
        assert_eq!(refined.rendering.description(), Some("refined"));

        let twice = coordinator.refine_design(&refined, "more plants");
        assert_eq!(twice.version, Some(3));
        Ok(())
    }
}
