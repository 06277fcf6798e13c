//! Room-photo analysis, design rendering and project planning over the
//! hosted Gemini API.

pub mod agents;
pub mod analyzer;
pub mod client;
pub mod config;
pub mod orchestrator;
pub mod prompts;
pub mod rendering;
pub mod synthesis;

#[cfg(test)]
mod fakes;

pub use agents::{AssessmentAgent, CoordinatorAgent, LlmTaskRunner, PlanOutcome, TaskRunner};
pub use analyzer::RoomAnalyzer;
pub use client::{GeminiClient, ModelBackend};
pub use config::Settings;
pub use orchestrator::{discover_photos, Orchestrator, Progress, RunKind, RunOutcome, RunState};
pub use rendering::RenderingGenerator;
pub use synthesis::{ImageSynthesizer, SynthesisOutcome};
