mod analysis;
mod plan;
mod rendering;
mod request;

pub use analysis::{AnalysisOutcome, AnalysisRecord, RoomAnalysis, ANALYSIS_FIELDS};
pub use plan::{Assessment, ProjectPlan};
pub use rendering::RenderingResult;
pub use request::{BudgetTier, DesignRequest};
