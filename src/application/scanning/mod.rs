pub mod evaluator;
pub mod pipeline;
pub mod scheduler;
pub mod universe;

pub use evaluator::{EvaluationSummary, SignalEvaluator, SymbolEvaluation};
pub use pipeline::{AthStage, RunReport, ScanPipeline, ScanPipelineBuilder};
pub use scheduler::{BatchScheduler, TaskOutcome};
pub use universe::{ExclusionFilter, SymbolUniverseProvider};
