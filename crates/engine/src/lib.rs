pub mod builder;
mod engine;
pub mod error;
pub mod filter;
pub mod jitter;
pub mod organic;
pub mod portion;
pub mod scheduler;
pub mod scoring;

pub use builder::{
    BuilderSettings, DiversityMode, GeneratedRecipe, Generation, GenerationConstraints,
    InsufficientCandidates, requirements_met,
};
pub use engine::{
    Engine, EngineSettings, GenerateRequest, RecipesResponse, ScoredRecipe, Stats,
};
pub use error::{PassError, ScoringError};
pub use filter::{CandidateSet, ExclusionReason, filter};
pub use portion::QualityTier;
pub use scheduler::{ChunkedScorer, PassTicket, Progress, Ranking, ScoringSession};
pub use scoring::{
    Compatibility, CompatibilityScorer, Factor, Grade, ScorableRecipe, ScoredItem, ScoringWeights,
};
