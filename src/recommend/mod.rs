mod engine;
mod models;

pub use engine::{
    RecommendError, RecommendationEngine, RecommendationSettings, ScoringWeights,
};
pub use models::{
    CategorizedRecommendations, CategoryBucket, CategoryId, ReasonCode, RecommendationCandidate,
    RecommendationFilters,
};
