pub mod providers;
pub mod recommendations;
pub mod sampling;

pub use recommendations::{RecommendationPlan, RecommendationService};
pub use sampling::SamplingEngine;
