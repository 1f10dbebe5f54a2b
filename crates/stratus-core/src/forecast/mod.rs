//! Forecast model and aggregation

pub mod aggregator;
pub mod condition;
pub mod model;

pub use aggregator::ForecastAggregator;
pub use condition::ConditionCategory;
pub use model::*;
