//! Ambiguity resolution over a tariff branch: discover the decision
//! variables that separate its leaves, match them against a product
//! description, and rate what is left to ask.

pub mod builder;
pub mod catalogue;
pub mod category;
pub mod confidence;
pub mod config;
pub mod differentiator;
pub mod duty;
mod engine;
mod error;
pub mod matcher;
pub mod scorer;
mod text;
pub mod threshold;

#[cfg(test)]
mod scenarios;

pub use category::{Category, categorize};
pub use config::{ConfidencePolicy, DutyPolicy, EngineConfig};
pub use differentiator::DifferentiatingPhrase;
pub use engine::AmbiguityEngine;
pub use error::EngineError;
pub use matcher::{DefaultStrategy, HighestDuty, MostCommon, strategy_by_name};
