pub mod analysis;
pub mod code;
pub mod leaf;
pub mod profile;
pub mod schema;

pub use analysis::{
    AmbiguityAnalysis, AmbiguityLevel, Assumption, CandidateResult, DecisionVariable,
    DetectedSource, DutyRange, RESIDUAL_LABEL, RESIDUAL_VALUE, Requirement, VariableKind,
    VariableOption,
};
pub use code::{LEAF_CODE_LEN, canonical_code, format_code, is_leaf_under};
pub use leaf::{AnalysisRequest, LeafEntry};
pub use profile::{ProductProfile, ProfileError};
pub use schema::schedule;
