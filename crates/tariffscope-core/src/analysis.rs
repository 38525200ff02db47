//! Result types produced by one ambiguity analysis.
//!
//! Everything here is constructed fresh per call and never mutated after it
//! is returned. Collections are ordered (`Vec`, `BTreeMap`) so that two calls
//! with identical input serialise to identical bytes.

use serde::{Deserialize, Serialize};

use crate::LeafEntry;

/// Value token used by the synthetic residual option.
pub const RESIDUAL_VALUE: &str = "other";
/// Display label of the synthetic residual option.
pub const RESIDUAL_LABEL: &str = "Other/Standard";

/// How a decision variable is asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    SingleChoice,
    NumericBracket,
}

/// Provenance of a detected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedSource {
    /// Given explicitly by the user: a previous answer, an explicit hint, or
    /// verbatim wording in the free text.
    Stated,
    /// Recovered from the free text through the synonym table.
    Inferred,
    /// Defaulted by the system without evidence.
    Assumed,
    /// Nothing detected.
    None,
}

impl DetectedSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stated => "stated",
            Self::Inferred => "inferred",
            Self::Assumed => "assumed",
            Self::None => "none",
        }
    }
}

/// Four-level ambiguity rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityLevel {
    None,
    Low,
    Medium,
    High,
}

impl AmbiguityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One answer to a decision variable and the leaves it is compatible with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableOption {
    pub value: String,
    pub label: String,
    /// Never empty; ordered by position in the analysed leaf set.
    pub compatible_codes: Vec<String>,
    /// Raw legal phrasings merged into this option.
    pub aliases: Vec<String>,
    /// True for the synthetic Other/Standard option.
    pub is_residual: bool,
}

impl VariableOption {
    pub fn is_compatible(&self, code: &str) -> bool {
        self.compatible_codes.iter().any(|c| c == code)
    }
}

/// A discovered product attribute with enumerated options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionVariable {
    pub id: String,
    pub name: String,
    pub kind: VariableKind,
    pub question: String,
    pub options: Vec<VariableOption>,
    pub detected_value: Option<String>,
    pub detected_source: DetectedSource,
    /// 0–100.
    pub confidence: u8,
}

impl DecisionVariable {
    pub fn option(&self, value: &str) -> Option<&VariableOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Options whose compatible set contains `code`.
    pub fn options_for<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a VariableOption> {
        self.options.iter().filter(move |o| o.is_compatible(code))
    }

    pub fn is_resolved(&self) -> bool {
        self.detected_source == DetectedSource::Stated
    }
}

/// What one decision variable demands of one leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub variable_id: String,
    pub required_value: String,
    pub met: bool,
    pub source: DetectedSource,
}

/// A leaf entry scored against the detected values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub leaf: LeafEntry,
    pub requirements: Vec<Requirement>,
    pub is_likely: bool,
    pub is_confirmed: bool,
}

impl CandidateResult {
    pub fn code(&self) -> &str {
        &self.leaf.code
    }
}

/// Effective duty bounds across the remaining candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DutyRange {
    pub min: f64,
    pub max: f64,
    pub min_code: String,
    pub max_code: String,
}

/// An assumption the engine made in place of missing input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    pub variable_id: String,
    pub variable_name: String,
    pub assumed_value: String,
    pub rationale: String,
}

/// The externally visible result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguityAnalysis {
    pub branch_prefix: String,
    pub is_ambiguous: bool,
    pub ambiguity_level: AmbiguityLevel,
    pub possible_codes: Vec<CandidateResult>,
    pub decision_variables: Vec<DecisionVariable>,
    /// Ids of the variables in `decision_variables` still shown to the user.
    pub questions_to_ask: Vec<String>,
    pub likely_code: Option<String>,
    pub duty_range: DutyRange,
    pub assumptions: Vec<Assumption>,
    /// 0–100.
    pub confidence: u8,
}

impl AmbiguityAnalysis {
    pub fn variable(&self, id: &str) -> Option<&DecisionVariable> {
        self.decision_variables.iter().find(|v| v.id == id)
    }

    pub fn candidate(&self, code: &str) -> Option<&CandidateResult> {
        self.possible_codes.iter().find(|c| c.code() == code)
    }

    /// The variables behind `questions_to_ask`, in order.
    pub fn questions(&self) -> impl Iterator<Item = &DecisionVariable> {
        self.questions_to_ask
            .iter()
            .filter_map(|id| self.variable(id))
    }

    pub fn confirmed_count(&self) -> usize {
        self.possible_codes.iter().filter(|c| c.is_confirmed).count()
    }
}
