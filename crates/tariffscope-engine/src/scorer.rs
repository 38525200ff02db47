//! Candidate scoring and the ambiguity rating.

use tariffscope_core::{
    AmbiguityLevel, CandidateResult, DecisionVariable, DetectedSource, LeafEntry, Requirement,
    VariableKind,
};

use crate::config::ConfidencePolicy;

/// Score every leaf against the detected values.
///
/// Each variable contributes one requirement per leaf: met when the detected
/// value is one of the options compatible with the leaf. A leaf is likely
/// when every requirement is met, and confirmed when additionally every
/// requirement rests on stated input.
pub fn score_candidates(leaves: &[LeafEntry], variables: &[DecisionVariable]) -> Vec<CandidateResult> {
    leaves
        .iter()
        .map(|leaf| {
            let requirements: Vec<Requirement> = variables
                .iter()
                .filter_map(|v| requirement(leaf, v))
                .collect();
            let is_likely = requirements.iter().all(|r| r.met);
            let is_confirmed = is_likely
                && !requirements.is_empty()
                && requirements.iter().all(|r| r.source == DetectedSource::Stated);
            CandidateResult {
                leaf: leaf.clone(),
                requirements,
                is_likely,
                is_confirmed,
            }
        })
        .collect()
}

fn requirement(leaf: &LeafEntry, variable: &DecisionVariable) -> Option<Requirement> {
    let mut compatible = variable.options_for(&leaf.code).peekable();
    let first = compatible.peek().map(|o| o.value.clone())?;
    let detected = variable.detected_value.as_deref();
    let matched = detected.and_then(|d| compatible.find(|o| o.value == d));

    Some(match matched {
        Some(option) => Requirement {
            variable_id: variable.id.clone(),
            required_value: option.value.clone(),
            met: true,
            source: variable.detected_source,
        },
        None => Requirement {
            variable_id: variable.id.clone(),
            required_value: first,
            met: false,
            source: variable.detected_source,
        },
    })
}

/// Ids of the variables still worth showing: choices with at least two
/// options, and bracket questions without a detected value.
///
/// Defaulted variables stay on the list; only stated input removes them.
pub fn questions_to_ask(variables: &[DecisionVariable]) -> Vec<String> {
    variables
        .iter()
        .filter(|v| match v.kind {
            VariableKind::SingleChoice => v.options.len() >= 2,
            VariableKind::NumericBracket => {
                v.options.len() >= 2 || v.detected_value.is_none()
            }
        })
        .map(|v| v.id.clone())
        .collect()
}

/// Rate the remaining ambiguity.
pub fn ambiguity_level(
    leaf_count: usize,
    candidates: &[CandidateResult],
    variables: &[DecisionVariable],
    questions: &[String],
    policy: &ConfidencePolicy,
) -> AmbiguityLevel {
    if leaf_count <= 1 {
        return AmbiguityLevel::None;
    }
    let asked: Vec<&DecisionVariable> = variables
        .iter()
        .filter(|v| questions.contains(&v.id))
        .collect();
    let unresolved = asked.iter().filter(|v| !v.is_resolved()).count();
    if unresolved == 0 {
        return AmbiguityLevel::None;
    }

    let confirmed = candidates.iter().filter(|c| c.is_confirmed).count();
    if confirmed == 1 {
        return AmbiguityLevel::None;
    }

    let likely = candidates.iter().filter(|c| c.is_likely).count();
    if likely == 1 && asked.iter().all(|v| v.confidence >= policy.low_level_floor) {
        return AmbiguityLevel::Low;
    }
    if unresolved == 1 {
        return AmbiguityLevel::Medium;
    }
    AmbiguityLevel::High
}

/// First likely candidate, else the first candidate.
pub fn likely_code(candidates: &[CandidateResult]) -> Option<String> {
    candidates
        .iter()
        .find(|c| c.is_likely)
        .or_else(|| candidates.first())
        .map(|c| c.code().to_string())
}
