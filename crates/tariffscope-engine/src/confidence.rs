//! Aggregate confidence of the likely code.

use tariffscope_core::{CandidateResult, DecisionVariable, DetectedSource};

use crate::config::ConfidencePolicy;

/// Confidence in `likely_code`, 0–100.
///
/// A confirmed candidate scores the confirmed level outright. Otherwise the
/// mean confidence of the variables satisfied by the likely candidate is
/// taken, one penalty is subtracted per assumed variable among them, and the
/// result is clamped to the policy bounds. Assumptions the candidate does not
/// rely on leave its score alone.
pub fn aggregate(
    candidates: &[CandidateResult],
    likely_code: Option<&str>,
    variables: &[DecisionVariable],
    policy: &ConfidencePolicy,
) -> u8 {
    let Some(candidate) = likely_code.and_then(|code| candidates.iter().find(|c| c.code() == code))
    else {
        return policy.neutral;
    };
    if candidate.is_confirmed {
        return policy.confirmed;
    }

    let contributing: Vec<&DecisionVariable> = candidate
        .requirements
        .iter()
        .filter(|r| r.met)
        .filter_map(|r| variables.iter().find(|v| v.id == r.variable_id))
        .collect();
    if contributing.is_empty() {
        return policy.neutral;
    }

    let mean = contributing
        .iter()
        .map(|v| f64::from(v.confidence))
        .sum::<f64>()
        / contributing.len() as f64;
    let assumed = contributing
        .iter()
        .filter(|v| v.detected_source == DetectedSource::Assumed)
        .count();
    let score = mean - f64::from(policy.assumption_penalty) * assumed as f64;
    score
        .clamp(f64::from(policy.floor), f64::from(policy.ceiling))
        .round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariffscope_core::{LeafEntry, Requirement, VariableKind};

    fn variable(id: &str, source: DetectedSource, confidence: u8) -> DecisionVariable {
        DecisionVariable {
            id: id.into(),
            name: id.into(),
            kind: VariableKind::SingleChoice,
            question: String::new(),
            options: vec![],
            detected_value: Some("x".into()),
            detected_source: source,
            confidence,
        }
    }

    fn candidate(met: &[(&str, DetectedSource)], is_confirmed: bool) -> CandidateResult {
        CandidateResult {
            leaf: LeafEntry::new("1", "x", ""),
            requirements: met
                .iter()
                .map(|(id, source)| Requirement {
                    variable_id: id.to_string(),
                    required_value: "x".into(),
                    met: true,
                    source: *source,
                })
                .collect(),
            is_likely: true,
            is_confirmed,
        }
    }

    #[test]
    fn confirmed_scores_top() {
        let c = candidate(&[("blade", DetectedSource::Stated)], true);
        let vars = vec![variable("blade", DetectedSource::Stated, 90)];
        assert_eq!(aggregate(&[c], Some("1"), &vars, &ConfidencePolicy::default()), 98);
    }

    #[test]
    fn mean_minus_assumption_penalty() {
        let c = candidate(
            &[
                ("handle", DetectedSource::Stated),
                ("blade", DetectedSource::Assumed),
                ("plating", DetectedSource::Assumed),
            ],
            false,
        );
        let vars = vec![
            variable("handle", DetectedSource::Stated, 90),
            variable("blade", DetectedSource::Assumed, 40),
            variable("plating", DetectedSource::Assumed, 40),
        ];
        // (90 + 40 + 40) / 3 - 2 * 10 = 36.67
        assert_eq!(aggregate(&[c], Some("1"), &vars, &ConfidencePolicy::default()), 37);
    }

    #[test]
    fn clamped_to_bounds() {
        let policy = ConfidencePolicy::default();
        let c = candidate(&[("blade", DetectedSource::Assumed)], false);
        let low = vec![variable("blade", DetectedSource::Assumed, 35)];
        assert_eq!(aggregate(&[c.clone()], Some("1"), &low, &policy), 30);

        let high = candidate(&[("blade", DetectedSource::Stated)], false);
        let vars = vec![variable("blade", DetectedSource::Stated, 100)];
        assert_eq!(aggregate(&[high], Some("1"), &vars, &policy), 95);
    }

    #[test]
    fn unmet_assumptions_carry_no_penalty() {
        let mut c = candidate(
            &[
                ("handle", DetectedSource::Stated),
                ("plating", DetectedSource::Assumed),
            ],
            false,
        );
        c.requirements[1].met = false;
        c.is_likely = false;
        let vars = vec![
            variable("handle", DetectedSource::Stated, 90),
            variable("plating", DetectedSource::Assumed, 40),
        ];
        assert_eq!(aggregate(&[c], Some("1"), &vars, &ConfidencePolicy::default()), 90);
    }

    #[test]
    fn neutral_without_contributors() {
        let policy = ConfidencePolicy::default();
        let c = candidate(&[], false);
        assert_eq!(aggregate(&[c], Some("1"), &[], &policy), 50);
        assert_eq!(aggregate(&[], None, &[], &policy), 50);
    }
}
