//! Input matching: fill each variable's detected value from the request.
//!
//! Sources are tried strongest first: a previous answer, an explicit number
//! for bracket questions, verbatim wording in the free text, the synonym
//! table, and finally the default strategy. Defaults are recorded as
//! assumptions so they can be audited.

use std::sync::LazyLock;

use tariffscope_core::{
    AnalysisRequest, Assumption, DecisionVariable, DetectedSource, LeafEntry, VariableKind,
    VariableOption,
};
use tracing::{debug, warn};

use crate::config::ConfidencePolicy;
use crate::duty::parse_rate;
use crate::text::{KeywordMatcher, normalize_text};
use crate::threshold::parse_mentions;

/// Terms shorter than this are never matched against free text.
const MIN_TERM_LEN: usize = 3;

/// Everyday wording mapped to the legal vocabulary of option labels.
const SYNONYMS: &[(&str, &str)] = &[
    ("18/8", "stainless steel"),
    ("18/10", "stainless steel"),
    ("inox", "stainless steel"),
    ("sterling", "silver"),
    ("timber", "wood"),
    ("wooden", "wood"),
    ("bamboo", "wood"),
    ("polyester", "synthetic"),
    ("nylon", "synthetic"),
    ("acrylic", "synthetic"),
    ("denim", "cotton"),
    ("tee", "t-shirt"),
    ("pants", "trousers"),
    ("jeans", "trousers"),
    ("ladies", "women's"),
    ("mens", "men's"),
    ("kids", "children's"),
    ("cordless", "battery"),
    ("pocketknife", "folding blade"),
    ("pocket knife", "folding blade"),
    ("penknife", "folding blade"),
    ("jackknife", "folding blade"),
    ("chef's knife", "fixed blade"),
    ("handcrafted", "handmade"),
];

static SYNONYM_MATCHERS: LazyLock<Vec<(KeywordMatcher, &'static str)>> = LazyLock::new(|| {
    SYNONYMS
        .iter()
        .map(|(term, canonical)| (KeywordMatcher::new(term), *canonical))
        .collect()
});

/// Picks an option when the user gave no evidence for a variable.
pub trait DefaultStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn choose<'v>(
        &self,
        variable: &'v DecisionVariable,
        leaves: &[LeafEntry],
    ) -> Option<&'v VariableOption>;

    fn rationale(&self, variable: &DecisionVariable, option: &VariableOption) -> String;
}

/// Assume the first literal option, i.e. the one covering the most leaves.
#[derive(Debug, Default, Clone, Copy)]
pub struct MostCommon;

impl DefaultStrategy for MostCommon {
    fn name(&self) -> &'static str {
        "most_common"
    }

    fn choose<'v>(
        &self,
        variable: &'v DecisionVariable,
        _leaves: &[LeafEntry],
    ) -> Option<&'v VariableOption> {
        variable.options.iter().find(|o| !o.is_residual)
    }

    fn rationale(&self, variable: &DecisionVariable, option: &VariableOption) -> String {
        format!(
            "No {} given in the description; assumed the most common schedule wording \"{}\"",
            variable.name.to_lowercase(),
            option.label
        )
    }
}

/// Assume the option whose leaves carry the highest duty, so estimates err
/// on the expensive side.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighestDuty;

impl DefaultStrategy for HighestDuty {
    fn name(&self) -> &'static str {
        "highest_duty"
    }

    fn choose<'v>(
        &self,
        variable: &'v DecisionVariable,
        leaves: &[LeafEntry],
    ) -> Option<&'v VariableOption> {
        let mut best: Option<(&VariableOption, f64)> = None;
        for option in variable.options.iter().filter(|o| !o.is_residual) {
            let rate = leaves
                .iter()
                .filter(|l| option.is_compatible(&l.code))
                .filter_map(|l| parse_rate(&l.base_duty_rate_text))
                .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.max(r))));
            if let Some(rate) = rate
                && best.is_none_or(|(_, b)| rate > b)
            {
                best = Some((option, rate));
            }
        }
        best.map(|(o, _)| o)
            .or_else(|| MostCommon.choose(variable, leaves))
    }

    fn rationale(&self, variable: &DecisionVariable, option: &VariableOption) -> String {
        format!(
            "No {} given in the description; assumed \"{}\", the option with the highest duty",
            variable.name.to_lowercase(),
            option.label
        )
    }
}

/// Resolve a strategy by its CLI/config name.
pub fn strategy_by_name(name: &str) -> Option<Box<dyn DefaultStrategy>> {
    match name {
        "most_common" | "most-common" => Some(Box::new(MostCommon)),
        "highest_duty" | "highest-duty" => Some(Box::new(HighestDuty)),
        _ => None,
    }
}

/// Outcome of matching one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub value: Option<String>,
    pub source: DetectedSource,
    pub confidence: u8,
    /// Set when the value was defaulted.
    pub rationale: Option<String>,
}

impl Detection {
    fn none() -> Self {
        Self {
            value: None,
            source: DetectedSource::None,
            confidence: 0,
            rationale: None,
        }
    }

    fn found(value: &str, source: DetectedSource, confidence: u8) -> Self {
        Self {
            value: Some(value.to_string()),
            source,
            confidence,
            rationale: None,
        }
    }
}

pub struct InputMatcher<'a> {
    policy: &'a ConfidencePolicy,
    strategy: &'a dyn DefaultStrategy,
}

impl<'a> InputMatcher<'a> {
    pub fn new(policy: &'a ConfidencePolicy, strategy: &'a dyn DefaultStrategy) -> Self {
        Self { policy, strategy }
    }

    /// Fill detected values in place and return the assumptions made.
    pub fn apply(
        &self,
        variables: &mut [DecisionVariable],
        request: &AnalysisRequest,
        leaves: &[LeafEntry],
    ) -> Vec<Assumption> {
        let text = normalize_text(&request.combined_text());
        let mut assumptions = Vec::new();

        for variable in variables.iter_mut() {
            let detection = self.detect(variable, request, &text, leaves);
            debug!(
                variable = %variable.id,
                value = detection.value.as_deref().unwrap_or("-"),
                source = detection.source.as_str(),
                confidence = detection.confidence,
                "matched variable"
            );
            if let (Some(value), Some(rationale)) = (&detection.value, detection.rationale) {
                assumptions.push(Assumption {
                    variable_id: variable.id.clone(),
                    variable_name: variable.name.clone(),
                    assumed_value: value.clone(),
                    rationale,
                });
            }
            variable.detected_value = detection.value;
            variable.detected_source = detection.source;
            variable.confidence = detection.confidence;
        }
        assumptions
    }

    /// Match one variable against the request. `text` is the normalised
    /// combined free text.
    pub fn detect(
        &self,
        variable: &DecisionVariable,
        request: &AnalysisRequest,
        text: &str,
        leaves: &[LeafEntry],
    ) -> Detection {
        if let Some(answer) = request.previous_answers.get(&variable.id) {
            if variable.option(answer).is_some() {
                return Detection::found(answer, DetectedSource::Stated, self.policy.previous_answer);
            }
            warn!(variable = %variable.id, answer = %answer, "previous answer matches no option");
        }

        if variable.kind == VariableKind::NumericBracket
            && let Some(value) = request.explicit_numeric_value
            && let Some(option) = bracket_for(variable, value, request.explicit_numeric_unit.as_deref())
        {
            return Detection::found(&option.value, DetectedSource::Stated, self.policy.numeric_value);
        }

        if let Some(option) = direct_match(variable, text) {
            return Detection::found(&option.value, DetectedSource::Stated, self.policy.direct_match);
        }

        if let Some(option) = synonym_match(variable, text) {
            return Detection::found(
                &option.value,
                DetectedSource::Inferred,
                self.policy.synonym_match,
            );
        }

        if variable.kind == VariableKind::SingleChoice
            && let Some(option) = self.strategy.choose(variable, leaves)
        {
            return Detection {
                value: Some(option.value.clone()),
                source: DetectedSource::Assumed,
                confidence: self.policy.assumed,
                rationale: Some(self.strategy.rationale(variable, option)),
            };
        }

        Detection::none()
    }
}

/// The first option whose comparator admits `value` in a matching unit.
fn bracket_for<'v>(
    variable: &'v DecisionVariable,
    value: f64,
    unit: Option<&str>,
) -> Option<&'v VariableOption> {
    // Every applicable bound in a label must admit the value; among the
    // admitting options the one whose bound sits closest to it wins.
    variable
        .options
        .iter()
        .filter(|o| !o.is_residual)
        .filter_map(|o| {
            let mentions: Vec<_> = parse_mentions(&o.label)
                .into_iter()
                .filter(|m| m.applies_to(unit))
                .collect();
            if mentions.is_empty() || !mentions.iter().all(|m| m.admits(value)) {
                return None;
            }
            let slack = mentions
                .iter()
                .map(|m| (value - m.amount).abs())
                .fold(f64::INFINITY, f64::min);
            Some((o, slack))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(o, _)| o)
}

/// Literal wordings an option answers to, lower-cased.
///
/// Bracket values ("over", "at_or_under") are tokens rather than wording,
/// so only their labels count.
fn option_terms(option: &VariableOption, kind: VariableKind) -> Vec<String> {
    let mut terms = vec![normalize_text(&option.label)];
    if kind == VariableKind::SingleChoice {
        terms.push(option.value.replace('_', " "));
    }
    terms.extend(option.aliases.iter().map(|a| normalize_text(a)));
    terms.retain(|t| t.chars().count() >= MIN_TERM_LEN);
    terms
}

/// The option with the longest term contained in `text`; ties keep the
/// earlier option.
fn direct_match<'v>(variable: &'v DecisionVariable, text: &str) -> Option<&'v VariableOption> {
    let mut best: Option<(&VariableOption, usize)> = None;
    for option in variable.options.iter().filter(|o| !o.is_residual) {
        let longest = option_terms(option, variable.kind)
            .into_iter()
            .filter(|t| text.contains(t.as_str()))
            .map(|t| t.len())
            .max();
        if let Some(len) = longest
            && best.is_none_or(|(_, b)| len > b)
        {
            best = Some((option, len));
        }
    }
    best.map(|(o, _)| o)
}

/// Map everyday wording through the synonym table, then look for an option
/// whose wording contains the canonical term.
fn synonym_match<'v>(variable: &'v DecisionVariable, text: &str) -> Option<&'v VariableOption> {
    SYNONYM_MATCHERS
        .iter()
        .filter(|(matcher, _)| matcher.is_match(text))
        .find_map(|(_, canonical)| {
            variable
                .options
                .iter()
                .filter(|o| !o.is_residual)
                .find(|o| {
                    option_terms(o, variable.kind)
                        .iter()
                        .any(|t| t.contains(canonical))
                })
        })
}
