//! Decision variable construction.
//!
//! Differentiating phrases are grouped by category; each category becomes one
//! variable whose options are the phrases (merged when they select exactly
//! the same leaves), plus a residual Other/Standard option covering leaves
//! no phrase claims. Every leaf therefore belongs to at least one option.

use std::collections::BTreeSet;

use tariffscope_core::{
    DecisionVariable, DetectedSource, LeafEntry, RESIDUAL_LABEL, RESIDUAL_VALUE, VariableKind,
    VariableOption,
};
use tracing::debug;

use crate::category::Category;
use crate::differentiator::DifferentiatingPhrase;
use crate::text::slug;

/// An option under construction, before residual and ordering.
struct Draft {
    labels: Vec<String>,
    aliases: Vec<String>,
    leaf_indices: Vec<usize>,
}

/// Build one variable per significant category.
///
/// `suppressed` lists numeric dimensions already covered by a dedicated
/// threshold question; their generic variables are not built.
pub fn build_variables(
    phrases: &[DifferentiatingPhrase],
    leaves: &[LeafEntry],
    suppressed: &[Category],
    max_options: usize,
) -> Vec<DecisionVariable> {
    let mut variables = Vec::new();

    for category in Category::ALL {
        let in_category: Vec<&DifferentiatingPhrase> =
            phrases.iter().filter(|p| p.category == category).collect();
        if in_category.is_empty() {
            continue;
        }
        if suppressed.contains(&category) {
            debug!(category = category.id(), "covered by threshold question");
            continue;
        }

        let drafts = merge_drafts(&in_category, leaves);
        let significant = category.is_always_significant();
        if drafts.len() < 2 && !significant {
            debug!(category = category.id(), "single literal option, dropped");
            continue;
        }

        let mut options: Vec<VariableOption> = drafts
            .into_iter()
            .map(|d| literal_option(d, leaves))
            .collect();
        dedupe_values(&mut options);

        let claimed: BTreeSet<&str> = options
            .iter()
            .flat_map(|o| o.compatible_codes.iter().map(String::as_str))
            .collect();
        let unclaimed: Vec<String> = leaves
            .iter()
            .filter(|l| !claimed.contains(l.code.as_str()))
            .map(|l| l.code.clone())
            .collect();
        if !unclaimed.is_empty() {
            options.push(VariableOption {
                value: RESIDUAL_VALUE.to_string(),
                label: RESIDUAL_LABEL.to_string(),
                compatible_codes: unclaimed,
                aliases: vec![],
                is_residual: true,
            });
        }

        let mut kind = VariableKind::SingleChoice;
        if options.len() > max_options {
            if category == Category::Value {
                kind = VariableKind::NumericBracket;
            } else {
                debug!(
                    category = category.id(),
                    options = options.len(),
                    "too many options, dropped"
                );
                continue;
            }
        }

        let question = if category == Category::Other && options.len() == 2 {
            format!("Is this {}?", options[0].label)
        } else {
            category.question().to_string()
        };

        variables.push(DecisionVariable {
            id: category.id().to_string(),
            name: category.display_name().to_string(),
            kind,
            question,
            options,
            detected_value: None,
            detected_source: DetectedSource::None,
            confidence: 0,
        });
    }
    variables
}

/// Merge phrases that select the same leaves, then order the drafts by
/// leaf count (descending), first leaf position, and label.
fn merge_drafts(phrases: &[&DifferentiatingPhrase], leaves: &[LeafEntry]) -> Vec<Draft> {
    let mut drafts: Vec<Draft> = Vec::new();
    for phrase in phrases {
        let indices: Vec<usize> = leaves
            .iter()
            .enumerate()
            .filter(|(_, l)| phrase.codes.contains(&l.code))
            .map(|(i, _)| i)
            .collect();
        let aliases = phrase
            .variants
            .iter()
            .filter(|v| **v != phrase.phrase)
            .cloned();

        match drafts.iter_mut().find(|d| d.leaf_indices == indices) {
            Some(draft) => {
                draft.labels.push(phrase.phrase.clone());
                for alias in aliases {
                    if !draft.aliases.contains(&alias) {
                        draft.aliases.push(alias);
                    }
                }
            }
            None => drafts.push(Draft {
                labels: vec![phrase.phrase.clone()],
                aliases: aliases.collect(),
                leaf_indices: indices,
            }),
        }
    }

    drafts.sort_by(|a, b| {
        b.leaf_indices
            .len()
            .cmp(&a.leaf_indices.len())
            .then_with(|| a.leaf_indices.first().cmp(&b.leaf_indices.first()))
            .then_with(|| a.labels.cmp(&b.labels))
    });
    drafts
}

fn literal_option(draft: Draft, leaves: &[LeafEntry]) -> VariableOption {
    let mut aliases = draft.aliases;
    // Merged labels stay matchable individually.
    if draft.labels.len() > 1 {
        for label in &draft.labels {
            if !aliases.contains(label) {
                aliases.push(label.clone());
            }
        }
    }
    VariableOption {
        value: slug(&draft.labels[0]),
        label: draft.labels.join(" / "),
        compatible_codes: draft
            .leaf_indices
            .iter()
            .map(|&i| leaves[i].code.clone())
            .collect(),
        aliases,
        is_residual: false,
    }
}

/// Option values must be unique within a variable and never collide with
/// the residual token.
fn dedupe_values(options: &mut [VariableOption]) {
    let mut taken: Vec<String> = vec![RESIDUAL_VALUE.to_string()];
    for option in options.iter_mut() {
        if option.value.is_empty() {
            option.value = "option".to_string();
        }
        let base = option.value.clone();
        let mut n = 2;
        while taken.contains(&option.value) {
            option.value = format!("{base}_{n}");
            n += 1;
        }
        taken.push(option.value.clone());
    }
}
