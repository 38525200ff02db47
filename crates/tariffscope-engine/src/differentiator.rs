//! Differentiating phrase extraction.
//!
//! A phrase differentiates a leaf set when it appears in at least one leaf
//! but not in all of them. Phrases present everywhere say nothing about
//! which leaf applies.

use std::collections::BTreeMap;

use serde::Serialize;
use tariffscope_core::LeafEntry;
use tracing::debug;

use crate::catalogue;
use crate::category::{Category, categorize};

/// A phrase found in some, but not all, leaves of a branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferentiatingPhrase {
    /// Canonical form.
    pub phrase: String,
    pub category: Category,
    /// Codes of the leaves containing the phrase, in leaf order.
    pub codes: Vec<String>,
    /// Surface wordings seen across leaves, first occurrence first.
    pub variants: Vec<String>,
}

#[derive(Default)]
struct Occurrences {
    leaf_indices: Vec<usize>,
    variants: Vec<String>,
}

/// Extract the differentiating phrases of a leaf set, sorted by phrase.
pub fn extract(leaves: &[LeafEntry]) -> Vec<DifferentiatingPhrase> {
    let mut seen: BTreeMap<String, Occurrences> = BTreeMap::new();

    for (idx, leaf) in leaves.iter().enumerate() {
        for found in catalogue::scan(&leaf.legal_description) {
            let entry = seen.entry(found.phrase).or_default();
            if entry.leaf_indices.last() != Some(&idx) {
                entry.leaf_indices.push(idx);
            }
            if !entry.variants.contains(&found.surface) {
                entry.variants.push(found.surface);
            }
        }
    }

    let total = leaves.len();
    let phrases: Vec<DifferentiatingPhrase> = seen
        .into_iter()
        .filter(|(_, occ)| !occ.leaf_indices.is_empty() && occ.leaf_indices.len() < total)
        .map(|(phrase, occ)| DifferentiatingPhrase {
            category: categorize(&phrase),
            codes: occ
                .leaf_indices
                .iter()
                .map(|&i| leaves[i].code.clone())
                .collect(),
            variants: occ.variants,
            phrase,
        })
        .collect();

    debug!(leaves = total, phrases = phrases.len(), "extracted differentiators");
    phrases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(code: &str, description: &str) -> LeafEntry {
        LeafEntry::new(code, description, "")
    }

    #[test]
    fn shared_phrases_are_dropped() {
        let leaves = vec![
            leaf("8211910010", "Knives having fixed blades"),
            leaf("8211910020", "Knives having folding blades"),
            leaf("8211910030", "Knives, other"),
        ];
        let found = extract(&leaves);
        let names: Vec<_> = found.iter().map(|p| p.phrase.as_str()).collect();
        assert_eq!(names, vec!["fixed blade", "folding blade"]);
        assert!(found.iter().all(|p| p.category == Category::Blade));
        assert_eq!(found[0].codes, vec!["8211910010"]);
        assert_eq!(found[0].variants, vec!["having fixed blades"]);
    }

    #[test]
    fn variants_collect_surface_forms() {
        let leaves = vec![
            leaf("1", "Knives with handles of wood"),
            leaf("2", "Forks having handles of wood"),
            leaf("3", "Spoons"),
        ];
        let found = extract(&leaves);
        let handle = found.iter().find(|p| p.phrase == "handle of wood").unwrap();
        assert_eq!(handle.codes, vec!["1", "2"]);
        assert_eq!(
            handle.variants,
            vec!["with handles of wood", "having handles of wood"]
        );
        assert_eq!(handle.category, Category::Handle);
    }

    #[test]
    fn single_leaf_has_no_differentiators() {
        assert!(extract(&[leaf("1", "Razors, fixed blades")]).is_empty());
        assert!(extract(&[]).is_empty());
    }

    #[test]
    fn identical_descriptions_have_no_differentiators() {
        let leaves = vec![leaf("1", "Table knives"), leaf("2", "Table knives")];
        assert!(extract(&leaves).is_empty());
    }
}
