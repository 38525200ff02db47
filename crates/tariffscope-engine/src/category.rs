//! Attribute categories for differentiating phrases.
//!
//! Rules are checked in a fixed priority order; the first category whose
//! rule fires wins. Numeric comparators come first, then the specific
//! sub-material attributes (handle, blade, plating) so that
//! "handles of wood" is a handle question rather than a material one.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::KeywordMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Value,
    Size,
    Weight,
    Handle,
    Blade,
    Plating,
    Demographic,
    Garment,
    Power,
    IntendedUse,
    Manufacture,
    Construction,
    Packaging,
    Material,
    Other,
}

impl Category {
    /// Priority order used by [`categorize`] and by the variable builder.
    pub const ALL: [Category; 15] = [
        Self::Value,
        Self::Size,
        Self::Weight,
        Self::Handle,
        Self::Blade,
        Self::Plating,
        Self::Demographic,
        Self::Garment,
        Self::Power,
        Self::IntendedUse,
        Self::Manufacture,
        Self::Construction,
        Self::Packaging,
        Self::Material,
        Self::Other,
    ];

    /// Stable variable id.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Size => "size",
            Self::Weight => "weight",
            Self::Handle => "handle",
            Self::Blade => "blade",
            Self::Plating => "plating",
            Self::Demographic => "demographic",
            Self::Garment => "garment_type",
            Self::Power => "power_source",
            Self::IntendedUse => "intended_use",
            Self::Construction => "construction",
            Self::Manufacture => "manufacture",
            Self::Packaging => "packaging",
            Self::Material => "material",
            Self::Other => "other_features",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Value => "Unit value",
            Self::Size => "Size",
            Self::Weight => "Weight",
            Self::Handle => "Handle",
            Self::Blade => "Blade",
            Self::Plating => "Plating",
            Self::Demographic => "Intended wearer",
            Self::Garment => "Garment type",
            Self::Power => "Power source",
            Self::IntendedUse => "Intended use",
            Self::Construction => "Construction",
            Self::Manufacture => "Method of manufacture",
            Self::Packaging => "Packaging",
            Self::Material => "Material",
            Self::Other => "Other features",
        }
    }

    /// Question template; uncategorized binary choices are phrased by the builder.
    pub fn question(&self) -> &'static str {
        match self {
            Self::Value => "What is the unit value of the product?",
            Self::Size => "What are the dimensions of the product?",
            Self::Weight => "How much does the product weigh?",
            Self::Handle => "What are the handles made of?",
            Self::Blade => "What kind of blade does it have?",
            Self::Plating => "Is the product plated, and with what?",
            Self::Demographic => "Who is the product made for?",
            Self::Garment => "What type of garment is it?",
            Self::Power => "How is the product powered?",
            Self::IntendedUse => "What is the product used for?",
            Self::Construction => "How is the product constructed?",
            Self::Manufacture => "How was the product made?",
            Self::Packaging => "How is the product packaged?",
            Self::Material => "What is the product made of?",
            Self::Other => "Which of these best describes the product?",
        }
    }

    /// Numeric dimensions carry comparators and may degrade to brackets.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Value | Self::Size | Self::Weight)
    }

    /// Kept even when only one literal phrase exists.
    pub fn is_always_significant(&self) -> bool {
        matches!(self, Self::Handle | Self::Blade | Self::Plating)
    }
}

const COMPARATOR: &str = r"\b(?:not\s+over|not\s+exceeding|not\s+more\s+than|not\s+less\s+than|at\s+least|under|less\s+than|over|exceeding|more\s+than)\s+";

static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"{COMPARATOR}\$\s?\d")));
static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"{COMPARATOR}\d+(?:\.\d+)?\s*(?:mm|cm|m|meters?|inches|inch)\b"
    ))
});
static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"{COMPARATOR}\d+(?:\.\d+)?\s*(?:kg|kilograms?|g|grams?|lbs?|pounds?|oz|ounces?)\b"
    ))
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("category regex must compile")
}

struct KeywordRule {
    category: Category,
    keywords: Vec<KeywordMatcher>,
}

impl KeywordRule {
    fn new(category: Category, words: &[&str]) -> Self {
        Self {
            category,
            keywords: words.iter().map(|w| KeywordMatcher::new(w)).collect(),
        }
    }
}

static KEYWORD_RULES: LazyLock<Vec<KeywordRule>> = LazyLock::new(|| {
    vec![
        KeywordRule::new(Category::Handle, &["handle", "hilt", "grip"]),
        KeywordRule::new(Category::Blade, &["blade", "edge", "serrated"]),
        KeywordRule::new(Category::Plating, &["plated", "plating", "plate", "gilt", "clad"]),
        KeywordRule::new(
            Category::Demographic,
            &[
                "men's", "women's", "boys'", "girls'", "babies'", "infants'", "children's",
                "unisex", "for men", "for women", "for boys", "for girls", "for infants",
            ],
        ),
        KeywordRule::new(
            Category::Garment,
            &[
                "t-shirt", "singlet", "tank top", "sweatshirt", "sweater", "pullover",
                "cardigan", "undershirt", "shirt", "blouse", "trousers", "shorts", "overalls",
                "skirt", "dress", "jacket", "blazer", "suit", "underpants", "briefs",
                "nightdress", "pajamas", "pyjamas", "coat", "anorak", "vest",
            ],
        ),
        KeywordRule::new(
            Category::Power,
            &[
                "battery", "electric", "motor", "powered", "operated", "manual", "solar",
                "pedal", "cordless", "driven",
            ],
        ),
        KeywordRule::new(
            Category::IntendedUse,
            &[
                "household", "domestic", "kitchen", "table", "industrial", "commercial",
                "medical", "surgical", "dental", "veterinary", "military", "sport",
                "agricultural", "office", "professional", "kind used", "for use",
                "designed for", "suitable for",
            ],
        ),
        KeywordRule::new(
            Category::Manufacture,
            &["handmade", "hand-made", "machine-made", "hand-loomed", "hand-woven", "made by hand"],
        ),
        KeywordRule::new(
            Category::Construction,
            &[
                "knitted", "crocheted", "woven", "nonwoven", "non-woven", "forged", "cast",
                "stamped", "welded", "seamless", "molded", "moulded", "assembled", "laminated",
                "coated", "quilted",
            ],
        ),
        KeywordRule::new(
            Category::Packaging,
            &[
                "sets", "set", "pair", "pairs", "dozen", "retail sale", "in bulk",
                "packages", "containers", "packings", "assortment",
            ],
        ),
        KeywordRule::new(
            Category::Material,
            &[
                "stainless", "steel", "iron", "aluminum", "aluminium", "copper", "nickel",
                "silver", "gold", "platinum", "precious metal", "base metal", "metal",
                "plastic", "rubber", "leather", "cotton", "wool", "animal hair", "silk",
                "synthetic", "artificial", "man-made", "fiber", "fibre", "textile", "glass",
                "ceramic", "porcelain", "wood", "bamboo", "bone", "horn", "paper",
                "paperboard", "linen", "flax", "polyester", "nylon",
            ],
        ),
    ]
});

/// Assign a phrase to the first category whose rule fires.
pub fn categorize(phrase: &str) -> Category {
    if VALUE_RE.is_match(phrase) {
        return Category::Value;
    }
    if SIZE_RE.is_match(phrase) {
        return Category::Size;
    }
    if WEIGHT_RE.is_match(phrase) {
        return Category::Weight;
    }
    KEYWORD_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| k.is_match(phrase)))
        .map(|rule| rule.category)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_phrases() {
        assert_eq!(categorize("not over $0.60 per dozen"), Category::Value);
        assert_eq!(categorize("over $5 each"), Category::Value);
        assert_eq!(categorize("over 15 cm in length"), Category::Size);
        assert_eq!(categorize("not over 2 kg"), Category::Weight);
    }

    #[test]
    fn sub_material_wins_over_material() {
        assert_eq!(categorize("handle of wood"), Category::Handle);
        assert_eq!(categorize("blade of stainless steel"), Category::Blade);
        assert_eq!(categorize("silver-plated"), Category::Plating);
        assert_eq!(categorize("fixed blade"), Category::Blade);
    }

    #[test]
    fn apparel_phrases() {
        assert_eq!(categorize("men's or boys'"), Category::Demographic);
        assert_eq!(categorize("women's or girls'"), Category::Demographic);
        assert_eq!(categorize("t-shirts"), Category::Garment);
        assert_eq!(categorize("undershirts"), Category::Garment);
        assert_eq!(categorize("knitted or crocheted"), Category::Construction);
    }

    #[test]
    fn hand_woven_is_manufacture() {
        assert_eq!(categorize("hand-woven"), Category::Manufacture);
        assert_eq!(categorize("woven"), Category::Construction);
    }

    #[test]
    fn remaining_categories() {
        assert_eq!(categorize("battery-operated"), Category::Power);
        assert_eq!(categorize("for household use"), Category::IntendedUse);
        assert_eq!(categorize("handmade"), Category::Manufacture);
        assert_eq!(categorize("in sets"), Category::Packaging);
        assert_eq!(categorize("cotton"), Category::Material);
        assert_eq!(categorize("stainless steel"), Category::Material);
        assert_eq!(categorize("pocket"), Category::Other);
    }

    #[test]
    fn short_keywords_respect_boundaries() {
        // "suit" must not fire on "suitable", nor "cast" on "broadcast".
        assert_ne!(categorize("broadcast"), Category::Construction);
        assert_eq!(categorize("suitable"), Category::Other);
    }

    #[test]
    fn builder_order_puts_numeric_first() {
        assert!(Category::ALL[..3].iter().all(Category::is_numeric));
        assert_eq!(Category::ALL.last(), Some(&Category::Other));
    }
}
