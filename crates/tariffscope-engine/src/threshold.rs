//! Numeric threshold detection.
//!
//! Legal text splits leaves on comparators such as "not over $0.60 per
//! dozen" / "over $0.60 per dozen". Mentions sharing a dimension, amount,
//! unit, and basis form one binary question. Each side keeps the comparator
//! the leaves used, and leaves that never mention the threshold go into a
//! residual "Other" option.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tariffscope_core::{
    DecisionVariable, DetectedSource, LeafEntry, RESIDUAL_LABEL, RESIDUAL_VALUE, VariableKind,
    VariableOption,
};

use crate::category::Category;
use crate::text::{normalize_text, slug};

/// Option value for the at-or-under side.
pub const AT_OR_UNDER: &str = "at_or_under";
/// Option value for the over side.
pub const OVER: &str = "over";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    NotOver,
    Under,
    Over,
    AtLeast,
}

impl Comparator {
    fn parse(s: &str) -> Option<Self> {
        let words = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match words.as_str() {
            "not over" | "not exceeding" | "not more than" => Some(Self::NotOver),
            "under" | "less than" => Some(Self::Under),
            "over" | "exceeding" | "more than" => Some(Self::Over),
            "at least" | "not less than" => Some(Self::AtLeast),
            _ => None,
        }
    }

    /// Wording used in option labels; it parses back to the same comparator.
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::NotOver => "not over",
            Self::Under => "under",
            Self::Over => "over",
            Self::AtLeast => "at least",
        }
    }

    pub fn is_over_side(&self) -> bool {
        matches!(self, Self::Over | Self::AtLeast)
    }

    fn admits(&self, value: f64, amount: f64) -> bool {
        match self {
            Self::NotOver => value <= amount,
            Self::Under => value < amount,
            Self::Over => value > amount,
            Self::AtLeast => value >= amount,
        }
    }
}

/// One comparator mention in a description or option label.
#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    pub dimension: Category,
    pub comparator: Comparator,
    pub amount: f64,
    /// Canonical unit: "usd", "cm", "kg", ...
    pub unit: &'static str,
    /// "each", "per dozen", or empty.
    pub basis: String,
}

impl Mention {
    /// Whether `value` falls on this mention's side of the threshold.
    pub fn admits(&self, value: f64) -> bool {
        self.comparator.admits(value, self.amount)
    }

    /// Whether an explicit number given in `unit` measures the same thing.
    ///
    /// A bare number is taken as a unit value. A unit string matches the
    /// basis for values ("per dozen") and the measuring unit otherwise.
    pub fn applies_to(&self, unit: Option<&str>) -> bool {
        let Some(unit) = unit.map(normalize_text).filter(|u| !u.is_empty()) else {
            return self.dimension == Category::Value;
        };
        match self.dimension {
            Category::Value => {
                if self.basis.is_empty() {
                    return canonical_unit(&unit).is_none_or(|u| u == "usd");
                }
                unit == self.basis || unit.contains(&self.basis) || self.basis.contains(&unit)
            }
            _ => canonical_unit(&unit) == Some(self.unit),
        }
    }
}

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?P<cmp>not\s+over|not\s+exceeding|not\s+more\s+than|not\s+less\s+than|at\s+least|under|less\s+than|over|exceeding|more\s+than)\s+(?P<cur>\$\s?)?(?P<num>\d+(?:,\d{3})*(?:\.\d+)?)\s*(?P<unit>mm|cm|meters?|m|inches|inch|kg|kilograms?|grams?|g|lbs?|pounds?|oz|ounces?)?\b(?:\s+(?P<basis>each|per\s+[a-z]+))?",
    )
    .expect("threshold regex must compile")
});

fn canonical_unit(raw: &str) -> Option<&'static str> {
    let unit = match raw.trim().trim_end_matches('.') {
        "$" | "usd" | "dollars" | "dollar" => "usd",
        "mm" | "millimeters" | "millimeter" => "mm",
        "cm" | "centimeters" | "centimeter" => "cm",
        "m" | "meters" | "meter" => "m",
        "in" | "inch" | "inches" => "in",
        "kg" | "kilograms" | "kilogram" => "kg",
        "g" | "grams" | "gram" => "g",
        "lb" | "lbs" | "pounds" | "pound" => "lb",
        "oz" | "ounces" | "ounce" => "oz",
        _ => return None,
    };
    Some(unit)
}

fn dimension_of(unit: &str) -> Option<Category> {
    match unit {
        "usd" => Some(Category::Value),
        "mm" | "cm" | "m" | "in" => Some(Category::Size),
        "kg" | "g" | "lb" | "oz" => Some(Category::Weight),
        _ => None,
    }
}

/// All value, size, and weight comparator mentions in `text`.
pub fn parse_mentions(text: &str) -> Vec<Mention> {
    let text = normalize_text(text);
    MENTION_RE
        .captures_iter(&text)
        .filter_map(|caps| {
            let comparator = Comparator::parse(&caps["cmp"])?;
            let amount: f64 = caps["num"].replace(',', "").parse().ok()?;
            let unit = if caps.name("cur").is_some() {
                "usd"
            } else {
                canonical_unit(caps.name("unit")?.as_str())?
            };
            let basis = caps
                .name("basis")
                .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            Some(Mention {
                dimension: dimension_of(unit)?,
                comparator,
                amount,
                unit,
                basis,
            })
        })
        .collect()
}

/// Threshold variables found in a leaf set.
#[derive(Debug, Default)]
pub struct ThresholdScan {
    pub variables: Vec<DecisionVariable>,
    /// Dimensions that produced at least one variable.
    pub dimensions: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ThresholdKey {
    dimension: Category,
    /// Amount in thousandths, for exact grouping.
    milli: i64,
    unit: &'static str,
    basis: String,
}

#[derive(Default)]
struct Sides {
    amount: f64,
    at_or_under: Vec<usize>,
    over: Vec<usize>,
    /// First comparator seen on each side.
    under_cmp: Option<Comparator>,
    over_cmp: Option<Comparator>,
}

/// Detect binary threshold questions across `leaves`.
pub fn detect(leaves: &[LeafEntry]) -> ThresholdScan {
    let mut groups: BTreeMap<ThresholdKey, Sides> = BTreeMap::new();

    for (idx, leaf) in leaves.iter().enumerate() {
        for mention in parse_mentions(&leaf.legal_description) {
            let key = ThresholdKey {
                dimension: mention.dimension,
                milli: (mention.amount * 1000.0).round() as i64,
                unit: mention.unit,
                basis: mention.basis.clone(),
            };
            let sides = groups.entry(key).or_default();
            sides.amount = mention.amount;
            let (side, cmp) = if mention.comparator.is_over_side() {
                (&mut sides.over, &mut sides.over_cmp)
            } else {
                (&mut sides.at_or_under, &mut sides.under_cmp)
            };
            cmp.get_or_insert(mention.comparator);
            if !side.contains(&idx) {
                side.push(idx);
            }
        }
    }

    let mut scan = ThresholdScan::default();
    for (key, sides) in groups {
        if sides.at_or_under.is_empty() || sides.over.is_empty() {
            continue;
        }
        let codes = |side: &[usize]| -> Vec<String> {
            side.iter().map(|&i| leaves[i].code.clone()).collect()
        };
        let unmentioned: Vec<usize> = (0..leaves.len())
            .filter(|i| !sides.at_or_under.contains(i) && !sides.over.contains(i))
            .collect();

        let amount = amount_text(&key, sides.amount);
        let under_cmp = sides.under_cmp.unwrap_or(Comparator::NotOver);
        let over_cmp = sides.over_cmp.unwrap_or(Comparator::Over);
        let mut options = vec![
            VariableOption {
                value: AT_OR_UNDER.to_string(),
                label: format!("{} {amount}", under_cmp.phrase()),
                compatible_codes: codes(&sides.at_or_under),
                aliases: vec![],
                is_residual: false,
            },
            VariableOption {
                value: OVER.to_string(),
                label: format!("{} {amount}", over_cmp.phrase()),
                compatible_codes: codes(&sides.over),
                aliases: vec![],
                is_residual: false,
            },
        ];
        if !unmentioned.is_empty() {
            options.push(VariableOption {
                value: RESIDUAL_VALUE.to_string(),
                label: RESIDUAL_LABEL.to_string(),
                compatible_codes: codes(&unmentioned),
                aliases: vec![],
                is_residual: true,
            });
        }

        scan.variables.push(DecisionVariable {
            id: format!("{}_threshold_{}", key.dimension.id(), slug(&amount)),
            name: format!("{} threshold", key.dimension.display_name()),
            kind: VariableKind::NumericBracket,
            question: question(&key, &amount),
            options,
            detected_value: None,
            detected_source: DetectedSource::None,
            confidence: 0,
        });
        if !scan.dimensions.contains(&key.dimension) {
            scan.dimensions.push(key.dimension);
        }
    }
    scan
}

/// "$0.60 per dozen", "15 cm", "2 kg each".
fn amount_text(key: &ThresholdKey, amount: f64) -> String {
    let number = if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    };
    let base = if key.unit == "usd" {
        format!("${number}")
    } else {
        format!("{number} {}", key.unit)
    };
    if key.basis.is_empty() {
        base
    } else {
        format!("{base} {}", key.basis)
    }
}

fn question(key: &ThresholdKey, amount: &str) -> String {
    match key.dimension {
        Category::Size => format!("Does the product measure over {amount}?"),
        Category::Weight => format!("Does the product weigh over {amount}?"),
        _ => format!("Is the value over {amount}?"),
    }
}
