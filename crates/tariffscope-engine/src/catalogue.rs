//! Catalogue of multi-word legal phrase patterns.
//!
//! Each leaf description is scanned with the catalogue in order. Every match
//! is blanked out (replaced by spaces of the same length) before the next
//! pattern runs, so "handles of wood" is never also seen as "of wood" or
//! "wood". Whatever text survives the catalogue is split into single words.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::normalize_text;

const COMPARATORS: &str = r"(?:not\s+over|not\s+exceeding|not\s+more\s+than|not\s+less\s+than|at\s+least|under|less\s+than|over|exceeding|more\s+than)";

const MATERIALS: &str = r"(?:stainless\s+steel|base\s+metal|precious\s+metal|man-made\s+fibers?|synthetic\s+fibers?|artificial\s+fibers?|vegetable\s+fibers?|textile\s+materials?|fine\s+animal\s+hair|plastics?|rubber|leather|cotton|wool|silk|linen|flax|glass|ceramics?|porcelain|wood|bamboo|iron|steel|aluminum|aluminium|copper|nickel|silver|gold|bone|horn|paperboard|paper)\b";

const PLATING_METALS: &str = r"(?:silver|gold|nickel|chromium|chrome|rhodium|platinum|precious\s+metal)";

/// Words that never make a useful question on their own.
const STOP_WORDS: &[&str] = &[
    "other", "others", "nesoi", "articles", "article", "parts", "part", "thereof", "with",
    "having", "than", "whether", "including", "containing", "similar", "such", "like", "those",
    "these", "which", "kind", "used", "each", "valued", "value", "over", "under", "exceeding",
    "certain", "described", "provided", "headings", "heading", "subheading", "chapter", "note",
    "notes", "goods", "products", "items", "from", "into", "their", "them", "whose", "when",
    "where", "also", "only", "more", "less", "white", "black", "blue", "green", "yellow",
    "brown", "grey", "gray", "colored", "coloured", "pink", "purple", "orange",
];

/// One named pattern in the catalogue.
pub struct CatalogueRule {
    pub name: &'static str,
    re: Regex,
}

impl CatalogueRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            re: Regex::new(pattern).expect("catalogue regex must compile"),
        }
    }
}

static CATALOGUE: LazyLock<Vec<CatalogueRule>> = LazyLock::new(|| {
    vec![
        CatalogueRule::new(
            "value",
            &format!(
                r"\b(?:valued\s+)?{COMPARATORS}\s+\$\s?\d+(?:,\d{{3}})*(?:\.\d+)?(?:\s+(?:each|per\s+[a-z]+))?"
            ),
        ),
        CatalogueRule::new(
            "size",
            &format!(
                r"\b{COMPARATORS}\s+\d+(?:\.\d+)?\s*(?:mm|cm|m|meters?|inches|inch)\b(?:\s+in\s+(?:length|width|height|diameter))?"
            ),
        ),
        CatalogueRule::new(
            "weight",
            &format!(
                r"\b{COMPARATORS}\s+\d+(?:\.\d+)?\s*(?:kg|kilograms?|g|grams?|lbs?|pounds?|oz|ounces?)\b(?:\s+each)?"
            ),
        ),
        CatalogueRule::new(
            "plating",
            &format!(
                r"\b(?:(?:silver|gold|nickel|chromium|chrome|rhodium|platinum)[\s-]plated|plated\s+with\s+{PLATING_METALS})\b"
            ),
        ),
        CatalogueRule::new(
            "handle",
            &format!(
                r"\b(?:(?:with|having)\s+)?handles?\s+(?:of|in)\s+{MATERIALS}(?:\s+or\s+{MATERIALS})?"
            ),
        ),
        CatalogueRule::new(
            "blade",
            &format!(
                r"\b(?:(?:with|having)\s+)?(?:blades?\s+(?:of|in)\s+{MATERIALS}|(?:fixed|folding|serrated|retractable|interchangeable)\s+blades?\b)"
            ),
        ),
        CatalogueRule::new(
            "material",
            &format!(
                r"\b(?:(?:wholly|chiefly|principally|in\s+part)\s+)?of\s+{MATERIALS}(?:(?:\s*,\s*|\s+or\s+|\s+and\s+){MATERIALS})*"
            ),
        ),
        CatalogueRule::new(
            "bare_material",
            r"\b(?:stainless\s+steel|base\s+metal|precious\s+metal|man-made\s+fibers?|synthetic\s+fibers?|artificial\s+fibers?)\b",
        ),
        CatalogueRule::new(
            "demographic",
            r"\b(?:men's\s+or\s+boys'|women's\s+or\s+girls'|boys'\s+or\s+girls'|men's|women's|boys'|girls'|babies'|infants'|children's|for\s+(?:men|women|boys|girls|babies|infants|children)(?:\s+or\s+(?:men|women|boys|girls|babies|infants|children))?\b)",
        ),
        CatalogueRule::new(
            "garment",
            r"\b(?:t-shirts?|tank\s+tops?|night\s+dresses|dressing\s+gowns?)\b",
        ),
        CatalogueRule::new(
            "construction",
            r"\b(?:not\s+knitted\s+or\s+crocheted|knitted\s+or\s+crocheted)\b",
        ),
        CatalogueRule::new(
            "power",
            r"\b(?:(?:battery|electrically|electric|manually|hand|foot|pedal|solar|gas|spring)[\s-](?:operated|powered|driven)|with\s+self-contained\s+electric\s+motors?|powered\s+by\s+[a-z]+)\b",
        ),
        CatalogueRule::new(
            "intended_use",
            r"\b(?:(?:for|suitable\s+for|designed\s+for)\s+(?:household|domestic|kitchen|table|industrial|commercial|medical|surgical|dental|veterinary|military|sports?|agricultural|office|professional)(?:\s+(?:use|purposes))?|of\s+a\s+kind\s+used\s+(?:in|for|with|on|by)\s+[a-z-]+)\b",
        ),
        CatalogueRule::new(
            "manufacture",
            r"\b(?:hand[\s-]?made|made\s+by\s+hand|machine[\s-]made|hand[\s-]loomed|hand[\s-]woven)\b",
        ),
        CatalogueRule::new(
            "packaging",
            r"\b(?:(?:put\s+up\s+)?in\s+sets(?:\s+of\s+\d+\s+or\s+more)?|put\s+up\s+for\s+retail\s+sale|in\s+bulk|in\s+(?:packages|containers|packings)\s+(?:of|holding)\s+[^,;]+)",
        ),
    ]
});

/// Names of the catalogue rules, in scan order.
pub fn rule_names() -> impl Iterator<Item = &'static str> {
    CATALOGUE.iter().map(|r| r.name)
}

/// A phrase found in one description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    /// Canonical form used to compare phrases across leaves.
    pub phrase: String,
    /// The wording as it appeared in the description.
    pub surface: String,
}

/// Extract the candidate phrases of one description: catalogue matches
/// first, then surviving single words. Deduplicated on the canonical form.
pub fn scan(description: &str) -> Vec<PhraseMatch> {
    let mut text = normalize_text(description);
    let mut found: Vec<PhraseMatch> = Vec::new();

    for rule in CATALOGUE.iter() {
        let ranges: Vec<_> = rule.re.find_iter(&text).map(|m| m.range()).collect();
        for range in ranges {
            let surface = tidy(&text[range.clone()]);
            let phrase = canonicalize(&surface);
            if !phrase.is_empty() {
                push_unique(&mut found, phrase, surface);
            }
            let blank = " ".repeat(range.len());
            text.replace_range(range, &blank);
        }
    }

    for word in single_words(&text) {
        push_unique(&mut found, word.clone(), word);
    }
    found
}

fn push_unique(found: &mut Vec<PhraseMatch>, phrase: String, surface: String) {
    if !found.iter().any(|p| p.phrase == phrase) {
        found.push(PhraseMatch { phrase, surface });
    }
}

/// Collapse whitespace and drop trailing punctuation.
fn tidy(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '.') || c.is_whitespace())
        .to_string()
}

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:with|having|valued|of)\s+").expect("prefix regex must compile")
});
static PLURAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(handle|blade)s\b").expect("plural regex must compile"));
static NOT_OVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^not\s+(?:exceeding|more\s+than)\b").expect("comparator regex must compile")
});
static OVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:exceeding|more\s+than)\b").expect("comparator regex must compile")
});
static PLATED_WITH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^plated\s+with\s+(.+)$").expect("plating regex must compile")
});
static SPACE_PLATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+)\s+plated$").expect("plating regex must compile")
});
static HANDMADE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:hand[\s-]?made|made\s+by\s+hand)$").expect("handmade regex must compile")
});

/// Reduce a surface phrase to the form shared by its legal variants.
///
/// "with handles of wood" and "handle of wood" compare equal; so do
/// "not exceeding $5" and "not over $5", and "plated with silver" and
/// "silver-plated".
pub fn canonicalize(surface: &str) -> String {
    let mut s = tidy(surface);
    while let Some(m) = PREFIX_RE.find(&s) {
        s = s[m.end()..].to_string();
    }
    s = PLURAL_RE.replace_all(&s, "$1").into_owned();
    s = NOT_OVER_RE.replace(&s, "not over").into_owned();
    s = OVER_RE.replace(&s, "over").into_owned();
    if let Some(caps) = PLATED_WITH_RE.captures(&s) {
        s = format!("{}-plated", caps[1].replace(' ', "-"));
    } else if let Some(caps) = SPACE_PLATED_RE.captures(&s) {
        s = format!("{}-plated", &caps[1]);
    }
    if HANDMADE_RE.is_match(&s) {
        s = "handmade".to_string();
    }
    s
}

/// Single words that survive the catalogue: at least four characters,
/// no digits, not a stop word.
fn single_words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
        .map(|w| w.trim_matches(|c| c == '-' || c == '\''))
        .filter(|w| w.chars().count() >= 4)
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .filter(|w| !is_stop_word(w))
        .map(str::to_string)
        .collect()
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}
