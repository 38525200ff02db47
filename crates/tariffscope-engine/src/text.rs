//! Text normalisation and keyword matching shared by the extractor,
//! categorizer, and input matcher.

use regex::Regex;

/// Lower-case, straighten curly apostrophes, and collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let lowered = s.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'");
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn a phrase into an option value token: "silver-plated" → "silver_plated".
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_sep = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Keywords up to this many characters are matched on word boundaries.
const SHORT_KEYWORD_LEN: usize = 5;

/// A keyword compiled for matching against normalised text.
///
/// Short keywords need word boundaries ("under" must not hit "undershirts");
/// a plural suffix is allowed so "shirt" still finds "shirts". Longer
/// keywords are plain substrings.
#[derive(Debug, Clone)]
pub enum KeywordMatcher {
    Substring(String),
    Boundary(Regex),
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Self {
        let keyword = keyword.to_lowercase();
        if keyword.chars().count() > SHORT_KEYWORD_LEN {
            return Self::Substring(keyword);
        }

        let starts_word = keyword.chars().next().is_some_and(is_word_char);
        let ends_word = keyword.chars().last().is_some_and(is_word_char);
        let pattern = format!(
            "{}{}{}",
            if starts_word { r"\b" } else { "" },
            regex::escape(&keyword),
            if ends_word { r"(?:e?s)?\b" } else { "" },
        );
        match Regex::new(&pattern) {
            Ok(re) => Self::Boundary(re),
            // An escaped literal always compiles; fall back rather than panic.
            Err(_) => Self::Substring(keyword),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Substring(kw) => text.contains(kw.as_str()),
            Self::Boundary(re) => re.is_match(text),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
