//! Canonical form for tariff-schedule codes.
//!
//! Schedule codes arrive in several shapes: dotted ("8211.91.50.00"),
//! spaced ("8211 91 50 00"), or already bare ("8211915000"). Everything
//! downstream compares the dot-free canonical form.
//!
//! # Schedule hierarchy
//!
//! - 4 digits: heading (8211)
//! - 6 digits: subheading (8211.91)
//! - 8 digits: tariff line (8211.91.50)
//! - 10 digits: statistical suffix, the finest granularity (8211.91.50.00)

/// Length of a leaf code at the schedule's finest granularity.
pub const LEAF_CODE_LEN: usize = 10;

/// Strip separators from a schedule code.
///
/// Input: "8211.91.50.00", " 8211 91 5000 ", "8211-91"
/// Output: "8211915000", "8211915000", "821191"
///
/// Anything that is not an ASCII alphanumeric is dropped; letters are
/// upper-cased so chapter-99 style codes compare consistently.
pub fn canonical_code(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Render a canonical code with the conventional dot grouping (4.2.2.2).
///
/// "8211915000" → "8211.91.50.00", "821191" → "8211.91". Codes shorter
/// than a heading are returned unchanged.
pub fn format_code(code: &str) -> String {
    let code = canonical_code(code);
    if code.len() <= 4 {
        return code;
    }

    let mut out = String::with_capacity(code.len() + 3);
    out.push_str(&code[..4]);
    let mut i = 4;
    while i < code.len() {
        let end = (i + 2).min(code.len());
        out.push('.');
        out.push_str(&code[i..end]);
        i = end;
    }
    out
}

/// Whether `code` is a leaf of `leaf_len` digits under `branch_prefix`.
///
/// Both arguments are canonicalised first, so dotted prefixes work.
pub fn is_leaf_under(code: &str, branch_prefix: &str, leaf_len: usize) -> bool {
    let code = canonical_code(code);
    let prefix = canonical_code(branch_prefix);
    code.len() == leaf_len && code.starts_with(&prefix)
}
