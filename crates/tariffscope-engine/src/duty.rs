//! Duty-rate parsing and the min/max range across candidate leaves.

use std::sync::LazyLock;

use regex::Regex;
use tariffscope_core::{DutyRange, LeafEntry};

use crate::config::DutyPolicy;

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("percent regex must compile")
});

/// Ad-valorem percentage of a duty-rate text.
///
/// "Free" is zero; otherwise the first percentage wins, so compound rates
/// such as "0.4¢/kg + 3%" read as 3. Anything else is unparseable.
pub fn parse_rate(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("free") {
        return Some(0.0);
    }
    PERCENT_RE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Effective duty bounds across `leaves`, including the origin surcharge.
///
/// Leaves with unparseable rates are left out; with none parseable the
/// range is zero with empty codes. Ties keep the earlier leaf.
pub fn duty_range(leaves: &[LeafEntry], country: Option<&str>, policy: &DutyPolicy) -> DutyRange {
    let surcharge = policy.surcharge_for(country);
    let mut range: Option<DutyRange> = None;

    for leaf in leaves {
        let Some(rate) = parse_rate(&leaf.base_duty_rate_text) else {
            continue;
        };
        let effective = rate + surcharge;
        match range.as_mut() {
            None => {
                range = Some(DutyRange {
                    min: effective,
                    max: effective,
                    min_code: leaf.code.clone(),
                    max_code: leaf.code.clone(),
                });
            }
            Some(r) => {
                if effective < r.min {
                    r.min = effective;
                    r.min_code = leaf.code.clone();
                }
                if effective > r.max {
                    r.max = effective;
                    r.max_code = leaf.code.clone();
                }
            }
        }
    }
    range.unwrap_or_default()
}
