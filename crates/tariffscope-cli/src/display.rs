//! Vertical card display for analyses and leaf listings.
//!
//! An analysis renders as a grouped, human-readable card: a summary, the
//! duty range, the open questions with their options, every candidate with
//! its requirements, and the assumptions the engine made.

use tariffscope_core::{
    AmbiguityAnalysis, CandidateResult, DecisionVariable, DetectedSource, LeafEntry, format_code,
};

const MAX_CODES_PER_OPTION: usize = 6;
const MAX_DESCRIPTION: usize = 70;

// ── Public API ──

/// Print one analysis as a vertical card grouped by section.
pub fn print_analysis_card(analysis: &AmbiguityAnalysis) {
    println!("=== {} ===", format_code(&analysis.branch_prefix));
    match &analysis.likely_code {
        Some(code) => println!("likely {} ({}% confidence)", format_code(code), analysis.confidence),
        None => println!("no candidates ({}% confidence)", analysis.confidence),
    }
    println!();

    print_summary(analysis);
    print_duty_range(analysis);
    print_questions(analysis);
    print_candidates(analysis);
    print_assumptions(analysis);
}

/// Print the leaves of a branch, one per line.
pub fn print_leaves(leaves: &[LeafEntry]) {
    if leaves.is_empty() {
        println!("(no leaves)");
        return;
    }
    for leaf in leaves {
        println!(
            "  {:<14} {:<12} {}",
            format_code(&leaf.code),
            rate_or_dash(&leaf.base_duty_rate_text),
            truncate(&leaf.legal_description, MAX_DESCRIPTION)
        );
    }
    println!("{} leaves", leaves.len());
}

// ── Sections ──

fn print_summary(analysis: &AmbiguityAnalysis) {
    println!("Summary");
    println!("  {:<26} {}", "ambiguity", analysis.ambiguity_level.as_str());
    println!("  {:<26} {}", "candidates", analysis.possible_codes.len());
    println!("  {:<26} {}", "decision variables", analysis.decision_variables.len());
    println!("  {:<26} {}", "confirmed", analysis.confirmed_count());
    println!();
}

fn print_duty_range(analysis: &AmbiguityAnalysis) {
    if analysis.possible_codes.is_empty() {
        return;
    }
    let range = &analysis.duty_range;
    println!("Duty Range");
    println!(
        "  {:<26} {}",
        "min",
        rate_with_code(range.min, &range.min_code)
    );
    println!(
        "  {:<26} {}",
        "max",
        rate_with_code(range.max, &range.max_code)
    );
    println!();
}

fn print_questions(analysis: &AmbiguityAnalysis) {
    if analysis.questions_to_ask.is_empty() {
        return;
    }
    println!("Questions");
    for var in analysis.questions() {
        println!("  {} [{}]", var.question, var.id);
        println!("    {:<24} {}", "status", detection_summary(var));
        for option in &var.options {
            let marker = if var.detected_value.as_deref() == Some(option.value.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                "   {marker} {:<24} {}",
                option.value,
                code_list(&option.compatible_codes)
            );
        }
    }
    println!();
}

fn print_candidates(analysis: &AmbiguityAnalysis) {
    if analysis.possible_codes.is_empty() {
        return;
    }
    println!("Candidates");
    for candidate in &analysis.possible_codes {
        println!(
            "  {:<14} {:<10} {:<12} {}",
            format_code(candidate.code()),
            candidate_flag(candidate),
            rate_or_dash(&candidate.leaf.base_duty_rate_text),
            truncate(&candidate.leaf.legal_description, MAX_DESCRIPTION)
        );
        let unmet: Vec<&str> = candidate
            .requirements
            .iter()
            .filter(|r| !r.met)
            .map(|r| r.variable_id.as_str())
            .collect();
        if !unmet.is_empty() {
            println!("      unmet: {}", unmet.join(", "));
        }
    }
    println!();
}

fn print_assumptions(analysis: &AmbiguityAnalysis) {
    if analysis.assumptions.is_empty() {
        return;
    }
    println!("Assumptions");
    for assumption in &analysis.assumptions {
        println!("  {:<26} {}", assumption.variable_name, assumption.assumed_value);
        println!("      {}", assumption.rationale);
    }
    println!();
}

// ── Helpers ──

fn detection_summary(var: &DecisionVariable) -> String {
    match &var.detected_value {
        Some(value) if var.detected_source != DetectedSource::None => format!(
            "{value} ({}, {}%)",
            var.detected_source.as_str(),
            var.confidence
        ),
        _ => "unanswered".to_string(),
    }
}

fn candidate_flag(candidate: &CandidateResult) -> &'static str {
    if candidate.is_confirmed {
        "confirmed"
    } else if candidate.is_likely {
        "likely"
    } else {
        ""
    }
}

fn rate_with_code(rate: f64, code: &str) -> String {
    if code.is_empty() {
        format!("{rate}%")
    } else {
        format!("{rate}%  ({})", format_code(code))
    }
}

fn rate_or_dash(text: &str) -> &str {
    if text.trim().is_empty() { "-" } else { text.trim() }
}

fn code_list(codes: &[String]) -> String {
    let shown: Vec<String> = codes
        .iter()
        .take(MAX_CODES_PER_OPTION)
        .map(|c| format_code(c))
        .collect();
    if codes.len() > MAX_CODES_PER_OPTION {
        format!(
            "{} ... and {} more",
            shown.join(", "),
            codes.len() - MAX_CODES_PER_OPTION
        )
    } else {
        shown.join(", ")
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
