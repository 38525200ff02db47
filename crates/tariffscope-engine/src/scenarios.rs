//! End-to-end analyses over realistic schedule branches.

use async_trait::async_trait;
use tariffscope_core::{
    AmbiguityAnalysis, AmbiguityLevel, AnalysisRequest, DetectedSource, LeafEntry, RESIDUAL_VALUE,
    VariableKind,
};
use tariffscope_store::{CandidateSource, StoreError};

use crate::{AmbiguityEngine, EngineError};

fn analyze(leaves: &[LeafEntry], request: &AnalysisRequest) -> AmbiguityAnalysis {
    AmbiguityEngine::default().analyze(leaves, request)
}

/// Every variable covers every leaf, and every leaf carries one requirement
/// per variable.
fn assert_structural(analysis: &AmbiguityAnalysis) {
    for var in &analysis.decision_variables {
        for candidate in &analysis.possible_codes {
            assert!(
                var.options_for(candidate.code()).next().is_some(),
                "{} not covered by {}",
                candidate.code(),
                var.id
            );
        }
    }
    for candidate in &analysis.possible_codes {
        assert_eq!(
            candidate.requirements.len(),
            analysis.decision_variables.len()
        );
        if candidate.is_confirmed {
            assert!(candidate.is_likely);
        }
    }
    assert!(analysis.confirmed_count() <= 1);
    assert!(analysis.duty_range.min <= analysis.duty_range.max);
    assert!(analysis.confidence <= 100);
    assert_eq!(
        analysis.is_ambiguous,
        analysis.ambiguity_level != AmbiguityLevel::None
    );
}

fn knives() -> Vec<LeafEntry> {
    vec![
        LeafEntry::new("8211.92.20.00", "Knives having fixed blades", "4%"),
        LeafEntry::new("8211.93.00.00", "Knives having folding blades", "3%"),
        LeafEntry::new("8211.94.10.00", "Knives, other", "Free"),
    ]
}

#[test]
fn blade_branch_has_one_variable_with_residual() {
    let analysis = analyze(&knives(), &AnalysisRequest::new("8211", "kitchen knife"));
    assert_structural(&analysis);
    assert_eq!(analysis.decision_variables.len(), 1);

    let blade = analysis.variable("blade").unwrap();
    let labels: Vec<_> = blade.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["fixed blade", "folding blade", "Other/Standard"]);
    assert_eq!(blade.options[2].value, RESIDUAL_VALUE);
    assert_eq!(blade.options[2].compatible_codes, vec!["8211941000"]);
}

#[test]
fn pocket_knife_is_inferred_and_low() {
    let analysis = analyze(&knives(), &AnalysisRequest::new("8211", "Vintage pocket knife"));
    assert_structural(&analysis);
    let blade = analysis.variable("blade").unwrap();
    assert_eq!(blade.detected_value.as_deref(), Some("folding_blade"));
    assert_eq!(blade.detected_source, DetectedSource::Inferred);
    assert_eq!(analysis.ambiguity_level, AmbiguityLevel::Low);
    assert_eq!(analysis.likely_code.as_deref(), Some("8211930000"));
    assert!(analysis.assumptions.is_empty());
}

fn flowers() -> Vec<LeafEntry> {
    vec![
        LeafEntry::new(
            "6702.90.40.00",
            "Artificial flowers, not over $0.60 per dozen",
            "Free",
        ),
        LeafEntry::new("6702.90.65.00", "Artificial flowers, over $0.60 per dozen", "17%"),
    ]
}

#[test]
fn value_threshold_resolved_by_explicit_number() {
    let request =
        AnalysisRequest::new("670290", "silk roses").with_numeric_value(0.75, Some("per dozen"));
    let analysis = analyze(&flowers(), &request);
    assert_structural(&analysis);

    assert_eq!(analysis.decision_variables.len(), 1);
    let var = &analysis.decision_variables[0];
    assert_eq!(var.kind, VariableKind::NumericBracket);
    assert_eq!(var.detected_value.as_deref(), Some("over"));
    assert_eq!(var.detected_source, DetectedSource::Stated);
    assert_eq!(var.confidence, 95);

    let confirmed: Vec<_> = analysis
        .possible_codes
        .iter()
        .filter(|c| c.is_confirmed)
        .map(|c| c.code())
        .collect();
    assert_eq!(confirmed, vec!["6702906500"]);
    assert_eq!(analysis.ambiguity_level, AmbiguityLevel::None);
    assert_eq!(analysis.confidence, 98);
    assert_eq!(analysis.duty_range.max, 17.0);
}

#[test]
fn value_threshold_without_number_stays_open() {
    let analysis = analyze(&flowers(), &AnalysisRequest::new("670290", "silk roses"));
    assert_structural(&analysis);
    let var = &analysis.decision_variables[0];
    assert_eq!(var.detected_source, DetectedSource::None);
    assert_eq!(analysis.questions_to_ask, vec![var.id.clone()]);
    assert!(analysis.assumptions.is_empty());
    assert_eq!(analysis.ambiguity_level, AmbiguityLevel::Medium);
    assert_eq!(analysis.likely_code.as_deref(), Some("6702904000"));
    assert_eq!(analysis.confidence, 50);
}

#[test]
fn leaf_without_threshold_is_not_confirmed_by_a_number() {
    let mut leaves = flowers();
    leaves.push(LeafEntry::new(
        "6702.90.90.00",
        "Artificial flowers, of plastics",
        "8%",
    ));
    let request =
        AnalysisRequest::new("670290", "silk roses").with_numeric_value(0.75, Some("per dozen"));
    let analysis = analyze(&leaves, &request);
    assert_structural(&analysis);

    let var = analysis
        .decision_variables
        .iter()
        .find(|v| v.kind == VariableKind::NumericBracket)
        .unwrap();
    assert_eq!(var.detected_value.as_deref(), Some("over"));
    assert!(var.options.iter().any(|o| o.is_residual
        && o.compatible_codes == vec!["6702909000".to_string()]));

    let confirmed: Vec<_> = analysis
        .possible_codes
        .iter()
        .filter(|c| c.is_confirmed)
        .map(|c| c.code())
        .collect();
    assert_eq!(confirmed, vec!["6702906500"]);
    let plastics = analysis
        .possible_codes
        .iter()
        .find(|c| c.code() == "6702909000")
        .unwrap();
    assert!(!plastics.is_likely);
}

#[test]
fn threshold_value_lands_on_the_inclusive_side() {
    let leaves = vec![
        LeafEntry::new("9102.11.00.10", "Watches, valued under $5 each", "Free"),
        LeafEntry::new("9102.11.00.20", "Watches, valued at least $5 each", "6%"),
    ];
    let request = AnalysisRequest::new("910211", "wrist watch").with_numeric_value(5.0, Some("each"));
    let analysis = analyze(&leaves, &request);
    assert_structural(&analysis);

    let confirmed: Vec<_> = analysis
        .possible_codes
        .iter()
        .filter(|c| c.is_confirmed)
        .map(|c| c.code())
        .collect();
    assert_eq!(confirmed, vec!["9102110020"]);
    assert_eq!(analysis.likely_code.as_deref(), Some("9102110020"));
}

/// Table knives split by plating, handle material, and blade material.
fn table_knives() -> Vec<LeafEntry> {
    let mut leaves = Vec::new();
    for n in 0..8u8 {
        let mut description = String::from("Table knives");
        if n & 4 != 0 {
            description.push_str(", silver-plated");
        }
        if n & 2 != 0 {
            description.push_str(", with handles of wood");
        }
        if n & 1 != 0 {
            description.push_str(", with blades of stainless steel");
        }
        let rate = format!("{}%", 1 + n);
        leaves.push(LeafEntry::new(
            format!("82119100{}0", n + 1),
            description,
            rate,
        ));
    }
    leaves
}

#[test]
fn handle_stated_others_assumed_is_high() {
    let analysis = analyze(
        &table_knives(),
        &AnalysisRequest::new("82119100", "Table knife with handles of wood"),
    );
    assert_structural(&analysis);

    let ids: Vec<_> = analysis
        .decision_variables
        .iter()
        .map(|v| v.id.as_str())
        .collect();
    assert_eq!(ids, vec!["handle", "blade", "plating"]);

    let handle = analysis.variable("handle").unwrap();
    assert_eq!(handle.detected_value.as_deref(), Some("handle_of_wood"));
    assert_eq!(handle.detected_source, DetectedSource::Stated);
    assert_eq!(handle.confidence, 90);

    for id in ["blade", "plating"] {
        let var = analysis.variable(id).unwrap();
        assert_eq!(var.detected_source, DetectedSource::Assumed);
        assert!(analysis.questions_to_ask.iter().any(|q| q == id));
    }
    assert_eq!(analysis.assumptions.len(), 2);
    assert_eq!(analysis.ambiguity_level, AmbiguityLevel::High);
    assert_eq!(analysis.confirmed_count(), 0);
    assert_eq!(analysis.likely_code.as_deref(), Some("8211910080"));
    // (90 + 40 + 40) / 3 - 2 * 10
    assert_eq!(analysis.confidence, 37);
}

#[test]
fn answers_confirm_exactly_one_leaf() {
    let request = AnalysisRequest::new("82119100", "Table knife with handles of wood")
        .with_answer("blade", "blade_of_stainless_steel")
        .with_answer("plating", RESIDUAL_VALUE);
    let analysis = analyze(&table_knives(), &request);
    assert_structural(&analysis);

    assert_eq!(analysis.ambiguity_level, AmbiguityLevel::None);
    assert_eq!(analysis.confirmed_count(), 1);
    let confirmed = analysis.possible_codes.iter().find(|c| c.is_confirmed).unwrap();
    assert_eq!(confirmed.code(), "8211910040");
    assert_eq!(analysis.likely_code.as_deref(), Some("8211910040"));
    assert_eq!(analysis.confidence, 98);
    assert!(analysis.assumptions.is_empty());
    // Answered questions stay listed; only their status changed.
    assert_eq!(analysis.questions_to_ask.len(), 3);
}

#[test]
fn one_assumption_left_is_medium() {
    let request = AnalysisRequest::new("82119100", "Table knife with handles of wood")
        .with_answer("blade", "blade_of_stainless_steel");
    let analysis = analyze(&table_knives(), &request);
    assert_structural(&analysis);
    assert_eq!(analysis.ambiguity_level, AmbiguityLevel::Medium);
    assert_eq!(analysis.assumptions.len(), 1);
    assert_eq!(analysis.assumptions[0].variable_id, "plating");
}

#[test]
fn synonym_for_last_attribute_is_low() {
    let request = AnalysisRequest::new("82119100", "Table knife with handles of wood, inox blade")
        .with_answer("plating", RESIDUAL_VALUE);
    let analysis = analyze(&table_knives(), &request);
    assert_structural(&analysis);

    let blade = analysis.variable("blade").unwrap();
    assert_eq!(blade.detected_source, DetectedSource::Inferred);
    assert_eq!(blade.confidence, 80);
    assert_eq!(analysis.ambiguity_level, AmbiguityLevel::Low);
    assert_eq!(analysis.likely_code.as_deref(), Some("8211910040"));
}

#[test]
fn knitted_shirts_by_wearer_and_fiber() {
    let leaves = vec![
        LeafEntry::new(
            "6105.10.00.10",
            "Men's or boys' shirts, knitted or crocheted, of cotton",
            "19.7%",
        ),
        LeafEntry::new(
            "6105.20.20.10",
            "Men's or boys' shirts, knitted or crocheted, of man-made fibers",
            "32%",
        ),
        LeafEntry::new(
            "6106.10.00.10",
            "Women's or girls' blouses and shirts, knitted or crocheted, of cotton",
            "19.7%",
        ),
        LeafEntry::new(
            "6106.20.20.10",
            "Women's or girls' blouses and shirts, knitted or crocheted, of man-made fibers",
            "32%",
        ),
    ];
    let request = AnalysisRequest::new("610", "Ladies cotton polo").with_country("CN");
    let analysis = analyze(&leaves, &request);
    assert_structural(&analysis);

    let ids: Vec<_> = analysis
        .decision_variables
        .iter()
        .map(|v| v.id.as_str())
        .collect();
    assert_eq!(ids, vec!["demographic", "material"]);

    let wearer = analysis.variable("demographic").unwrap();
    assert_eq!(wearer.detected_value.as_deref(), Some("women_s_or_girls"));
    assert_eq!(wearer.detected_source, DetectedSource::Inferred);
    let material = analysis.variable("material").unwrap();
    assert_eq!(material.detected_value.as_deref(), Some("cotton"));
    assert_eq!(material.detected_source, DetectedSource::Stated);

    assert_eq!(analysis.ambiguity_level, AmbiguityLevel::Low);
    assert_eq!(analysis.likely_code.as_deref(), Some("6106100010"));
    assert!((analysis.duty_range.min - 44.7).abs() < 1e-9);
    assert_eq!(analysis.duty_range.max, 57.0);
}

#[test]
fn repeated_analysis_is_identical() {
    let request = AnalysisRequest::new("82119100", "Table knife with handles of wood")
        .with_country("US")
        .with_answer("plating", "silver_plated");
    let engine = AmbiguityEngine::default();
    let first = serde_json::to_string(&engine.analyze(&table_knives(), &request)).unwrap();
    let second = serde_json::to_string(&engine.analyze(&table_knives(), &request)).unwrap();
    assert_eq!(first, second);
}

struct Unreachable;

#[async_trait]
impl CandidateSource for Unreachable {
    async fn fetch_leaves_under_branch(
        &self,
        branch_prefix: &str,
    ) -> Result<Vec<LeafEntry>, StoreError> {
        Err(StoreError::Upstream {
            branch: branch_prefix.to_string(),
            message: "connection refused".into(),
        })
    }
}

#[tokio::test]
async fn lookup_failure_surfaces_as_error() {
    let result = AmbiguityEngine::default()
        .analyze_branch(&Unreachable, &AnalysisRequest::new("8211", "knife"))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Lookup(StoreError::Upstream { .. }))
    ));
}
