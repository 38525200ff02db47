//! The analysis pipeline.
//!
//! Extraction, categorisation, variable building, input matching, scoring,
//! duty, and confidence run in that order over one leaf set. Every stage is
//! a pure function of its inputs; the engine holds only configuration.

use futures::future::join_all;
use tariffscope_core::{
    AmbiguityAnalysis, AmbiguityLevel, AnalysisRequest, CandidateResult, DutyRange, LeafEntry,
};
use tariffscope_store::CandidateSource;
use tracing::{debug, info, instrument};

use crate::config::EngineConfig;
use crate::matcher::{DefaultStrategy, InputMatcher, MostCommon};
use crate::{EngineError, builder, confidence, differentiator, duty, scorer, threshold};

pub struct AmbiguityEngine {
    config: EngineConfig,
    strategy: Box<dyn DefaultStrategy>,
}

impl Default for AmbiguityEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AmbiguityEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            strategy: Box::new(MostCommon),
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn DefaultStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Analyse a leaf set already fetched for `request.branch_prefix`.
    ///
    /// Deterministic: the same leaves and request always produce the same
    /// analysis.
    pub fn analyze(&self, leaves: &[LeafEntry], request: &AnalysisRequest) -> AmbiguityAnalysis {
        let analysis = if leaves.len() <= 1 {
            self.trivial(leaves, request)
        } else {
            self.full(leaves, request)
        };
        info!(
            branch = %analysis.branch_prefix,
            leaves = leaves.len(),
            variables = analysis.decision_variables.len(),
            questions = analysis.questions_to_ask.len(),
            level = analysis.ambiguity_level.as_str(),
            likely = analysis.likely_code.as_deref().unwrap_or("-"),
            confidence = analysis.confidence,
            "analysis complete"
        );
        analysis
    }

    /// Fetch the leaves under the request's branch and analyse them.
    #[instrument(skip_all, fields(branch = %request.branch_prefix))]
    pub async fn analyze_branch<S>(
        &self,
        source: &S,
        request: &AnalysisRequest,
    ) -> Result<AmbiguityAnalysis, EngineError>
    where
        S: CandidateSource + ?Sized,
    {
        let leaves = source.fetch_leaves_under_branch(&request.branch_prefix).await?;
        debug!(leaves = leaves.len(), "fetched candidate leaves");
        Ok(self.analyze(&leaves, request))
    }

    /// Analyse several requests concurrently against one source.
    ///
    /// Results come back in request order; one failed lookup does not
    /// affect the others.
    pub async fn analyze_branches<S>(
        &self,
        source: &S,
        requests: &[AnalysisRequest],
    ) -> Vec<Result<AmbiguityAnalysis, EngineError>>
    where
        S: CandidateSource + ?Sized,
    {
        join_all(requests.iter().map(|r| self.analyze_branch(source, r))).await
    }

    /// Zero or one leaf: nothing to ask.
    fn trivial(&self, leaves: &[LeafEntry], request: &AnalysisRequest) -> AmbiguityAnalysis {
        let policy = &self.config.confidence;
        let possible_codes: Vec<CandidateResult> = leaves
            .iter()
            .map(|leaf| CandidateResult {
                leaf: leaf.clone(),
                requirements: vec![],
                is_likely: true,
                is_confirmed: true,
            })
            .collect();
        let (likely_code, confidence, duty_range) = match leaves.first() {
            Some(leaf) => (
                Some(leaf.code.clone()),
                policy.single_leaf,
                duty::duty_range(leaves, request.country_of_origin.as_deref(), &self.config.duty),
            ),
            None => (None, policy.empty_branch, DutyRange::default()),
        };

        AmbiguityAnalysis {
            branch_prefix: request.branch_prefix.clone(),
            is_ambiguous: false,
            ambiguity_level: AmbiguityLevel::None,
            possible_codes,
            decision_variables: vec![],
            questions_to_ask: vec![],
            likely_code,
            duty_range,
            assumptions: vec![],
            confidence,
        }
    }

    fn full(&self, leaves: &[LeafEntry], request: &AnalysisRequest) -> AmbiguityAnalysis {
        let phrases = differentiator::extract(leaves);
        let thresholds = threshold::detect(leaves);
        let mut variables = builder::build_variables(
            &phrases,
            leaves,
            &thresholds.dimensions,
            self.config.max_options,
        );
        variables.extend(thresholds.variables);

        let matcher = InputMatcher::new(&self.config.confidence, self.strategy.as_ref());
        let assumptions = matcher.apply(&mut variables, request, leaves);

        let possible_codes = scorer::score_candidates(leaves, &variables);
        let questions_to_ask = scorer::questions_to_ask(&variables);
        let ambiguity_level = scorer::ambiguity_level(
            leaves.len(),
            &possible_codes,
            &variables,
            &questions_to_ask,
            &self.config.confidence,
        );
        let likely_code = scorer::likely_code(&possible_codes);
        let duty_range = duty::duty_range(
            leaves,
            request.country_of_origin.as_deref(),
            &self.config.duty,
        );
        let confidence = confidence::aggregate(
            &possible_codes,
            likely_code.as_deref(),
            &variables,
            &self.config.confidence,
        );

        AmbiguityAnalysis {
            branch_prefix: request.branch_prefix.clone(),
            is_ambiguous: ambiguity_level != AmbiguityLevel::None,
            ambiguity_level,
            possible_codes,
            decision_variables: variables,
            questions_to_ask,
            likely_code,
            duty_range,
            assumptions,
            confidence,
        }
    }
}
