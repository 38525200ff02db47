mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tariffscope_core::{AmbiguityAnalysis, AnalysisRequest, LEAF_CODE_LEN, ProductProfile};
use tariffscope_engine::{AmbiguityEngine, EngineConfig, strategy_by_name};
use tariffscope_store::{
    CandidateSource, DuckSchedule, Memoized, Schedule, Timed, write_assumptions,
};
use tariffscope_sync::ScheduleClient;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tariffscope",
    about = "Find the questions that separate the leaves of a tariff branch",
    version
)]
struct Cli {
    /// Log filter, e.g. "info" or "tariffscope_engine=debug"
    #[arg(long, env = "TARIFFSCOPE_LOG", default_value = "warn", global = true)]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse one product description against a branch
    Analyze(AnalyzeArgs),
    /// Analyse every request in a JSON file against one source
    Batch(BatchArgs),
    /// List the leaves under a branch
    Leaves(LeavesArgs),
    /// Load a Parquet schedule into a DuckDB database
    Load(LoadArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Schedule file: a JSON array of leaves or a Parquet table
    #[arg(long, env = "TARIFFSCOPE_SCHEDULE", conflicts_with_all = ["remote", "duckdb"])]
    schedule: Option<PathBuf>,

    /// Base URL of a schedule lookup service
    #[arg(long, env = "TARIFFSCOPE_SCHEDULE_URL", conflicts_with = "duckdb")]
    remote: Option<String>,

    /// DuckDB database holding a `schedule` table
    #[arg(long, env = "TARIFFSCOPE_DUCKDB")]
    duckdb: Option<PathBuf>,

    /// Upper bound on one remote lookup
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Digits in a leaf code of the schedule file
    #[arg(long, default_value_t = LEAF_CODE_LEN)]
    leaf_len: usize,
}

impl SourceArgs {
    fn open(&self) -> anyhow::Result<Arc<dyn CandidateSource>> {
        if let Some(path) = &self.schedule {
            let schedule = Schedule::open(path)
                .with_context(|| format!("loading schedule {}", path.display()))?
                .with_leaf_len(self.leaf_len);
            info!(path = %path.display(), leaves = schedule.len(), "schedule loaded");
            return Ok(Arc::new(schedule));
        }
        if let Some(url) = &self.remote {
            let client = ScheduleClient::new(url.as_str());
            let timeout = Duration::from_secs(self.timeout_secs);
            return Ok(Arc::new(Timed::new(client, timeout)));
        }
        if let Some(path) = &self.duckdb {
            let db = DuckSchedule::open_persistent(path)
                .with_context(|| format!("opening DuckDB at {}", path.display()))?;
            return Ok(Arc::new(db));
        }
        bail!("no schedule source: pass --schedule, --remote or --duckdb")
    }
}

#[derive(Args)]
struct EngineArgs {
    /// Engine configuration (JSON); defaults apply to absent fields
    #[arg(long, env = "TARIFFSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// How unanswered choices are assumed: most-common or highest-duty
    #[arg(long, default_value = "most-common")]
    strategy: String,
}

impl EngineArgs {
    fn build(&self) -> anyhow::Result<AmbiguityEngine> {
        let config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        let Some(strategy) = strategy_by_name(&self.strategy) else {
            bail!(
                "unknown strategy {:?} (expected most-common or highest-duty)",
                self.strategy
            );
        };
        Ok(AmbiguityEngine::new(config).with_strategy(strategy))
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Print the analysis as JSON instead of a card
    #[arg(long)]
    json: bool,

    /// Write every assumption made to a Parquet audit file
    #[arg(long)]
    assumptions_out: Option<PathBuf>,

    /// Push finished analyses to the audit service at this base URL
    #[arg(long, env = "TARIFFSCOPE_AUDIT_URL")]
    push_audit: Option<String>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    engine: EngineArgs,
    #[command(flatten)]
    output: OutputArgs,

    /// Branch prefix, dotted or plain (e.g. 8211.91)
    #[arg(long)]
    branch: String,

    /// Free-text product description
    #[arg(long, required_unless_present = "profile")]
    text: Option<String>,

    /// Product profile JSON file in place of --text
    #[arg(long, conflicts_with = "text")]
    profile: Option<PathBuf>,

    #[arg(long)]
    material: Option<String>,

    /// Unit value or measurement stated for the product
    #[arg(long)]
    value: Option<f64>,

    /// Basis of --value, e.g. "each", "per dozen", "cm"
    #[arg(long, requires = "value")]
    unit: Option<String>,

    /// ISO 3166 alpha-2 country of origin
    #[arg(long)]
    country: Option<String>,

    /// Earlier answer as variable_id=value; repeatable
    #[arg(long = "answer", value_parser = parse_answer)]
    answers: Vec<(String, String)>,
}

impl AnalyzeArgs {
    fn request(&self) -> anyhow::Result<AnalysisRequest> {
        let mut request = match (&self.profile, &self.text) {
            (Some(path), _) => read_profile(path)?.into_request(&self.branch),
            (None, Some(text)) => AnalysisRequest::new(&self.branch, text.as_str()),
            (None, None) => bail!("either --text or --profile is required"),
        };
        if let Some(material) = &self.material {
            request.explicit_material = Some(material.clone());
        }
        if let Some(value) = self.value {
            request = request.with_numeric_value(value, self.unit.as_deref());
        }
        if let Some(country) = &self.country {
            request = request.with_country(country.to_ascii_uppercase());
        }
        for (id, value) in &self.answers {
            request = request.with_answer(id.as_str(), value.as_str());
        }
        Ok(request)
    }
}

#[derive(Args)]
struct BatchArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    engine: EngineArgs,
    #[command(flatten)]
    output: OutputArgs,

    /// JSON array of `{"branch", "profile", "answers"}` items
    #[arg(long)]
    requests: PathBuf,
}

/// One entry of a batch file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchItem {
    branch: String,
    profile: ProductProfile,
    #[serde(default)]
    answers: Vec<(String, String)>,
}

#[derive(Args)]
struct LeavesArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long)]
    branch: String,
}

#[derive(Args)]
struct LoadArgs {
    /// Parquet file with code, description and duty_rate columns
    #[arg(long)]
    parquet: PathBuf,

    /// DuckDB database to create or replace the `schedule` table in
    #[arg(long, env = "TARIFFSCOPE_DUCKDB")]
    duckdb: PathBuf,
}

fn parse_answer(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() && !value.trim().is_empty() => {
            Ok((id.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected variable_id=value, got {s:?}")),
    }
}

fn read_profile(path: &Path) -> anyhow::Result<ProductProfile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading profile {}", path.display()))?;
    ProductProfile::from_json(&json).with_context(|| format!("invalid profile {}", path.display()))
}

fn read_batch(path: &Path) -> anyhow::Result<Vec<AnalysisRequest>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading batch {}", path.display()))?;
    let items: Vec<BatchItem> =
        serde_json::from_str(&json).with_context(|| format!("parsing batch {}", path.display()))?;

    let mut requests = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        item.profile
            .validate()
            .with_context(|| format!("batch item {i}"))?;
        let mut request = item.profile.into_request(&item.branch);
        for (id, value) in item.answers {
            request = request.with_answer(id, value);
        }
        requests.push(request);
    }
    Ok(requests)
}

/// Print finished analyses, then record or push them as the output flags ask.
async fn emit(output: &OutputArgs, analyses: &[AmbiguityAnalysis]) -> anyhow::Result<()> {
    for analysis in analyses {
        if output.json {
            println!("{}", serde_json::to_string_pretty(analysis)?);
        } else {
            display::print_analysis_card(analysis);
        }
    }

    if let Some(path) = &output.assumptions_out {
        let rows = write_assumptions(path, analyses)
            .with_context(|| format!("writing assumptions to {}", path.display()))?;
        info!(path = %path.display(), rows, "assumptions recorded");
    }

    if let Some(url) = &output.push_audit
        && !analyses.is_empty()
    {
        let accepted = ScheduleClient::new(url.as_str())
            .push_analyses(analyses)
            .await
            .context("pushing analyses to audit service")?;
        info!(accepted, "audit push complete");
    }
    Ok(())
}

async fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let engine = args.engine.build()?;
    let source = args.source.open()?;
    let request = args.request()?;

    let analysis = engine
        .analyze_branch(source.as_ref(), &request)
        .await
        .with_context(|| format!("analysing branch {}", args.branch))?;
    emit(&args.output, std::slice::from_ref(&analysis)).await
}

async fn run_batch(args: BatchArgs) -> anyhow::Result<()> {
    let engine = args.engine.build()?;
    let source = Memoized::new(args.source.open()?);
    let requests = read_batch(&args.requests)?;
    info!(requests = requests.len(), strategy = engine.strategy_name(), "running batch");

    let mut analyses = Vec::with_capacity(requests.len());
    let mut failed = 0usize;
    let results = engine.analyze_branches(&source, &requests).await;
    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(analysis) => analyses.push(analysis),
            Err(e) => {
                warn!(branch = %request.branch_prefix, error = %e, "analysis failed");
                failed += 1;
            }
        }
    }
    info!(branches = source.cached_branches().await, "distinct branches fetched");

    emit(&args.output, &analyses).await?;
    if failed > 0 {
        bail!("{failed} of {} analyses failed", requests.len());
    }
    Ok(())
}

async fn run_leaves(args: LeavesArgs) -> anyhow::Result<()> {
    let source = args.source.open()?;
    let leaves = source
        .fetch_leaves_under_branch(&args.branch)
        .await
        .with_context(|| format!("looking up branch {}", args.branch))?;
    display::print_leaves(&leaves);
    Ok(())
}

fn run_load(args: LoadArgs) -> anyhow::Result<()> {
    let db = DuckSchedule::open_persistent(&args.duckdb)
        .with_context(|| format!("opening DuckDB at {}", args.duckdb.display()))?;
    let rows = db
        .load_parquet(&args.parquet)
        .with_context(|| format!("loading {}", args.parquet.display()))?;
    println!("Loaded {rows} schedule rows into {}", args.duckdb.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    info!("tariffscope v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Analyze(args) => run_analyze(args).await,
        Command::Batch(args) => run_batch(args).await,
        Command::Leaves(args) => run_leaves(args).await,
        Command::Load(args) => run_load(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn answers_parse_as_pairs() {
        assert_eq!(
            parse_answer("blade=fixed_blade").unwrap(),
            ("blade".to_string(), "fixed_blade".to_string())
        );
        assert_eq!(parse_answer(" plating = other ").unwrap().1, "other");
        assert!(parse_answer("blade").is_err());
        assert!(parse_answer("=other").is_err());
    }

    #[test]
    fn analyze_flags_build_request() {
        let cli = Cli::try_parse_from([
            "tariffscope",
            "analyze",
            "--schedule",
            "leaves.json",
            "--branch",
            "8211.91",
            "--text",
            "Steak knife",
            "--value",
            "4.5",
            "--unit",
            "each",
            "--country",
            "cn",
            "--answer",
            "blade=fixed_blade",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let request = args.request().unwrap();
        assert_eq!(request.branch_prefix, "821191");
        assert_eq!(request.explicit_numeric_value, Some(4.5));
        assert_eq!(request.explicit_numeric_unit.as_deref(), Some("each"));
        assert_eq!(request.country_of_origin.as_deref(), Some("CN"));
        assert_eq!(request.previous_answers["blade"], "fixed_blade");
    }

    #[test]
    fn text_or_profile_is_required() {
        let result = Cli::try_parse_from([
            "tariffscope",
            "analyze",
            "--schedule",
            "leaves.json",
            "--branch",
            "8211",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn sources_are_exclusive() {
        let result = Cli::try_parse_from([
            "tariffscope",
            "leaves",
            "--schedule",
            "leaves.json",
            "--remote",
            "http://localhost:4000",
            "--branch",
            "8211",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let args = EngineArgs {
            config: None,
            strategy: "cheapest".into(),
        };
        assert!(args.build().is_err());
    }

    #[test]
    fn batch_file_builds_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(
            &path,
            r#"[
                {"branch": "8211", "profile": {"description": "pocket knife", "country_of_origin": "cn"}},
                {"branch": "6702.90", "profile": {"description": "silk roses", "unit_value": 0.75, "value_unit": "per dozen"},
                 "answers": [["value_threshold_0_60_per_dozen", "over"]]}
            ]"#,
        )
        .unwrap();

        let requests = read_batch(&path).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].country_of_origin.as_deref(), Some("CN"));
        assert_eq!(requests[1].branch_prefix, "670290");
        assert_eq!(requests[1].previous_answers.len(), 1);
    }
}
