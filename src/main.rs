use anyhow::bail;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use stattwin::input::{read_config, read_records};
use stattwin::prelude::*;
use stattwin_similarity::DEFAULT_BOOST;

/// Find statistically similar player-seasons
#[derive(Parser, Debug)]
#[command(name = "stattwin")]
#[command(about = "Find statistically similar player-seasons", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preprocess records and print the report
    Preprocess {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Rank the players most similar to one record or vector
    Similar {
        #[command(flatten)]
        input: InputArgs,

        /// Query player identifier
        #[arg(long, conflicts_with = "vector")]
        id: Option<String>,

        /// Narrow the query record to a league
        #[arg(long, requires = "id")]
        league: Option<String>,

        /// Narrow the query record to a season
        #[arg(long, requires = "id")]
        season: Option<String>,

        /// Query by feature vector (comma separated, in feature order)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        vector: Option<Vec<f32>>,

        /// Position of a vector query, e.g. "FW,MF"
        #[arg(long, requires = "vector")]
        position: Option<String>,

        #[command(flatten)]
        query: QueryArgs,
    },
    /// Rank every record against the table
    RankAll {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Records file (JSON array or JSON lines)
    #[arg(short, long)]
    input: PathBuf,

    /// Preprocessing config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct QueryArgs {
    /// Similarity metric: cosine or euclidean
    #[arg(long, default_value = "cosine", value_parser = Metric::from_str)]
    metric: Metric,

    /// Number of results per query
    #[arg(short = 'k', long, default_value_t = 10)]
    top_k: usize,

    /// Role to emphasize (FW, MF, DF, GK, ... or from_query)
    #[arg(long, value_parser = RoleChoice::from_str)]
    role: Option<RoleChoice>,

    /// Weight multiplier for role features
    #[arg(long, default_value_t = DEFAULT_BOOST)]
    boost: f32,

    /// Explicit feature weight, e.g. --weight shots_per90_z=2 (repeatable)
    #[arg(long = "weight", value_parser = parse_weight)]
    weights: Vec<(String, f32)>,

    /// Keep only candidates sharing a position with the query
    #[arg(long)]
    restrict_positions: bool,

    /// Feature columns to compare (default: every normalized column)
    #[arg(long, value_delimiter = ',')]
    features: Option<Vec<String>>,

    #[arg(long)]
    min_age: Option<u32>,

    #[arg(long)]
    max_age: Option<u32>,

    #[arg(long)]
    min_minutes: Option<f64>,

    #[arg(long)]
    max_minutes: Option<f64>,

    #[arg(long, value_delimiter = ',')]
    leagues: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    continents: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    seasons: Vec<String>,

    /// Candidate positions (FW, MF, DF, GK, ...)
    #[arg(long, value_delimiter = ',', value_parser = PositionTag::from_str)]
    positions: Vec<PositionTag>,

    /// Columns attached to each hit
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Include per-feature contributions
    #[arg(long)]
    explain: bool,
}

fn parse_weight(s: &str) -> std::result::Result<(String, f32), String> {
    let (name, weight) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FEATURE=WEIGHT, got '{}'", s))?;
    let weight = weight
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid weight '{}': {}", weight, e))?;
    Ok((name.trim().to_string(), weight))
}

impl QueryArgs {
    fn apply(&self, query: SimilarityQuery) -> SimilarityQuery {
        let mut weights = if self.weights.is_empty() {
            WeightSpec::default()
        } else {
            WeightSpec::explicit(self.weights.iter().cloned())
        };
        weights.role = self.role;
        weights.boost = self.boost;

        let mut filters = FilterSpec::new();
        if self.min_age.is_some() || self.max_age.is_some() {
            filters = filters.age_range(self.min_age, self.max_age);
        }
        if self.min_minutes.is_some() || self.max_minutes.is_some() {
            filters = filters.minutes_range(self.min_minutes, self.max_minutes);
        }
        if !self.leagues.is_empty() {
            filters = filters.league_in(self.leagues.iter().cloned());
        }
        if !self.continents.is_empty() {
            filters = filters.continent_in(self.continents.iter().cloned());
        }
        if !self.seasons.is_empty() {
            filters = filters.season_in(self.seasons.iter().cloned());
        }
        if !self.positions.is_empty() {
            filters = filters.position_in(&self.positions);
        }

        let mut query = query
            .with_metric(self.metric)
            .with_top_k(self.top_k)
            .with_weights(weights)
            .with_filters(filters)
            .restrict_positions(self.restrict_positions)
            .with_explain(self.explain);
        if let Some(features) = &self.features {
            query = query.with_features(features.iter().cloned());
        }
        if let Some(columns) = &self.columns {
            query = query.with_return_columns(columns.iter().cloned());
        }
        query
    }
}

fn load(input: &InputArgs) -> anyhow::Result<(NormalizedFeatureTable, PreprocessReport)> {
    let records = read_records(&input.input)?;
    let cfg = match &input.config {
        Some(path) => read_config(path)?,
        None => PreprocessConfig::default(),
    };
    let (table, report) = preprocess(records, &cfg)?;
    info!(
        rows = table.len(),
        features = table.normalized_columns().len(),
        "table loaded"
    );
    Ok((table, report))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting StatTwin v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Preprocess { input } => {
            let (_, report) = load(&input)?;
            if report.has_degradations() {
                warn!(
                    duplicates = report.duplicates_collapsed,
                    dropped = report.dropped_rows.total(),
                    skipped = report.skipped.len(),
                    "values were substituted, clipped, dropped or skipped"
                );
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Similar {
            input,
            id,
            league,
            season,
            vector,
            position,
            query,
        } => {
            let target = match (id, vector) {
                (Some(id), _) => SimilarityQuery::by_id(id).narrowed(league.as_deref(), season.as_deref()),
                (None, Some(vector)) => SimilarityQuery::by_vector(vector, position.as_deref()),
                (None, None) => bail!("provide --id or --vector"),
            };
            let (table, _) = load(&input)?;
            let result = similar_to_query(&table, &query.apply(target))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::RankAll { input, query } => {
            let (table, _) = load(&input)?;
            // the template's own target is ignored
            let template = query.apply(SimilarityQuery::by_id(String::new()));
            let results = rank_all_against_all(&table, &template)?;
            let keyed: BTreeMap<String, &SimilarityResult> =
                results.iter().map(|(k, v)| (k.to_string(), v)).collect();
            println!("{}", serde_json::to_string_pretty(&keyed)?);
        }
    }

    Ok(())
}
