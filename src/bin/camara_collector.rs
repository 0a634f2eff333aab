//! Chamber of Deputies harvester CLI
//!
//! # Usage
//!
//! ```bash
//! # Full harvest into dados_camara/
//! camara-collector collect --mode full
//!
//! # Connectivity check: parties, 10 deputies, 5 fronts
//! camara-collector collect --mode smoke --output /tmp/camara
//!
//! # Run the graph analyses over harvested JSON (in-memory graph)
//! camara-collector analyze --input dados_camara
//!
//! # Load harvested JSON into Neo4j (feature `neo4j`, NEO4J_URI / NEO4J_USER / NEO4J_PASSWORD)
//! camara-collector load --input dados_camara --clear
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use camara_collector::graph::{analyze, AnalysisReport, GraphLoader, LoadInput, MemoryGraph};
#[cfg(feature = "neo4j")]
use camara_collector::graph::{GraphStore, Neo4jGraph};
use camara_collector::harvest::{RunMode, RunOptions, DEFAULT_RUN_PROPOSALS, DEFAULT_RUN_VOTINGS};
use camara_collector::{CamaraClient, CollectorConfig, EntityCollector, Harvester, JsonFileSink};

#[derive(Parser)]
#[command(name = "camara-collector")]
#[command(version)]
#[command(about = "Harvest Chamber of Deputies open data and load it into a graph")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file
    #[arg(long, short = 'c', global = true, env = "CAMARA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect datasets from the open-data API
    Collect {
        #[arg(long, short = 'm', value_enum, default_value = "full")]
        mode: RunMode,

        /// Output directory (overrides the configuration)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_RUN_PROPOSALS)]
        max_proposals: usize,

        #[arg(long, default_value_t = DEFAULT_RUN_VOTINGS)]
        max_votings: usize,

        /// Keep only fronts of this legislature
        #[arg(long)]
        legislature: Option<i64>,

        /// Also collect committee membership
        #[arg(long)]
        body_members: bool,
    },

    /// Load harvested JSON into a graph and print the analyses
    Analyze {
        #[arg(long, short = 'i', default_value = "dados_camara")]
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Analyze the Neo4j graph instead of loading the JSON in memory
        #[cfg(feature = "neo4j")]
        #[arg(long)]
        neo4j: bool,
    },

    /// Load harvested JSON into Neo4j
    #[cfg(feature = "neo4j")]
    Load {
        #[arg(long, short = 'i', default_value = "dados_camara")]
        input: PathBuf,

        /// Delete everything in the database first
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CollectorConfig::load(path)?,
        None => CollectorConfig::default(),
    };

    match cli.command {
        Commands::Collect {
            mode,
            output,
            max_proposals,
            max_votings,
            legislature,
            body_members,
        } => {
            let options = RunOptions {
                max_proposals,
                max_votings,
                legislature,
                body_members,
                ..RunOptions::full()
            };
            cmd_collect(config, mode, output, options).await
        }
        #[cfg(feature = "neo4j")]
        Commands::Analyze { input, json, neo4j } => {
            if neo4j {
                let graph = connect_neo4j().await?;
                let report = analyze(&graph).await?;
                print_report(&report, json)
            } else {
                cmd_analyze(input, json).await
            }
        }
        #[cfg(not(feature = "neo4j"))]
        Commands::Analyze { input, json } => cmd_analyze(input, json).await,
        #[cfg(feature = "neo4j")]
        Commands::Load { input, clear } => cmd_load(input, clear).await,
    }
}

async fn cmd_collect(
    config: CollectorConfig,
    mode: RunMode,
    output: Option<PathBuf>,
    options: RunOptions,
) -> Result<()> {
    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let client = Arc::new(CamaraClient::new(&config)?);
    let collector = EntityCollector::new(client, config.date_range()?);
    let sink = Arc::new(
        JsonFileSink::new(&output)
            .with_context(|| format!("Failed to prepare {}", output.display()))?,
    );

    let harvest = Harvester::new(collector, sink).run_mode(mode, options).await;

    println!();
    println!("Harvest summary ({})", output.display());
    for stage in &harvest.report.stages {
        println!(
            "  {:<24} {:>8} records  {:>4} failed fetches{}",
            stage.stored_as,
            stage.records,
            stage.failed_fetches,
            stage
                .sink_error
                .as_deref()
                .map(|e| format!("  (not saved: {})", e))
                .unwrap_or_default()
        );
    }
    println!(
        "  {} requests, {} rate limited, {} failed",
        harvest.report.requests.attempts,
        harvest.report.requests.rate_limited,
        harvest.report.requests.failures
    );

    if harvest.report.sink_errors() > 0 {
        anyhow::bail!("{} dataset(s) could not be saved", harvest.report.sink_errors());
    }
    Ok(())
}

async fn cmd_analyze(input: PathBuf, json: bool) -> Result<()> {
    let data = LoadInput::from_dir(&input)
        .await
        .with_context(|| format!("Failed to read datasets from {}", input.display()))?;

    let graph = Arc::new(MemoryGraph::new());
    GraphLoader::new(graph.clone()).load(&data).await?;
    let report = analyze(graph.as_ref()).await?;
    print_report(&report, json)
}

#[cfg(feature = "neo4j")]
async fn connect_neo4j() -> Result<Neo4jGraph> {
    let uri = std::env::var("NEO4J_URI").context("NEO4J_URI not set")?;
    let user = std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string());
    let password = std::env::var("NEO4J_PASSWORD").context("NEO4J_PASSWORD not set")?;
    Ok(Neo4jGraph::connect(&uri, &user, &password).await?)
}

#[cfg(feature = "neo4j")]
async fn cmd_load(input: PathBuf, clear: bool) -> Result<()> {
    let data = LoadInput::from_dir(&input)
        .await
        .with_context(|| format!("Failed to read datasets from {}", input.display()))?;

    let graph: Arc<dyn GraphStore> = Arc::new(connect_neo4j().await?);
    let loader = GraphLoader::new(graph.clone());
    if clear {
        loader.clear().await?;
    }
    let report = loader.load(&data).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    let stats = camara_collector::graph::analysis::graph_stats(&graph.snapshot().await?);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn print_report(report: &AnalysisReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Graph statistics");
    for (label, count) in report.stats.nodes.iter().chain(report.stats.edges.iter()) {
        println!("  {:<12} {:>8}", label, count);
    }

    println!("\nDeputies per party");
    for row in &report.deputies_per_party {
        println!("  {:<12} {:>4}  {}", row.sigla, row.deputies, row.nome);
    }

    println!("\nDeputies per state");
    for row in &report.deputies_per_state {
        println!("  {:<4} {:>4}  {} ({})", row.sigla, row.deputies, row.nome, row.regiao);
    }

    println!("\nDeputies per region");
    for row in &report.deputies_per_region {
        println!("  {:<14} {:>4}", row.regiao, row.deputies);
    }

    println!("\nParties with more than 5 deputies per region");
    for row in &report.parties_per_region {
        println!("  {:<14} {:<12} {:>4}", row.regiao, row.partido, row.deputies);
    }

    println!("\nThematic fronts");
    for row in &report.thematic_fronts {
        let legislature = row
            .legislatura
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  [{}] {}", legislature, row.titulo);
    }
    Ok(())
}
