use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cyberclust::analysis::AnalysisPipeline;
use cyberclust::error::{Error, Result};
use cyberclust::evaluation::evaluation_table;
use cyberclust::io::{write_csv, write_json, JsonOrient, SqliteStore, TableStore};
use cyberclust::labeling::summary_table;
use cyberclust::PipelineConfig;

#[derive(Parser)]
#[command(
    name = "cyberclust",
    about = "Cluster cyber incidents and score the clusterings",
    version,
    long_about = None
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overrides `database.path`
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter incidents, derive tags and standardize features
    Preprocess {
        /// Load the raw incident table from this CSV export first
        #[arg(long)]
        incidents_csv: Option<PathBuf>,
    },

    /// Principal component analysis of the clustering features
    Pca,

    /// Inertia of k-means for k = 1..=max_k
    Elbow {
        #[arg(long)]
        max_k: Option<usize>,
    },

    /// k-means clustering with cluster descriptions
    Kmeans,

    /// Hierarchical clustering of sector/attack and country groups
    Agglomerative,

    /// Silhouette and Davies-Bouldin scores of both clusterings
    Evaluate {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Run every stage in order
    Run {
        #[arg(long)]
        incidents_csv: Option<PathBuf>,
    },

    /// Write a table to a .csv or .json file
    Export {
        table: String,
        file: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.database.path = db.display().to_string();
    }
    Ok(config)
}

fn export(store: &SqliteStore, table: &str, file: &Path) -> Result<()> {
    let df = store.read_table(table)?;
    match file.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => write_csv(&df, file)?,
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            write_json(&df, file, JsonOrient::Records)?
        }
        _ => {
            return Err(Error::InvalidInput(format!(
                "cannot infer export format of {}; use .csv or .json",
                file.display()
            )))
        }
    }
    log::info!("exported {} rows of {} to {}", df.row_count(), table, file.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let store = SqliteStore::open(&config.database.path)?;

    if let Commands::Export { table, file } = &cli.command {
        return export(&store, table, file);
    }

    let mut pipeline = AnalysisPipeline::new(store, config);
    match cli.command {
        Commands::Preprocess { incidents_csv } => {
            let processed = pipeline.preprocess(incidents_csv.as_deref())?;
            println!("{} incidents processed", processed.row_count());
        }
        Commands::Pca => {
            let pca = pipeline.pca()?;
            println!("{}", pca.variance_report()?);
        }
        Commands::Elbow { max_k } => {
            println!("{:>4} | Inertia", "k");
            for point in pipeline.elbow(max_k)? {
                println!("{:>4} | {:.4}", point.k, point.inertia);
            }
        }
        Commands::Kmeans => {
            let profiles = pipeline.kmeans()?;
            println!("{}", summary_table(&profiles)?);
        }
        Commands::Agglomerative => {
            println!("{}", pipeline.agglomerative()?);
        }
        Commands::Evaluate { json } => {
            let evaluations = pipeline.evaluate()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&evaluations)?);
            } else {
                let records: Vec<_> = evaluations.iter().map(|e| e.record.clone()).collect();
                println!("{}", evaluation_table(&records)?);
                for evaluation in &evaluations {
                    println!("\n{} Davies-Bouldin detail", evaluation.record.algorithm);
                    println!("{}", evaluation.detail_table()?);
                }
            }
        }
        Commands::Run { incidents_csv } => {
            let report = pipeline.run(incidents_csv.as_deref())?;
            println!("{} incidents processed", report.processed_rows);
            println!("{}", summary_table(&report.kmeans_profiles)?);
            let records: Vec<_> = report.evaluations.iter().map(|e| e.record.clone()).collect();
            println!("{}", evaluation_table(&records)?);
        }
        Commands::Export { .. } => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
