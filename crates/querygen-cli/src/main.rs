//! querygen CLI: generate and run specialized query units.

mod query;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use querygen_buffer::MemoryBudgetImpl;
use querygen_codegen::{builtins, instantiate};
use querygen_core::config::EngineConfig;
use querygen_exec::{Host, RawTable, TableLoader};
use tracing_subscriber::EnvFilter;

use crate::query::{parse_backend, QueryFile};

#[derive(Parser)]
#[command(name = "querygen")]
#[command(about = "Template-driven query unit generator and runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the unit source for a query file
    Generate {
        /// Path to the query YAML file
        #[arg(short, long)]
        query: PathBuf,

        /// Write `<unit>.rs` and `<unit>.json` here instead of printing
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Load the query's CSV table, run the unit and print the result rows
    Run {
        /// Path to the query YAML file
        #[arg(short, long)]
        query: PathBuf,

        /// Memory cap in bytes (overrides config)
        #[arg(long)]
        memory_cap: Option<usize>,

        /// Maximum partitions scanned in parallel (overrides config)
        #[arg(long)]
        max_parallel: Option<usize>,

        /// Default buffer backend: memory or mmap (overrides config)
        #[arg(long)]
        backend: Option<String>,

        /// Directory for memory-mapped column files (overrides config)
        #[arg(long)]
        mmap_dir: Option<String>,

        /// Print rows and manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// List built-in templates and their placeholders
    Templates,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { query, out } => {
            if let Err(e) = generate(&query, out.as_deref()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Run {
            query,
            memory_cap,
            max_parallel,
            backend,
            mmap_dir,
            json,
        } => {
            let overrides = Overrides {
                memory_cap,
                max_parallel,
                backend,
                mmap_dir,
            };
            if let Err(e) = run_query(&query, overrides, json) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Templates => list_templates(),
    }
}

struct Overrides {
    memory_cap: Option<usize>,
    max_parallel: Option<usize>,
    backend: Option<String>,
    mmap_dir: Option<String>,
}

fn generate(query_path: &Path, out: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let qf = QueryFile::load(query_path)?;
    let schema = qf.schema()?;
    let template = qf.template()?;
    let binding = qf.binding(&schema)?;

    let unit = instantiate(&template, &binding)?;

    match out {
        Some(dir) => {
            let src = unit.write_to(dir)?;
            let desc = dir.join(format!("{}.json", unit.file_stem()));
            fs::write(&desc, unit.descriptor().to_json()?)?;
            println!("✓ Generated {}", unit.unit_name());
            println!("  Source: {}", src.display());
            println!("  Descriptor: {}", desc.display());
            println!("  Fingerprint: {}", unit.fingerprint());
        }
        None => print!("{}", unit.source()),
    }
    Ok(())
}

fn run_query(
    query_path: &Path,
    overrides: Overrides,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let qf = QueryFile::load(query_path)?;
    let schema = qf.schema()?;
    let template = qf.template()?;
    let binding = qf.binding(&schema)?;

    let mut config = EngineConfig::from_env();
    qf.apply_config(&mut config)?;
    if let Some(cap) = overrides.memory_cap {
        config.mem_cap_bytes = cap;
    }
    if let Some(parallel) = overrides.max_parallel {
        config.max_parallel_tasks = parallel;
    }
    if let Some(b) = overrides.backend {
        config.default_backend = parse_backend(&b)?;
    }
    if let Some(dir) = overrides.mmap_dir {
        config.mmap_dir = dir;
    }

    let source = qf.source_path(query_path);
    let table = RawTable::from_csv(fs::File::open(&source)?, &schema)?;
    tracing::info!(source = %source.display(), rows = table.num_rows(), "table read");

    let loader = TableLoader::new(
        config.load_config(),
        MemoryBudgetImpl::new(config.mem_cap_bytes),
    )?;
    let loaded = loader.load(&table)?;
    let ctx = loaded.context(config.max_parallel_tasks)?;

    let mut host = Host::new(config)?;
    let output = host.execute(&template, &binding, ctx)?;

    if json {
        let doc = serde_json::json!({
            "rows": output.rows(),
            "manifest": output.manifest(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    for row in output.rows() {
        println!("{}\t{}", row.key, row.value);
    }
    let m = output.manifest();
    eprintln!("✓ {} rows from {}", output.num_rows(), m.unit_name);
    eprintln!("  Duration: {}ms", m.finished_ms.saturating_sub(m.started_ms));
    eprintln!("  Fingerprint: {}", m.fingerprint);
    Ok(())
}

fn list_templates() {
    for t in builtins() {
        let slots = t
            .placeholders()
            .iter()
            .map(|p| format!("{}:{}", p.name, p.role))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:<14} {:<12} {}", t.id(), t.kernel().name(), slots);
    }
}
