use anyhow::{Context, Result, bail};
use std::path::Path;

use doc_review::cli::{self, Commands};
use doc_review::config::Config;
use doc_review::logging::{self, LogTarget};
use doc_review::metadata::{Catalog, MetadataOrigin};
use doc_review::pairs::Comparison;
use doc_review::storage::{BlobStore, DataSource, S3Store, Storage};
use doc_review::tui::{App, run_tui};
use doc_review::{DocType, demo, migrate};

fn main() -> Result<()> {
    let args = cli::parse_args();
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let command = args.command.unwrap_or(Commands::Review);

    // The TUI owns the terminal, so it logs to a file
    let target = match command {
        Commands::Review => LogTarget::File(&config.paths.log_file),
        _ => LogTarget::Stderr,
    };
    logging::init(&config.log_level, target).context("Failed to initialize logging")?;

    match command {
        Commands::Review => handle_review(&config)?,
        Commands::Status => handle_status(&config)?,
        Commands::Pairs(args) => handle_pairs(&config, &args.batch, args.doc_type)?,
        Commands::Probe => handle_probe(&config)?,
        Commands::List(args) => handle_list(&config, &args.prefix)?,
        Commands::Presign(args) => handle_presign(&config, &args.key)?,
        Commands::DemoPdfs(args) => {
            let out = args.out.unwrap_or_else(|| config.paths.documents.clone());
            handle_demo(&out)?;
        }
        Commands::Migrate(args) => handle_migrate(&config, &args.source)?,
    }

    Ok(())
}

/// Connect storage and load the catalog against the chosen data source.
fn open_catalog(config: &Config) -> Result<(Storage, Catalog)> {
    let storage = Storage::connect(config);
    let catalog = Catalog::load(&config.paths.metadata, storage.source())
        .context("Failed to load metadata")?;
    Ok((storage, catalog))
}

fn handle_review(config: &Config) -> Result<()> {
    let (storage, catalog) = open_catalog(config)?;
    let app = App::new(catalog, storage, config.paths.audit_download.clone());
    run_tui(app)
}

fn handle_status(config: &Config) -> Result<()> {
    let (storage, catalog) = open_catalog(config)?;

    match storage.source() {
        DataSource::Remote => println!("Data source: {}", storage.sink().describe()),
        DataSource::LocalSample => match storage.probe_error() {
            Some(reason) => println!("Data source: local sample data ({})", reason),
            None => println!("Data source: local sample data"),
        },
    }
    match catalog.origin() {
        MetadataOrigin::File(path) => println!("Metadata:    {}", path.display()),
        MetadataOrigin::BuiltInSample => println!("Metadata:    built-in sample"),
        MetadataOrigin::InMemory => println!("Metadata:    in-memory rows"),
    }
    println!("Documents:   {}", catalog.records().len());
    println!("─────────────────────────────────────");

    for batch in catalog.batches() {
        for doc_type in DocType::ALL {
            match Comparison::build(catalog.records(), &batch, doc_type) {
                Ok(comparison) => {
                    let pairs: Vec<String> =
                        comparison.pairs.iter().map(|p| p.to_string()).collect();
                    println!("  {} {}  {}", batch, doc_type, pairs.join(", "));
                }
                Err(e) => println!("  {} {}  ⚠ {}", batch, doc_type, e),
            }
        }
    }

    Ok(())
}

fn handle_pairs(config: &Config, batch: &str, doc_type: DocType) -> Result<()> {
    let (_, catalog) = open_catalog(config)?;
    let comparison = match Comparison::build(catalog.records(), batch, doc_type) {
        Ok(comparison) => comparison,
        Err(e) => bail!("{}", e),
    };
    for pair in &comparison.pairs {
        println!("{}", pair);
    }
    Ok(())
}

fn handle_probe(config: &Config) -> Result<()> {
    let store = S3Store::new(&config.storage).context("Storage is not configured")?;
    store
        .probe()
        .with_context(|| format!("Cannot reach {}", store.describe()))?;
    println!("✓ Connected to {}", store.describe());
    Ok(())
}

fn handle_list(config: &Config, prefix: &str) -> Result<()> {
    let storage = Storage::connect(config);
    let sink = storage.sink();
    eprintln!("Listing {}", sink.describe());
    let keys = sink
        .list(prefix)
        .with_context(|| format!("Failed to list objects under '{}'", prefix))?;
    for key in keys {
        println!("{}", key);
    }
    Ok(())
}

fn handle_presign(config: &Config, key: &str) -> Result<()> {
    let storage = Storage::connect(config);
    let url = storage
        .sink()
        .presigned_url(key)
        .with_context(|| format!("Failed to generate URL for '{}'", key))?;
    println!("{}", url);
    Ok(())
}

fn handle_demo(out: &Path) -> Result<()> {
    let written = demo::generate(out)
        .with_context(|| format!("Failed to write demo PDFs to {}", out.display()))?;
    println!("✓ Created {} sample PDFs in {}", written.len(), out.display());
    Ok(())
}

fn handle_migrate(config: &Config, source: &Path) -> Result<()> {
    let storage = Storage::connect(config);
    let sink = storage.sink();
    println!("Migrating {} to {}", source.display(), sink.describe());

    let report = migrate::run(source, sink).context("Migration failed")?;
    println!(
        "✓ {} batches processed, {} files uploaded",
        report.batches,
        report.uploaded.len()
    );
    if !report.is_clean() {
        for path in &report.failed {
            eprintln!("  failed: {}", path.display());
        }
        bail!("{} uploads failed", report.failed.len());
    }
    Ok(())
}
