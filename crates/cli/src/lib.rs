use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use midas_encoding::{CodeLookup, DictionaryCodec, EncodingArtifact};
use midas_schema::{default_tree, load_schema, SchemaScanner};
use std::path::{Path, PathBuf};

pub mod config;

use config::{MidasConfig, ResolvedConfig, CONFIG_FILE_NAME, TREE_FILE_NAME};

#[derive(Parser)]
#[command(name = "midas")]
#[command(about = "Stable encoding dictionary for analytics state trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to midas.toml
    #[arg(long, global = true, env = "MIDAS_CONFIG", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default midas.toml and schema tree
    Init,

    /// Merge the current schema into the encoding artifact
    #[command(name = "update-encoding")]
    UpdateEncoding(OutputArgs),

    /// Show the vocabulary discovered in the schema without writing anything
    Scan(OutputArgs),

    /// Translate codes back into the tokens they stand for
    Lookup(LookupArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Emit JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LookupArgs {
    /// Codes to decode, marker included
    #[arg(required = true)]
    codes: Vec<String>,
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Init => run_init(&cli.config),
        Commands::UpdateEncoding(args) => run_update_encoding(&cli.config, args),
        Commands::Scan(args) => run_scan(&cli.config, args),
        Commands::Lookup(args) => run_lookup(&cli.config, args),
    }
}

fn run_init(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        bail!(
            "{} already exists; replacing it could change the encoding marker and break existing codes",
            config_path.display()
        );
    }
    let base = config_path.parent().unwrap_or_else(|| Path::new(""));
    if !base.as_os_str().is_empty() {
        std::fs::create_dir_all(base)
            .with_context(|| format!("Cannot create {}", base.display()))?;
    }

    let config = MidasConfig::default();
    std::fs::write(config_path, config.to_toml()?)
        .with_context(|| format!("Cannot write {}", config_path.display()))?;
    log::info!("Wrote {}", config_path.display());

    let tree_path = base.join(TREE_FILE_NAME);
    if tree_path.exists() {
        log::info!("Keeping existing schema tree {}", tree_path.display());
    } else {
        let body = serde_json::to_string_pretty(&default_tree().to_json())?;
        std::fs::write(&tree_path, body)
            .with_context(|| format!("Cannot write {}", tree_path.display()))?;
        log::info!("Wrote {}", tree_path.display());
    }
    Ok(())
}

fn run_update_encoding(config_path: &Path, args: OutputArgs) -> Result<()> {
    let config = MidasConfig::load(config_path)?;
    let tree = load_schema(&config.tree_path)?;
    let scan = SchemaScanner::new(&tree).scan();

    let codec = DictionaryCodec::new(&config.encoding_path, config.marker);
    let report = codec
        .update(&scan)
        .with_context(|| format!("Failed to update {}", config.encoding_path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{}: {} patterns, {} new",
        report.artifact_path.display(),
        report.pattern_count,
        report.merge.appended_tokens.len()
    );
    for token in &report.merge.appended_tokens {
        println!("  + {token}");
    }
    for path in &report.merge.registered_bitfields {
        println!("  bitfield registered: {path}");
    }
    for path in &report.merge.extended_bitfields {
        println!("  bitfield extended: {path}");
    }
    Ok(())
}

fn run_scan(config_path: &Path, args: OutputArgs) -> Result<()> {
    let config = MidasConfig::load(config_path)?;
    let tree = load_schema(&config.tree_path)?;
    let scan = SchemaScanner::new(&tree).scan();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scan)?);
        return Ok(());
    }

    println!("{} tokens", scan.tokens.len());
    for (path, variants) in &scan.variant_sets {
        println!("  enum {path}: {}", variants.join(", "));
    }
    for (path, keys) in &scan.bitfield_paths {
        println!("  bitfield {path}: {}", keys.join(", "));
    }
    for path in &scan.path_collisions {
        println!("  ambiguous path {path}");
    }
    Ok(())
}

fn run_lookup(config_path: &Path, args: LookupArgs) -> Result<()> {
    let config = MidasConfig::load(config_path)?;
    let artifact = load_existing_artifact(&config)?;
    let lookup = CodeLookup::new(&artifact)?;

    let mut unknown = Vec::new();
    for code in &args.codes {
        match lookup.token(code) {
            Some(token) => println!("{code}\t{token}"),
            None => unknown.push(code.as_str()),
        }
    }
    if !unknown.is_empty() {
        bail!("Unknown codes: {}", unknown.join(" "));
    }
    Ok(())
}

/// Lookups must not invent an empty dictionary when the artifact is missing.
fn load_existing_artifact(config: &ResolvedConfig) -> Result<EncodingArtifact> {
    if !config.encoding_path.exists() {
        bail!(
            "No encoding artifact at {} (run `midas update-encoding` first)",
            config.encoding_path.display()
        );
    }
    let codec = DictionaryCodec::new(&config.encoding_path, config.marker);
    Ok(codec.load()?)
}
