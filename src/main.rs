//! shardrop CLI - build and query sharded distribution proofs
//!
//! Output goes to stdout as JSON; logs go to stderr (filter with `RUST_LOG`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shardrop::{
    get_entry_proof_index, hash_leaf, shard_id_for, verify_proof, Address, Config,
    DirShardFetcher, Entry, Hash32, Proof, ShardFetcher, ShardedMerkleTree, TreeBuilder,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(name = "shardrop")]
#[command(about = "Sharded Merkle proofs for token distributions")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Build shard manifests and the root manifest from an allocation list
    Build {
        /// Input file with one `address,balance` pair per line
        #[arg(short, long)]
        input: PathBuf,
        /// Hex characters of the address used as the shard key
        #[arg(short, long, default_value = "2")]
        nybbles: u8,
        /// Directory to write root.json and <shard>.json into
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Fetch the proof for an address
    Proof {
        /// The claimant address
        address: String,
        /// Manifest source: an http(s) base URL or a directory
        #[arg(short, long)]
        source: Option<String>,
        /// Per-fetch timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Check a proof against a root without fetching anything
    Verify {
        #[arg(short, long)]
        address: String,
        /// Balance as a decimal string
        #[arg(short, long)]
        balance: String,
        /// Expected global root
        #[arg(short, long)]
        root: String,
        /// Proof elements, nearest sibling first
        #[arg(short, long, num_args = 0..)]
        proof: Vec<String>,
    },

    /// Print the shard id an address falls into
    Shard {
        address: String,
        #[arg(short, long, default_value = "2")]
        nybbles: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            nybbles,
            out,
        } => {
            let mut builder = TreeBuilder::new(nybbles)?;
            builder.extend(read_allocations(&input)?)?;
            let distribution = builder.build()?;
            distribution.write_to_dir(&out)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "root": distribution.root.root,
                    "shardNybbles": distribution.root.shard_nybbles,
                    "total": distribution.root.total.to_string(),
                    "shards": distribution.shards.len(),
                    "entries": distribution.entry_count(),
                    "out": out.display().to_string()
                }),
            )?;
        }

        Commands::Proof {
            address,
            source,
            timeout,
        } => {
            let mut config = Config::from_env()?;
            if let Some(source) = source {
                config.source = source;
            }
            if let Some(secs) = timeout {
                anyhow::ensure!(secs > 0, "fetch timeout must be positive");
                config.fetch_timeout_secs = secs;
            }

            let tree = ShardedMerkleTree::loader(open_fetcher(&config)?)
                .with_fetch_timeout(config.fetch_timeout())
                .open()
                .await?;
            let (entry, proof) = tree.get_proof(&address).await?;
            let parsed = Address::parse(&address)?;
            let index = get_entry_proof_index(&parsed, &entry, &proof)?;

            output(
                &cli.format,
                &serde_json::json!({
                    "address": parsed,
                    "balance": entry.balance.to_string(),
                    "leaf": hash_leaf(&parsed, &entry),
                    "proof": proof,
                    "index": index,
                    "root": tree.root(),
                    "valid": tree.verify(&parsed, &entry, &proof)
                }),
            )?;
        }

        Commands::Verify {
            address,
            balance,
            root,
            proof,
        } => {
            let parsed = Address::parse(&address)?;
            let entry = Entry::from_decimal(&balance)?;
            let root = Hash32::from_hex(&root)?;
            let proof = Proof::from_hex(&proof[..])?;
            let leaf = hash_leaf(&parsed, &entry);

            output(
                &cli.format,
                &serde_json::json!({
                    "address": parsed,
                    "leaf": leaf,
                    "index": get_entry_proof_index(&parsed, &entry, &proof)?,
                    "valid": verify_proof(leaf, &proof, &root)
                }),
            )?;
        }

        Commands::Shard { address, nybbles } => {
            shardrop::model::validate_shard_nybbles(nybbles)?;
            let id = shard_id_for(&address, nybbles)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "address": address,
                    "shard": id
                }),
            )?;
        }
    }

    Ok(())
}

fn open_fetcher(config: &Config) -> Result<Box<dyn ShardFetcher>> {
    if config.is_remote() {
        return remote_fetcher(&config.source, config.fetch_timeout());
    }
    Ok(Box::new(DirShardFetcher::new(&config.source)))
}

#[cfg(feature = "http")]
fn remote_fetcher(url: &str, timeout: Duration) -> Result<Box<dyn ShardFetcher>> {
    Ok(Box::new(shardrop::HttpShardFetcher::new(url, timeout)?))
}

#[cfg(not(feature = "http"))]
fn remote_fetcher(url: &str, _timeout: Duration) -> Result<Box<dyn ShardFetcher>> {
    anyhow::bail!(
        "cannot fetch {}: HTTP support not enabled. Compile with --features http",
        url
    )
}

/// Read `address,balance` lines, skipping blanks and `#` comments
fn read_allocations(path: &Path) -> Result<Vec<(Address, Entry)>> {
    let file = File::open(path).context("Failed to open input file")?;
    let reader = BufReader::new(file);
    let mut allocations = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (address, balance) = trimmed.split_once(',').with_context(|| {
            format!(
                "Invalid format at line {}: expected 'address,balance', got '{}'",
                line_num + 1,
                trimmed
            )
        })?;
        let address = Address::parse(address)
            .with_context(|| format!("Invalid address at line {}", line_num + 1))?;
        let entry = Entry::from_decimal(balance)
            .with_context(|| format!("Invalid balance at line {}", line_num + 1))?;
        allocations.push((address, entry));
    }

    Ok(allocations)
}

fn output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Text => serde_json::to_string_pretty(value)?,
    };
    println!("{}", rendered);
    Ok(())
}
