//! quill: command-line front end for the Quill transaction engine.
//!
//! Generates mnemonics, derives addresses, composes and signs spends from a
//! notes file, and decodes signed transactions. Nothing here talks to a
//! ledger; output is JSON on stdout and logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::debug;

use quill_core::settings::NetworkPreset;
use quill_core::tx::SignedTransaction;
use quill_core::types::{Amount, BlockHeight, Digest};
use quill_wallet::Wallet;
use quill_wallet::keys::parse_path;
use quill_wallet::mnemonic::generate_mnemonic;

mod config;
mod spend;

use config::Config;
use spend::SpendOptions;

/// Quill transaction engine CLI.
#[derive(Parser)]
#[command(name = "quill")]
#[command(version, about = "Build and sign note-ledger transactions offline.")]
struct Cli {
    /// Log level when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Settings preset; overrides QUILL_NETWORK.
    #[arg(long, global = true)]
    network: Option<NetworkPreset>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh 24-word mnemonic.
    Mnemonic,
    /// Show the public key and address of a wallet key.
    Address(AddressArgs),
    /// Compose and sign a spend from a notes file.
    Spend(SpendArgs),
    /// Validate a hex-encoded signed transaction and print it as JSON.
    Decode(DecodeArgs),
}

#[derive(Args)]
struct AddressArgs {
    /// Hardened child index; the master key when omitted.
    #[arg(short, long, conflicts_with = "path")]
    index: Option<u32>,

    /// Derivation path such as m/44'/0'.
    #[arg(long)]
    path: Option<String>,
}

#[derive(Args)]
struct SpendArgs {
    /// JSON file with a note array or a balance snapshot.
    #[arg(long)]
    notes: PathBuf,

    /// Recipient public key hash (base58).
    #[arg(long)]
    recipient: Digest,

    /// Amount to send.
    #[arg(long)]
    gift: Amount,

    /// Fixed fee instead of the estimate.
    #[arg(long)]
    fee: Option<Amount>,

    /// Change address (base58); the wallet address by default.
    #[arg(long)]
    refund: Option<Digest>,

    /// Fail instead of creating a change output.
    #[arg(long)]
    no_change: bool,

    /// Publish output lock conditions in the transaction.
    #[arg(long)]
    lock_data: bool,

    /// Height the spend is evaluated at; defaults to a balance file's height.
    #[arg(long)]
    height: Option<BlockHeight>,

    /// Select notes largest-first instead of spending all of them.
    #[arg(long)]
    select: bool,

    /// Number of child keys to derive and sign with.
    #[arg(long, default_value_t = 0)]
    keys: u32,
}

#[derive(Args)]
struct DecodeArgs {
    /// Hex-encoded transaction bytes.
    hex: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(network) = cli.network {
        config.network = network;
    }
    debug!(?config, "loaded configuration");

    let output = match cli.command {
        Commands::Mnemonic => json!({ "mnemonic": generate_mnemonic() }),
        Commands::Address(args) => address(&config, args)?,
        Commands::Spend(args) => spend(&config, args)?,
        Commands::Decode(args) => decode(&args.hex)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let layer = fmt::layer().with_writer(std::io::stderr);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_target(true).with_level(true))
            .init(),
    }
}

fn open_wallet(config: &Config) -> Result<Wallet> {
    Wallet::from_mnemonic(
        config.require_mnemonic()?,
        &config.passphrase,
        config.network.settings(),
    )
    .context("failed to restore wallet from mnemonic")
}

fn address(config: &Config, args: AddressArgs) -> Result<serde_json::Value> {
    let wallet = open_wallet(config)?;
    let master = wallet.keyring().master();
    let (key, label) = match (args.index, args.path) {
        (Some(index), _) => (master.derive_child(index), format!("m/{index}'")),
        (None, Some(path)) => (master.derive_path(&parse_path(&path)?), path),
        (None, None) => (master.clone(), "m".to_string()),
    };
    Ok(json!({
        "path": label,
        "public_key": key.public_key().to_string(),
        "address": key.pkh(),
    }))
}

fn spend(config: &Config, args: SpendArgs) -> Result<serde_json::Value> {
    let mut wallet = open_wallet(config)?;
    wallet.keyring_mut().restore_to_index(args.keys);

    let (notes, file_height) = spend::load_notes(&args.notes)?;
    let height = args
        .height
        .or(file_height)
        .ok_or_else(|| anyhow!("--height is required when the notes file has no height"))?;

    let opts = SpendOptions {
        recipient: args.recipient,
        gift: args.gift,
        fee: args.fee,
        refund: args.refund,
        change: !args.no_change,
        lock_data: args.lock_data,
        height,
        select: args.select,
    };
    let tx = spend::compose(&wallet, notes, &opts)?;
    let bytes = tx.encode()?;
    Ok(json!({
        "id": tx.id(),
        "fee": tx.fee(),
        "inputs": tx.inputs().len(),
        "outputs": tx.outputs().len(),
        "hex": hex::encode(bytes),
    }))
}

fn decode(text: &str) -> Result<serde_json::Value> {
    let bytes = hex::decode(text.trim()).context("transaction is not valid hex")?;
    let tx = SignedTransaction::decode(&bytes)?;
    Ok(transaction_json(&tx))
}

fn transaction_json(tx: &SignedTransaction) -> serde_json::Value {
    json!({
        "id": tx.id(),
        "version": tx.version(),
        "fee": tx.fee(),
        "inputs": tx.inputs(),
        "outputs": tx.outputs(),
        "signatures": tx.signatures(),
        "preimages": tx.preimages().iter().map(hex::encode).collect::<Vec<_>>(),
    })
}
