//! sealkit: envelope encryption benchmarks and utilities
//!
//! Commands:
//!   bench <block|chunks|items|all>  - time key derivation, sealing and opening of generated text
//!   seal [--stream]                 - seal stdin, print the armored envelope
//!   open [--stream]                 - open an armored envelope from stdin, write plaintext
//!   config show                     - display current configuration

mod bench;
mod corpus;
mod memory;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use sealkit_core::config::{LogFormat, SealkitConfig};
use sealkit_core::types::Scenario;
use sealkit_crypto::{
    decode_envelope, derive_symmetric_key_from_secret, encode_envelope, open_block, seal,
    seal_block, ArmoredStream,
};

use crate::bench::{render_report, BenchRun};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "sealkit",
    version,
    about = "Authenticated-encryption envelope toolkit",
    long_about = "sealkit: seal and open XChaCha20-Poly1305 envelopes and benchmark them"
)]
struct Cli {
    /// Path to sealkit.toml configuration file
    #[arg(long, short = 'c', env = "SEALKIT_CONFIG", default_value = "sealkit.toml")]
    config: PathBuf,

    /// Passphrase for key derivation (overrides config; prompted if unset)
    #[arg(long, env = "SEALKIT_PASSPHRASE", hide_env_values = true, global = true)]
    passphrase: Option<String>,

    /// Log level (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Benchmark key derivation, encryption and decryption
    Bench {
        /// Scenario to run
        #[arg(value_enum, default_value_t = ScenarioArg::All)]
        scenario: ScenarioArg,
        /// Number of items (chunks and items scenarios)
        #[arg(long)]
        items: Option<usize>,
        /// Characters per generated item
        #[arg(long)]
        item_size: Option<usize>,
        /// Item-sized texts joined into the block scenario's text
        #[arg(long)]
        repeats: Option<usize>,
        /// Encrypt and decrypt items on all cores
        #[arg(long)]
        parallel: bool,
        /// Seed for the text generator
        #[arg(long)]
        seed: Option<u64>,
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Seal stdin and print the base64 envelope on stdout
    Seal {
        /// Use stream framing (prints JSON with header and ciphertext)
        #[arg(long)]
        stream: bool,
    },

    /// Open a base64 envelope from stdin and write the plaintext to stdout
    Open {
        /// Expect stream framing (JSON with header and ciphertext)
        #[arg(long)]
        stream: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ScenarioArg {
    Block,
    Chunks,
    Items,
    All,
}

impl ScenarioArg {
    fn scenarios(self) -> Vec<Scenario> {
        match self {
            ScenarioArg::Block => vec![Scenario::Block],
            ScenarioArg::Chunks => vec![Scenario::Chunks],
            ScenarioArg::Items => vec![Scenario::Items],
            ScenarioArg::All => vec![Scenario::Block, Scenario::Chunks, Scenario::Items],
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = SealkitConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    if cli.log_json {
        config.log.format = LogFormat::Json;
    }
    init_logging(&config.log.level, config.log.format);

    match cli.command {
        Commands::Bench {
            scenario,
            items,
            item_size,
            repeats,
            parallel,
            seed,
            json,
        } => {
            if let Some(n) = items {
                config.bench.item_count = n;
            }
            if let Some(n) = item_size {
                anyhow::ensure!(n > 0, "--item-size must be at least 1");
                config.bench.item_size = n;
            }
            if let Some(n) = repeats {
                config.bench.block_repeats = n;
            }
            if seed.is_some() {
                config.bench.seed = seed;
            }
            config.bench.parallel |= parallel;

            let passphrase = resolve_passphrase(cli.passphrase, &config)?;
            cmd_bench(&config, &passphrase, scenario, json)
        }
        Commands::Seal { stream } => {
            let passphrase = resolve_passphrase(cli.passphrase, &config)?;
            cmd_seal(&passphrase, stream)
        }
        Commands::Open { stream } => {
            let passphrase = resolve_passphrase(cli.passphrase, &config)?;
            cmd_open(&passphrase, stream)
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries envelopes and reports; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Passphrase precedence: flag/env, then config file, then interactive prompt.
fn resolve_passphrase(flag: Option<String>, config: &SealkitConfig) -> Result<SecretString> {
    if let Some(p) = flag.or_else(|| config.bench.passphrase.clone()) {
        return Ok(SecretString::from(p));
    }
    let entered = rpassword::prompt_password("Passphrase: ").context("reading passphrase")?;
    Ok(SecretString::from(entered))
}

// ── `sealkit bench` ───────────────────────────────────────────────────────────

fn cmd_bench(
    config: &SealkitConfig,
    passphrase: &SecretString,
    scenario: ScenarioArg,
    json: bool,
) -> Result<()> {
    let run = BenchRun {
        passphrase,
        config: &config.bench,
        show_progress: !json,
    };

    let mut failures = 0;
    for scenario in scenario.scenarios() {
        let report = run.run(scenario)?;
        failures += report.failures;
        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print!("{}", render_report(&report));
            println!("--------------------");
        }
    }

    anyhow::ensure!(failures == 0, "{failures} item(s) failed verification");
    Ok(())
}

// ── `sealkit seal` / `sealkit open` ───────────────────────────────────────────

fn cmd_seal(passphrase: &SecretString, stream: bool) -> Result<()> {
    let mut plaintext = Vec::new();
    std::io::stdin()
        .read_to_end(&mut plaintext)
        .context("reading stdin")?;

    let key = derive_symmetric_key_from_secret(passphrase);
    let armored = if stream {
        seal(&plaintext, &key)?.to_armored().to_json()?
    } else {
        encode_envelope(&seal_block(&plaintext, &key)?)
    };

    tracing::debug!(plaintext_len = plaintext.len(), stream, "sealed stdin");
    println!("{armored}");
    Ok(())
}

fn cmd_open(passphrase: &SecretString, stream: bool) -> Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading stdin")?;

    let key = derive_symmetric_key_from_secret(passphrase);
    let plaintext = if stream {
        ArmoredStream::from_json(input.trim())?
            .to_envelope()?
            .open(&key)
            .context("opening stream envelope")?
    } else {
        open_block(&decode_envelope(&input)?, &key).context("opening block envelope")?
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&plaintext).context("writing plaintext")?;
    stdout.flush()?;
    Ok(())
}

// ── `sealkit config show` ─────────────────────────────────────────────────────

fn cmd_config_show(config: &SealkitConfig, path: &Path) -> Result<()> {
    println!("# config: {}", path.display());
    let mut shown = config.clone();
    if shown.bench.passphrase.is_some() {
        shown.bench.passphrase = Some("[REDACTED]".into());
    }
    print!("{}", shown.to_toml()?);
    Ok(())
}
