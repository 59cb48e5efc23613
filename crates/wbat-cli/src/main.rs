// crates/wbat-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::{rngs::StdRng, SeedableRng};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wbat_attacks::{
    run_exact, run_lda, write_leaky_traces, AttackOutcome, ExactOptions, LdaOptions, Leak, Order,
    Report, SynthSpec,
};
use wbat_targets::{AesTargets, MaskSpec, Side, TargetSource};
use wbat_trace::{TraceSet, WindowPlan, WindowReader};

#[derive(Parser, Debug)]
#[command(
    name = "wbat-cli",
    about = "White-box trace attack toolkit",
    long_about = "White-box trace attack toolkit.\n\nUse this tool to simulate leaky trace sets and run exact-matching or linear-decoding key recovery over recorded traces.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Exact matching attack: look for prediction vectors among window
    /// sample vectors (order 1), or among XOR pairs (order 2).
    Exact {
        /// Directory with NNNN.bin / NNNN.pt / NNNN.ct files
        trace_dir: PathBuf,

        /// Number of traces to use in the attack
        #[arg(short = 't', long, default_value_t = 100)]
        n_traces: usize,

        /// Sliding window size in bits (rounded up to a byte boundary)
        #[arg(short = 'w', long, default_value_t = 2048)]
        window: usize,

        /// Sliding window step in bits (0 = window/4)
        #[arg(short = 's', long, default_value_t = 0)]
        step: usize,

        /// Linear masks: comma-separated ints, or 'all', 'random16', 'random32'
        #[arg(long, default_value = "1,2,4,8,16,32,64,128")]
        masks: MaskSpec,

        /// Byte positions to attack (comma-separated, 0..=15)
        #[arg(long, default_value = "0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15")]
        pos: String,

        /// Seed for the random mask presets (echoed for reproducibility)
        #[arg(long, default_value_t = 0)]
        mask_seed: u64,

        /// Maximum attack order
        #[arg(short = 'o', long, value_enum, default_value_t = OrderOpt::One)]
        order: OrderOpt,

        /// Abort after the first window that produced any match
        #[arg(long, default_value_t = false)]
        stop_on_first_match: bool,

        /// Also write the final report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Linear decoding attack: test predictions for membership in the GF(2)
    /// span of window sample vectors. First order only; needs more traces
    /// than window bits.
    Lda {
        /// Directory with NNNN.bin / NNNN.pt / NNNN.ct files
        trace_dir: PathBuf,

        /// Number of traces to use in the attack
        #[arg(short = 't', long, default_value_t = 306)]
        n_traces: usize,

        /// Sliding window size in bits (rounded up to a byte boundary)
        #[arg(short = 'w', long, default_value_t = 256)]
        window: usize,

        /// Sliding window step in bits (0 = window/4)
        #[arg(short = 's', long, default_value_t = 0)]
        step: usize,

        /// Linear masks: comma-separated ints, or 'all', 'random16', 'random32'
        #[arg(long, default_value = "1,2,4,8,16,32,64,128")]
        masks: MaskSpec,

        /// Byte positions to attack (comma-separated, 0..=15)
        #[arg(long, default_value = "0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15")]
        pos: String,

        /// Seed for the random mask presets (echoed for reproducibility)
        #[arg(long, default_value_t = 0)]
        mask_seed: u64,

        /// Abort after the first window that produced any match
        #[arg(long, default_value_t = false)]
        stop_on_first_match: bool,

        /// Also write the final report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Write a synthetic leaky trace set to attack.
    Simulate {
        /// Output directory (created if missing)
        out_dir: PathBuf,

        /// Number of traces to record
        #[arg(short = 't', long, default_value_t = 64)]
        n_traces: usize,

        /// Packed size of each trace in bytes
        #[arg(long, default_value_t = 2048)]
        trace_bytes: usize,

        /// AES-128 key as 32 hex characters
        #[arg(long, default_value = "000102030405060708090a0b0c0d0e0f")]
        key: String,

        /// Seed for plaintexts, noise, and shares
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Leak model
        #[arg(long, value_enum, default_value_t = LeakOpt::Unmasked)]
        leak: LeakOpt,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum OrderOpt {
    /// Single sample vectors only
    #[value(name = "1")]
    One,
    /// Also XOR pairs of sample vectors
    #[value(name = "2")]
    Two,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum LeakOpt {
    /// Pure noise (no leak)
    Uniform,
    /// Raw first-round S-box output bytes
    Unmasked,
    /// First-order Boolean shares of the S-box outputs
    Masked,
}

impl From<LeakOpt> for Leak {
    fn from(x: LeakOpt) -> Self {
        match x {
            LeakOpt::Uniform => Leak::Uniform,
            LeakOpt::Unmasked => Leak::Unmasked,
            LeakOpt::Masked => Leak::Masked,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Exact {
            trace_dir,
            n_traces,
            window,
            step,
            masks,
            pos,
            mask_seed,
            order,
            stop_on_first_match,
            report,
        } => attack_exact(
            &trace_dir,
            n_traces,
            window,
            step,
            &masks,
            &pos,
            mask_seed,
            order,
            stop_on_first_match,
            report.as_deref(),
        ),

        Cmd::Lda {
            trace_dir,
            n_traces,
            window,
            step,
            masks,
            pos,
            mask_seed,
            stop_on_first_match,
            report,
        } => attack_lda(
            &trace_dir,
            n_traces,
            window,
            step,
            &masks,
            &pos,
            mask_seed,
            stop_on_first_match,
            report.as_deref(),
        ),

        Cmd::Simulate {
            out_dir,
            n_traces,
            trace_bytes,
            key,
            seed,
            leak,
        } => simulate(&out_dir, n_traces, trace_bytes, &key, seed, leak),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Ensure the parent directory for a file exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

/// Parse comma-separated byte positions.
fn parse_positions(csv: &str) -> Result<Vec<u8>> {
    csv.split(',')
        .map(|tok| {
            tok.trim()
                .parse::<u8>()
                .map_err(|_| anyhow!("bad byte position {tok:?} (expected 0..=15)"))
        })
        .collect()
}

/// Open the trace set and build the prediction vectors shared by both
/// attacks. Returns the reader plus the generated targets.
fn prepare(
    trace_dir: &Path,
    n_traces: usize,
    window: usize,
    step: usize,
    masks: &MaskSpec,
    pos: &str,
    mask_seed: u64,
) -> Result<(WindowReader, Vec<(wbat_gf2::BitVec, wbat_targets::Guess)>)> {
    let set = TraceSet::open(trace_dir, n_traces)
        .with_context(|| format!("opening trace set in {}", trace_dir.display()))?;
    println!(
        "Total traces: {} of {} bits each ({} bytes)",
        set.ntraces(),
        set.trace_bytes() * 8,
        set.trace_bytes()
    );

    let plan = WindowPlan::new(window, step, set.trace_bytes())?;

    let mut mask_rng = StdRng::seed_from_u64(mask_seed);
    let masks = masks.resolve(&mut mask_rng)?;
    println!("Using linear masks: {masks:?} (seed {mask_seed})");

    let positions = parse_positions(pos)?;
    let generator = AesTargets::new(positions, masks, Side::Plaintext)?;
    let targets = generator.generate(set.plaintexts(), set.ciphertexts());
    println!("Generated {} target vectors", targets.len());

    Ok((WindowReader::new(set, plan), targets))
}

#[allow(clippy::too_many_arguments)]
fn attack_exact(
    trace_dir: &Path,
    n_traces: usize,
    window: usize,
    step: usize,
    masks: &MaskSpec,
    pos: &str,
    mask_seed: u64,
    order: OrderOpt,
    stop_on_first_match: bool,
    report: Option<&Path>,
) -> Result<()> {
    let (mut reader, targets) = prepare(trace_dir, n_traces, window, step, masks, pos, mask_seed)?;

    let opts = ExactOptions {
        order: match order {
            OrderOpt::One => Order::First,
            OrderOpt::Two => Order::Second,
        },
        stop_on_first_match,
    };
    let outcome = run_exact(&mut reader, &targets, &opts)?;
    finish(&outcome, report)
}

#[allow(clippy::too_many_arguments)]
fn attack_lda(
    trace_dir: &Path,
    n_traces: usize,
    window: usize,
    step: usize,
    masks: &MaskSpec,
    pos: &str,
    mask_seed: u64,
    stop_on_first_match: bool,
    report: Option<&Path>,
) -> Result<()> {
    if n_traces <= window {
        bail!(
            "ntraces <= window (no redundancy): {n_traces} <= {window}; \
             decoding needs more traces than window bits"
        );
    }

    let (mut reader, targets) = prepare(trace_dir, n_traces, window, step, masks, pos, mask_seed)?;
    let opts = LdaOptions {
        stop_on_first_match,
    };
    let outcome = run_lda(&mut reader, &targets, &opts)?;
    finish(&outcome, report)
}

/// Print matches and the final report; optionally persist it as JSON.
fn finish(outcome: &AttackOutcome, report: Option<&Path>) -> Result<()> {
    for m in &outcome.matches {
        println!("{m}");
    }

    println!("=================================");
    println!();
    let rep = Report::from_candidates(&outcome.candidates);
    println!("{rep}");

    if let Some(path) = report {
        ensure_parent_dir(path)?;
        let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(f), &rep)
            .with_context(|| "serialize JSON report")?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn simulate(
    out_dir: &Path,
    n_traces: usize,
    trace_bytes: usize,
    key_hex: &str,
    seed: u64,
    leak: LeakOpt,
) -> Result<()> {
    let key_bytes = hex::decode(key_hex).context("key must be hex")?;
    let key: [u8; 16] = key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("key must be exactly 16 bytes (32 hex characters)"))?;

    let spec = SynthSpec {
        ntraces: n_traces,
        trace_bytes,
        key,
        seed,
        leak: leak.into(),
    };
    write_leaky_traces(out_dir, &spec)?;

    println!(
        "Simulated {} traces of {} bytes (leak {:?}, seed {}, key {}) → {}",
        n_traces,
        trace_bytes,
        spec.leak,
        seed,
        hex::encode(key),
        out_dir.display()
    );
    Ok(())
}
