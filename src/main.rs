//! Run one of the engines on matrices read from JSON files.
//!
//! Matrices are read and written as `{"p": 3, "columns": 3, "rows": [[1, 2, 0], ...]}`. The `lift`
//! and `quotient` subcommands take an object with two such matrices. Results are printed to
//! standard output as JSON, and logs go to standard error, filtered by `RUST_LOG`.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context};
use clap::{Parser, Subcommand};
use fp::matrix::{AnyMatrix, DenseRows, Encoding};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use steenrod_linalg::{
    any::{lift_any, lift_cached_any, orthonormalize_any, quotient_any, AnyBasis},
    Config, OrthonormalizeOptions,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Row reduction, lifting and quotients over prime fields")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Matrix encoding: generic, batched or packed. Defaults to STEENROD_BACKEND, and then to the
    /// fastest encoding for the prime.
    #[arg(long, global = true)]
    backend: Option<Encoding>,

    /// Report progress every 2^k rows. Defaults to STEENROD_SAMPLE_SHIFT, and then to 6.
    #[arg(long, global = true, value_name = "K")]
    sample_shift: Option<u32>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Eliminate a matrix, printing its image and kernel.
    Orthonormalize {
        #[arg(long)]
        input: PathBuf,
        /// Also print the dual of the kernel.
        #[arg(long)]
        dual: bool,
        /// Save the elimination to this file, for later use with `lift --basis`.
        #[arg(long)]
        basis: Option<PathBuf>,
    },
    /// Express the rows of `l` in terms of the rows of `a`.
    Lift {
        /// An object `{"a": ..., "l": ...}`. `a` may be omitted when `--basis` is given.
        #[arg(long)]
        input: PathBuf,
        /// Replay an elimination saved by `orthonormalize --basis` instead of eliminating `a`.
        #[arg(long)]
        basis: Option<PathBuf>,
    },
    /// Reduce `ker` modulo the already eliminated `im`.
    Quotient {
        /// An object `{"ker": ..., "im": ...}`.
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct LiftInput {
    a: Option<DenseRows>,
    l: DenseRows,
}

#[derive(Debug, Deserialize)]
struct QuotientInput {
    ker: DenseRows,
    im: DenseRows,
}

#[derive(Debug, Serialize)]
struct OrthonormalizeOutput {
    rank: usize,
    image: DenseRows,
    kernel: DenseRows,
    #[serde(skip_serializing_if = "Option::is_none")]
    dual: Option<DenseRows>,
}

#[derive(Debug, Serialize)]
struct LiftOutput {
    result: DenseRows,
    residue: DenseRows,
}

#[derive(Debug, Serialize)]
struct QuotientOutput {
    rank: usize,
    quotient: DenseRows,
}

fn dense(matrix: &AnyMatrix) -> DenseRows {
    DenseRows {
        p: matrix.prime(),
        columns: matrix.columns(),
        rows: matrix.to_rows(),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn load(config: &Config, matrix: &DenseRows) -> anyhow::Result<AnyMatrix> {
    let encoding = config.encoding_for(matrix.p);
    AnyMatrix::from_rows(encoding, matrix.p, &matrix.rows, matrix.columns)
        .context("Failed to build matrix")
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn orthonormalize_command(
    config: &Config,
    input: &Path,
    dual: bool,
    basis: Option<&Path>,
) -> anyhow::Result<()> {
    let mut a = load(config, &read_json(input)?)?;
    let options = OrthonormalizeOptions {
        want_kernel: true,
        want_dual: dual,
        want_basis: basis.is_some(),
    };
    let mut progress = |x: f64| tracing::debug!(progress = x);
    let result = orthonormalize_any(
        &mut a,
        options,
        &mut config.sampler().with_progress(&mut progress),
    )?;

    if let (Some(path), Some(b)) = (basis, &result.basis) {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        b.to_bytes(&mut writer)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), rank = b.rank(), "saved basis");
    }

    let kernel = result.kernel.context("Kernel was not computed")?;
    print_json(&OrthonormalizeOutput {
        rank: result.rank,
        image: dense(&a),
        kernel: dense(&kernel),
        dual: result.dual.as_ref().map(dense),
    })
}

fn lift_command(config: &Config, input: &Path, basis: Option<&Path>) -> anyhow::Result<()> {
    let input: LiftInput = read_json(input)?;
    let mut l = load(config, &input.l)?;
    let mut progress = |x: f64| tracing::debug!(progress = x);
    let mut sampler = config.sampler().with_progress(&mut progress);

    let result = match basis {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            let basis = AnyBasis::from_bytes(&mut BufReader::new(file))
                .with_context(|| format!("Failed to read basis from {}", path.display()))?;
            ensure!(
                basis.prime() == input.l.p,
                "Basis is over F_{}, but l is over F_{}",
                basis.prime(),
                input.l.p
            );
            lift_cached_any(&basis, &mut l, &mut sampler)?
        }
        None => {
            let a = input.a.context("Either `a` or --basis is required")?;
            ensure!(
                a.p == input.l.p,
                "a is over F_{}, but l is over F_{}",
                a.p,
                input.l.p
            );
            let mut a = load(config, &a)?;
            lift_any(&mut a, &mut l, &mut sampler)?
        }
    };

    print_json(&LiftOutput {
        result: dense(&result),
        residue: dense(&l),
    })
}

fn quotient_command(config: &Config, input: &Path) -> anyhow::Result<()> {
    let input: QuotientInput = read_json(input)?;
    ensure!(
        input.ker.p == input.im.p,
        "ker is over F_{}, but im is over F_{}",
        input.ker.p,
        input.im.p
    );
    let mut ker = load(config, &input.ker)?;
    let im = load(config, &input.im)?;
    let mut progress = |x: f64| {
        if x == steenrod_linalg::PHASE_SENTINEL {
            tracing::debug!("reducing quotient against itself");
        } else {
            tracing::debug!(progress = x);
        }
    };
    quotient_any(
        &mut ker,
        &im,
        &mut config.sampler().with_progress(&mut progress),
    )?;
    print_json(&QuotientOutput {
        rank: ker.rows(),
        quotient: dense(&ker),
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(encoding) = cli.backend {
        config.encoding = Some(encoding);
    }
    if let Some(shift) = cli.sample_shift {
        config = config.with_sample_shift(shift);
    }
    tracing::debug!(?config);

    match &cli.command {
        Command::Orthonormalize { input, dual, basis } => {
            orthonormalize_command(&config, input, *dual, basis.as_deref())
        }
        Command::Lift { input, basis } => lift_command(&config, input, basis.as_deref()),
        Command::Quotient { input } => quotient_command(&config, input),
    }
}
