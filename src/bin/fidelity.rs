//! Command-line front end: fidelity comparison, scaling benchmarks and timing
//! table utilities.

use clap::{Parser, Subcommand};
use kernel_fidelity::benchmarks::calibration::tier_thresholds;
use kernel_fidelity::benchmarks::performance_metrics::{print_scaling_analysis, print_table};
use kernel_fidelity::benchmarks::result_capture::{capture_file_name, capture_to_file};
use kernel_fidelity::benchmarks::timing_table::{median_of_tables, speedup_table};
use kernel_fidelity::benchmarks::{
    BenchmarkRunner, CacheProfile, ConfigLoader, ExternalProgram, HarnessConfig, Kernel,
    Precision, TimingTable,
};
use kernel_fidelity::comparison::{compare_files, dataset_name, operation_label};
use kernel_fidelity::metrics::{Metric, compression_ratio, stream_compression_ratio};
use kernel_fidelity::reconstruction::load_signal;
use kernel_fidelity::series::DataKind;
use log::{error, info};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Numeric fidelity comparison and cache-aware timing for signal-processing kernels"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare candidate result files against a reference
    Compare(CompareArgs),
    /// Time a kernel executable across cache-tier-spanning problem sizes
    Bench(BenchArgs),
    /// Capture a kernel's per-element results as a comparison input file
    Capture(CaptureArgs),
    /// Reduce several timing tables to their per-cell median
    Median(MedianArgs),
    /// Compute speedups between a baseline and a new timing table
    Speedup(SpeedupArgs),
    /// Show the detected cache profile and tier thresholds
    Cache(CacheArgs),
    /// Compression ratio between an original and a compressed signal
    Ratio(RatioArgs),
}

#[derive(Parser, Debug)]
struct CompareArgs {
    /// Reference result file
    reference: PathBuf,

    /// Candidate result files
    #[arg(required = true)]
    candidates: Vec<PathBuf>,

    /// Layout of the result files: vector or matrix (guessed from the
    /// reference name when omitted)
    #[arg(short = 't', long = "type")]
    kind: Option<DataKind>,

    /// Metric: mse, nrmse, pearson, pearson-dual, psnr, psnr-8bit, ssim
    #[arg(short, long, default_value = "mse")]
    metric: Metric,

    /// Write the tabular report here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the JSON report here
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct HarnessArgs {
    /// JSON harness configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed passed to the program
    #[arg(long)]
    seed: Option<u64>,

    /// Launcher for the program, e.g. qemu-aarch64
    #[arg(long)]
    wrapper: Option<String>,
}

impl HarnessArgs {
    fn resolve(&self) -> Result<HarnessConfig, Box<dyn std::error::Error>> {
        let mut config = ConfigLoader::load_harness_config(self.config.as_deref())?;
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(wrapper) = &self.wrapper {
            config.wrapper = Some(wrapper.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Parser, Debug)]
struct BenchArgs {
    /// Kernel executable
    program: PathBuf,

    /// Kernel under test (guessed from the program name when omitted)
    #[arg(long)]
    kernel: Option<Kernel>,

    /// Element precision (guessed from the program name when omitted)
    #[arg(long)]
    precision: Option<Precision>,

    /// Comma-separated problem sizes (default table when omitted)
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<usize>>,

    /// Use the extended default size table
    #[arg(long)]
    extended: bool,

    /// Trials per size
    #[arg(long)]
    trials: Option<u32>,

    /// Read cache topology from this file instead of querying the host
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Write the timing table here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the JSON scaling report here
    #[arg(long)]
    json: Option<PathBuf>,

    #[command(flatten)]
    harness: HarnessArgs,
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    /// Kernel executable
    program: PathBuf,

    /// Problem size
    #[arg(short)]
    n: usize,

    /// Output file (defaults to <program>_n<n>_seed<seed>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    harness: HarnessArgs,
}

#[derive(Parser, Debug)]
struct MedianArgs {
    /// Timing tables with identical headers
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output table
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Parser, Debug)]
struct SpeedupArgs {
    /// Baseline timing table
    #[arg(short, long)]
    baseline: PathBuf,

    /// New timing table
    #[arg(short, long)]
    new: PathBuf,

    /// Output table
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Parser, Debug)]
struct CacheArgs {
    /// Read cache topology from this file instead of querying the host
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Kernel whose memory model converts tiers to problem sizes
    #[arg(long, default_value = "axpy")]
    kernel: Kernel,

    #[arg(long, default_value = "single")]
    precision: Precision,
}

#[derive(Parser, Debug)]
struct RatioArgs {
    /// Original signal, whitespace-separated values
    original: PathBuf,

    /// Compressed signal
    compressed: PathBuf,

    /// Compare raw file sizes instead of value counts
    #[arg(long)]
    bytes: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("fidelity failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Compare(args) => compare_command(args),
        Command::Bench(args) => bench_command(args),
        Command::Capture(args) => capture_command(args),
        Command::Median(args) => median_command(args),
        Command::Speedup(args) => speedup_command(args),
        Command::Cache(args) => cache_command(args),
        Command::Ratio(args) => ratio_command(args),
    }
}

fn compare_command(args: CompareArgs) -> Result<(), Box<dyn std::error::Error>> {
    let reference_name = dataset_name(&args.reference);
    let kind = args
        .kind
        .or_else(|| Kernel::from_program_name(&reference_name).map(|k| k.data_kind()))
        .ok_or_else(|| {
            format!(
                "cannot infer the data type from '{}', pass --type",
                reference_name
            )
        })?;
    let report = compare_files(&args.reference, &args.candidates, kind, args.metric)?;
    let operation = operation_label(&report.reference);
    let decimals = args.metric.decimals();

    println!("\nResultados {}:", operation);
    println!("Referencia: {}", report.reference);
    for result in &report.results {
        println!("\n{} vs {}:", result.candidate, report.reference);
        for (execution, value) in result.values.iter().enumerate() {
            println!("Ejecución {}: {}", execution + 1, value.cells(decimals).join(", "));
        }
    }
    for skipped in &report.skipped {
        println!("\nError en {}: {}", skipped.candidate, skipped.reason);
    }

    if let Some(path) = &args.output {
        report.write_csv(BufWriter::new(File::create(path)?), &operation)?;
        info!("Report written to {}", path.display());
    }
    if let Some(path) = &args.json {
        fs::write(path, report.to_json()?)?;
        info!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn load_profile(topology: Option<&Path>) -> CacheProfile {
    match topology {
        Some(path) => CacheProfile::from_query(|| fs::read_to_string(path)),
        None => CacheProfile::detect(),
    }
}

fn bench_command(args: BenchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = args.harness.resolve()?;
    if let Some(trials) = args.trials {
        config.trials = trials;
        config.validate()?;
    }

    let program_name = dataset_name(&args.program);
    let kernel = args
        .kernel
        .or_else(|| Kernel::from_program_name(&program_name))
        .ok_or_else(|| {
            format!(
                "cannot infer the kernel from '{}', pass --kernel",
                program_name
            )
        })?;
    let precision = args
        .precision
        .unwrap_or_else(|| Precision::from_program_name(&program_name));
    let sizes = args
        .sizes
        .unwrap_or_else(|| kernel.default_problem_sizes(args.extended));

    let profile = load_profile(args.topology.as_deref());
    let program = ExternalProgram::from_config(&args.program, &config);
    let runner = BenchmarkRunner::new(program, &config, kernel, precision, profile);
    let report = runner.run(&sizes)?;

    print_scaling_analysis(&report);

    if let Some(path) = &args.output {
        TimingTable::from_report(&report.timings).save(path)?;
        info!("Timing table written to {}", path.display());
    }
    if let Some(path) = &args.json {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("Scaling report written to {}", path.display());
    }
    Ok(())
}

fn capture_command(args: CaptureArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.harness.resolve()?;
    let program = ExternalProgram::from_config(&args.program, &config);
    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(capture_file_name(
            &dataset_name(&args.program),
            args.n,
            config.seed,
        ))
    });
    let executions = capture_to_file(&program, args.n, &config, &output)?;
    println!(
        "n={}: {} execution(s) saved to {}",
        args.n,
        executions,
        output.display()
    );
    Ok(())
}

fn median_command(args: MedianArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tables = args
        .inputs
        .iter()
        .map(TimingTable::load)
        .collect::<Result<Vec<_>, _>>()?;
    let merged = median_of_tables(&tables)?;
    merged.save(&args.output)?;
    print_table(&merged);
    info!("Median of {} table(s) written to {}", tables.len(), args.output.display());
    Ok(())
}

fn speedup_command(args: SpeedupArgs) -> Result<(), Box<dyn std::error::Error>> {
    let baseline = TimingTable::load(&args.baseline)?;
    let new = TimingTable::load(&args.new)?;
    let speedups = speedup_table(&baseline, &new)?;
    speedups.save(&args.output)?;
    print_table(&speedups);
    info!("Speedups written to {}", args.output.display());
    Ok(())
}

fn cache_command(args: CacheArgs) -> Result<(), Box<dyn std::error::Error>> {
    let profile = load_profile(args.topology.as_deref());
    let thresholds = tier_thresholds(&profile, args.precision, args.kernel.memory_model());
    let summary = serde_json::json!({
        "profile": profile,
        "kernel": args.kernel,
        "precision": args.precision,
        "thresholds": thresholds,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn ratio_command(args: RatioArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ratio = if args.bytes {
        stream_compression_ratio(&fs::read(&args.original)?, &fs::read(&args.compressed)?)?
    } else {
        compression_ratio(&load_signal(&args.original)?, &load_signal(&args.compressed)?)?
    };
    println!("Relacion de compresion: {:.4}", ratio);
    Ok(())
}
