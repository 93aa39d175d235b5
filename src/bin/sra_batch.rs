use std::io;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use sra_batch_assembler::app::{App, RunSummary};
use sra_batch_assembler::config::RunConfig;
use sra_batch_assembler::cpg;
use sra_batch_assembler::dinuc;
use sra_batch_assembler::error::PipelineError;
use sra_batch_assembler::fasta::FastaReader;
use sra_batch_assembler::ledger::Ledger;
use sra_batch_assembler::output::JsonOutput;
use sra_batch_assembler::tools::SystemToolRunner;

#[derive(Parser)]
#[command(name = "sra-batch")]
#[command(about = "Resumable batch download, validation and de-novo assembly of SRA accessions")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Process an accession list through the download/assembly pipeline")]
    Run(RunArgs),
    #[command(about = "Dinucleotide odds-ratio table for a multi-FASTA file")]
    DinucOdds(DinucArgs),
    #[command(about = "Sliding-window CpG observed/expected ratios for a FASTA file")]
    SlidingCpg(CpgArgs),
}

#[derive(Args)]
struct RunArgs {
    accession_list: Utf8PathBuf,

    #[arg(long)]
    output: Option<Utf8PathBuf>,

    #[arg(long)]
    scratch: Option<Utf8PathBuf>,

    #[arg(long)]
    max_retries: Option<u32>,

    #[arg(long)]
    threads: Option<u32>,

    #[arg(long)]
    mem: Option<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DinucArgs {
    input: Utf8PathBuf,
}

#[derive(Args)]
struct CpgArgs {
    input: Utf8PathBuf,

    #[arg(short = 'w', long, default_value_t = cpg::DEFAULT_WINDOW)]
    window: usize,

    #[arg(short = 's', long, default_value_t = cpg::DEFAULT_STEP)]
    step: usize,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(pipeline) = report.downcast_ref::<PipelineError>() {
            return ExitCode::from(map_exit_code(pipeline));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PipelineError) -> u8 {
    match error {
        PipelineError::InvalidAccession(_)
        | PipelineError::AccessionList { .. }
        | PipelineError::InvalidEnvVar { .. }
        | PipelineError::FastaRead { .. }
        | PipelineError::InvalidWindow => 2,
        PipelineError::ToolLaunch { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_batch(args),
        Commands::DinucOdds(args) => run_dinuc(args),
        Commands::SlidingCpg(args) => run_sliding_cpg(args),
    }
}

fn run_batch(args: RunArgs) -> miette::Result<()> {
    let mut config = RunConfig::from_env().into_diagnostic()?;
    if let Some(output) = args.output {
        config.output_root = output;
    }
    if let Some(scratch) = args.scratch {
        config.scratch_root = scratch;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(mem) = args.mem {
        config.memory = mem;
    }

    let ledger = Ledger::open(&config.output_root).into_diagnostic()?;
    let app = App::new(config, ledger, SystemToolRunner);
    let summary = app.run(&args.accession_list).into_diagnostic()?;

    if args.json {
        JsonOutput::print_run(&summary).into_diagnostic()?;
    } else {
        print_run_summary(&summary);
    }
    Ok(())
}

fn print_run_summary(summary: &RunSummary) {
    println!("accessions resolved: {}", summary.total());
    println!("  completed: {}", summary.completed.len());
    println!("  failed:    {}", summary.failed.len());
    println!("  skipped:   {}", summary.skipped.len());
    for accession in &summary.failed {
        println!("  failed accession: {accession}");
    }
}

fn run_dinuc(args: DinucArgs) -> miette::Result<()> {
    let reader = FastaReader::open(&args.input).into_diagnostic()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    dinuc::write_table(&mut out, reader).into_diagnostic()?;
    Ok(())
}

fn run_sliding_cpg(args: CpgArgs) -> miette::Result<()> {
    let mut reader = FastaReader::open(&args.input).into_diagnostic()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    while let Some(record) = reader.read_next().into_diagnostic()? {
        let windows = cpg::sliding_cpg(&record.seq, args.window, args.step).into_diagnostic()?;
        cpg::write_windows(&mut out, &windows).into_diagnostic()?;
    }
    Ok(())
}
