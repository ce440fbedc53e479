use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_genome_tools::app::{App, ProgressSink};
use kira_genome_tools::config::{
    ConvertOptions, DatabaseConfig, DownloadOptions, GENOMIC_DATABASE_ENV, InitOptions,
};
use kira_genome_tools::domain::{
    AssemblyPaths, GenomeAccession, GenomePaths, LocusTagPrefix, PrefixMapping,
};
use kira_genome_tools::error::KiraError;
use kira_genome_tools::ncbi::NcbiHttpClient;
use kira_genome_tools::output::{JsonOutput, LogProgress, OutputMode};

#[derive(Parser)]
#[command(name = "kira-gt")]
#[command(about = "Genome database curation: NCBI assemblies, locus tag renaming, OrthoFinder staging")]
#[command(version, author)]
struct Cli {
    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Symlink protein fastas into {database}/OrthoFinder/fastas")]
    InitOrthofinder(InitArgs),
    #[command(about = "Download the fna/gbk/gff triplet of an NCBI assembly")]
    Download(DownloadArgs),
    #[command(about = "Rename locus tags and derive ffn/faa from a downloaded assembly")]
    Convert(ConvertArgs),
    #[command(about = "Download an NCBI assembly and convert it in one step")]
    DownloadAndConvert(DownloadAndConvertArgs),
}

#[derive(Args)]
struct InitArgs {
    /// Genome database root (defaults to $GENOMIC_DATABASE)
    #[arg(long)]
    database_dir: Option<String>,

    /// Also link genomes marked as ignored
    #[arg(long)]
    include_ignored: bool,

    #[arg(long)]
    skip_sanity_check: bool,

    #[arg(long)]
    representatives_only: bool,
}

#[derive(Args)]
struct DownloadArgs {
    assembly: String,

    #[arg(long, default_value = ".")]
    out_dir: String,

    /// Download again even if the files exist
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct ConvertArgs {
    #[arg(long)]
    raw_fna: String,
    #[arg(long)]
    raw_gbk: String,
    #[arg(long)]
    raw_gff: String,

    #[arg(long)]
    out_fna: String,
    #[arg(long)]
    out_gbk: String,
    #[arg(long)]
    out_gff: String,
    #[arg(long)]
    out_ffn: String,
    #[arg(long)]
    out_faa: String,

    #[arg(long)]
    old_locus_tag_prefix: String,
    #[arg(long)]
    new_locus_tag_prefix: String,

    #[arg(long)]
    no_validate: bool,

    /// Overwrite existing output files
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct DownloadAndConvertArgs {
    assembly: String,

    #[arg(long)]
    new_locus_tag_prefix: String,

    /// Detected from the GenBank locus tags when omitted
    #[arg(long)]
    old_locus_tag_prefix: Option<String>,

    #[arg(long, default_value = ".")]
    out_dir: String,

    #[arg(long)]
    no_validate: bool,

    #[arg(long)]
    force: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::MissingEnvConfig
        | KiraError::DestinationNotEmpty(_)
        | KiraError::MissingInputFile(_)
        | KiraError::OutputExists(_) => 2,
        KiraError::NcbiHttp(_) | KiraError::NcbiStatus { .. } => 3,
        KiraError::Validation { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match cli.command {
        Commands::InitOrthofinder(args) => run_init(args, output_mode),
        Commands::Download(args) => run_download(args, output_mode),
        Commands::Convert(args) => run_convert(args, output_mode),
        Commands::DownloadAndConvert(args) => run_download_and_convert(args, output_mode),
    }
}

fn sink_for(output_mode: OutputMode) -> &'static dyn ProgressSink {
    match output_mode {
        OutputMode::Human => &LogProgress,
        OutputMode::Json => &JsonOutput,
    }
}

fn run_init(args: InitArgs, output_mode: OutputMode) -> miette::Result<()> {
    let config = DatabaseConfig::resolve(
        args.database_dir.as_deref(),
        std::env::var(GENOMIC_DATABASE_ENV).ok(),
    )?;
    let options = InitOptions {
        skip_ignored: !args.include_ignored,
        sanity_check: !args.skip_sanity_check,
        representatives_only: args.representatives_only,
    };
    let app = App::new(NcbiHttpClient::new()?);

    match output_mode {
        OutputMode::Human => {
            let mut stdout = std::io::stdout();
            app.init_orthofinder(&config, &options, &mut stdout, sink_for(output_mode))?;
            Ok(())
        }
        OutputMode::Json => {
            let mut stderr = std::io::stderr();
            let result =
                app.init_orthofinder(&config, &options, &mut stderr, sink_for(output_mode))?;
            JsonOutput::print_init(&result).into_diagnostic()
        }
    }
}

fn run_download(args: DownloadArgs, output_mode: OutputMode) -> miette::Result<()> {
    let accession: GenomeAccession = args.assembly.parse()?;
    let app = App::new(NcbiHttpClient::new()?);
    let result = app.download(
        &accession,
        &Utf8PathBuf::from(args.out_dir),
        DownloadOptions { force: args.force },
        sink_for(output_mode),
    )?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_download(&result).into_diagnostic(),
        OutputMode::Human => {
            println!("{}", result.fna);
            println!("{}", result.gbk);
            println!("{}", result.gff);
            Ok(())
        }
    }
}

fn run_convert(args: ConvertArgs, output_mode: OutputMode) -> miette::Result<()> {
    let raw = AssemblyPaths {
        fna: args.raw_fna.into(),
        gbk: args.raw_gbk.into(),
        gff: args.raw_gff.into(),
    };
    let outputs = GenomePaths {
        fna: args.out_fna.into(),
        gbk: args.out_gbk.into(),
        gff: args.out_gff.into(),
        ffn: args.out_ffn.into(),
        faa: args.out_faa.into(),
    };
    let old: LocusTagPrefix = args.old_locus_tag_prefix.parse()?;
    let new: LocusTagPrefix = args.new_locus_tag_prefix.parse()?;
    let mapping = PrefixMapping::new(old, new)?;
    let options = ConvertOptions {
        validate: !args.no_validate,
        force: args.force,
    };

    let app = App::new(NcbiHttpClient::new()?);
    let result = app.convert(&raw, &outputs, &mapping, options, sink_for(output_mode))?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_convert(&result).into_diagnostic(),
        OutputMode::Human => {
            print_outputs(&outputs);
            Ok(())
        }
    }
}

fn run_download_and_convert(
    args: DownloadAndConvertArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let accession: GenomeAccession = args.assembly.parse()?;
    let new: LocusTagPrefix = args.new_locus_tag_prefix.parse()?;
    let old = args
        .old_locus_tag_prefix
        .map(|value| value.parse::<LocusTagPrefix>())
        .transpose()?;
    let out_dir = Utf8PathBuf::from(args.out_dir);
    let outputs = GenomePaths::in_dir(&out_dir, new.file_stem());

    let app = App::new(NcbiHttpClient::new()?);
    let result = app.download_and_convert(
        &accession,
        new,
        old,
        &out_dir,
        DownloadOptions { force: args.force },
        ConvertOptions {
            validate: !args.no_validate,
            force: args.force,
        },
        sink_for(output_mode),
    )?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_download_and_convert(&result).into_diagnostic(),
        OutputMode::Human => {
            print_outputs(&outputs);
            Ok(())
        }
    }
}

fn print_outputs(outputs: &GenomePaths) {
    for (kind, path) in outputs.all() {
        println!("{kind}\t{path}");
    }
}
