use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use cvrp3l_gen::batch::load_folders;
use cvrp3l_gen::cleanup::{clean_subfolders, CleanupOptions};
use cvrp3l_gen::export::ensure_dir;
use cvrp3l_gen::parser::MarkerMatching;
use cvrp3l_gen::tables::calculate_bounds;
use cvrp3l_gen::utils::{format_duration, human_bytes};
use cvrp3l_gen::{
    DedupKey, ExportFormat, GenerationSummary, InstanceGenerator, InstanceTables, NodeStyle,
    ParserOptions, RouteExporter, SamplerConfig,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse dataset folders and write the CSV tables
    Tables {
        #[command(flatten)]
        source: SourceArgs,

        /// Directory receiving the tables
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Sample feasible routes and write one artifact per route
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        sampler: SamplerArgs,

        /// Base directory; routes go to `<output>/RandomData_<m>_<a>_<t>/input`
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,
    },
    /// Write every instance as one artifact holding all its customers
    Transform {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Compact)]
        format: FormatArg,
    },
    /// Delete the files of all input/output folders below a directory
    Clean {
        root: PathBuf,

        /// Folder names to empty, case-insensitive
        #[arg(long, num_args = 1.., default_values = ["input", "output"])]
        targets: Vec<String>,

        #[arg(short, long)]
        workers: Option<usize>,

        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        include_symlinks: bool,

        #[arg(long)]
        prune_empty_dirs: bool,
    },
}

/// Where instances come from: dataset folders or previously written tables.
#[derive(Args)]
struct SourceArgs {
    /// Dataset folders holding instance text files
    #[arg(long, num_args = 1.., required_unless_present = "tables")]
    data: Vec<PathBuf>,

    /// Directory holding CSV tables written by the `tables` command
    #[arg(long, conflicts_with = "data")]
    tables: Option<PathBuf>,

    /// File name prefix of the CSV tables
    #[arg(long, default_value = "instances")]
    prefix: String,

    /// Only use these instances
    #[arg(long, num_args = 1..)]
    instances: Vec<String>,

    /// Match section keywords anywhere in a line
    #[arg(long)]
    substring_markers: bool,
}

#[derive(Args)]
struct SamplerArgs {
    /// JSON file with sampler settings; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    multiplier: Option<usize>,

    #[arg(long)]
    attempt_limit: Option<usize>,

    #[arg(long)]
    threshold: Option<usize>,

    #[arg(long)]
    min_customers: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    dedup: Option<DedupArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Compact,
    Text,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => ExportFormat::Json(NodeStyle::Full),
            FormatArg::Compact => ExportFormat::Json(NodeStyle::Compact),
            FormatArg::Text => ExportFormat::Text,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DedupArg {
    Combination,
    Sequence,
}

impl From<DedupArg> for DedupKey {
    fn from(dedup: DedupArg) -> Self {
        match dedup {
            DedupArg::Combination => DedupKey::Combination,
            DedupArg::Sequence => DedupKey::Sequence,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Tables { source, output } => {
            let tables = load_source(&source)?;
            ensure_dir(&output)?;
            tables.write_csv(&output, &source.prefix)?;
            for summary in &tables.instances {
                let (upper_bound, max_customers) = calculate_bounds(summary);
                info!(
                    "{}: {} customers, at most {} per route by lower bounds",
                    summary.instance_name, max_customers, upper_bound
                );
            }
        }
        Commands::Generate {
            source,
            sampler,
            output,
            format,
        } => {
            let tables = load_source(&source)?;
            let config = sampler_config(&sampler)?;
            generate(&tables, &source, config, format.into(), &output)?;
        }
        Commands::Transform { source, output, format } => {
            let tables = load_source(&source)?;
            ensure_dir(&output)?;
            let exporter = ExportFormat::from(format).exporter();
            for name in selected_instances(&tables, &source) {
                let view = tables.view(&name)?;
                let path = exporter.write_transform(&view, &output)?;
                info!("Wrote {:?}", path);
            }
        }
        Commands::Clean {
            root,
            targets,
            workers,
            dry_run,
            include_symlinks,
            prune_empty_dirs,
        } => {
            let mut options = CleanupOptions::new()
                .with_targets(targets)
                .with_dry_run(dry_run)
                .with_include_symlinks(include_symlinks)
                .with_prune_empty_dirs(prune_empty_dirs);
            if let Some(workers) = workers {
                options = options.with_workers(workers);
            }

            let report = clean_subfolders(&root, &options)?;
            println!(
                "{} target folders, {} files, {} {} ({}), {} failed, {} folders pruned",
                report.matched_dirs,
                report.files,
                if dry_run { "would delete" } else { "deleted" },
                report.deleted,
                human_bytes(report.bytes_freed),
                report.failed,
                report.pruned_dirs
            );
        }
    }

    Ok(())
}

fn load_source(source: &SourceArgs) -> Result<InstanceTables, Box<dyn std::error::Error>> {
    if let Some(dir) = &source.tables {
        return Ok(InstanceTables::read_csv(dir, &source.prefix)?);
    }

    let matching = if source.substring_markers {
        MarkerMatching::Substring
    } else {
        MarkerMatching::LeadingToken
    };
    let options = ParserOptions::new().with_matching(matching);
    let (tables, report) = load_folders(&source.data, &options)?;
    for failure in &report.failures {
        warn!("{:?}: {}", failure.path, failure.error);
    }
    Ok(tables)
}

fn selected_instances(tables: &InstanceTables, source: &SourceArgs) -> Vec<String> {
    if source.instances.is_empty() {
        tables.instance_names().map(String::from).collect()
    } else {
        source.instances.clone()
    }
}

fn sampler_config(args: &SamplerArgs) -> Result<SamplerConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => SamplerConfig::new(),
    };

    if let Some(multiplier) = args.multiplier {
        config = config.with_multiplier_customer_number(multiplier);
    }
    if let Some(limit) = args.attempt_limit {
        config = config.with_attempt_limit(limit);
    }
    if let Some(threshold) = args.threshold {
        config = config.with_successful_instances_threshold(threshold);
    }
    if let Some(min_customers) = args.min_customers {
        config = config.with_min_customers(min_customers);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(dedup) = args.dedup {
        config = config.with_dedup(dedup.into());
    }
    Ok(config)
}

fn generate(
    tables: &InstanceTables,
    source: &SourceArgs,
    config: SamplerConfig,
    format: ExportFormat,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let run_folder = config.run_folder_name();
    let input_dir = output.join(&run_folder).join("input");
    ensure_dir(&input_dir)?;
    ensure_dir(&output.join(&run_folder).join("output"))?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut total = GenerationSummary::default();
    for name in selected_instances(tables, source) {
        let view = tables.view(&name)?;
        let mut generator = InstanceGenerator::new(view, config.clone(), format);
        total += generator.run(&mut rng, &input_dir)?;
    }

    println!(
        "{} - Created instances: {} and avoided {} duplicates in {}",
        run_folder,
        total.created,
        total.duplicates,
        format_duration(start_time.elapsed())
    );
    Ok(())
}
