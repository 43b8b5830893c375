//! md2nb: CLI tool to convert Markdown files to Jupyter notebooks

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use config::{CONFIG_FILE_NAME, Config};
use md2nb_batch::{
    BatchOptions, DEFAULT_INPUT_EXTENSIONS, DEFAULT_OUTPUT_EXTENSION, MarkdownCollection,
    convert_collection, convert_file, decode_markdown, output_path_for, same_path,
};
use md2nb_core::{convert, write_notebook};

/// Placeholder path meaning stdin (as input) or stdout (as output)
const STDIO_PATH: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "md2nb")]
#[command(about = "Convert Markdown files to Jupyter notebooks, one cell per top-level heading")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "Examples:
  md2nb notes.md                    # Convert single file to notes.ipynb
  md2nb notes.md -o out.ipynb       # Convert to specific output file
  md2nb docs/ -o notebooks/ -r      # Convert directory recursively
  md2nb docs/ -o notebooks/ -j4     # Use 4 parallel jobs
  cat notes.md | md2nb > notes.ipynb
  md2nb init                        # Write a sample _md2nb.toml")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    convert: ConvertArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a sample configuration file
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input Markdown file or directory ("-" or omitted: read stdin)
    input: Option<PathBuf>,

    /// Output file or directory ("-": write stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of parallel jobs (defaults to number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Process directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Configuration file (defaults to ./_md2nb.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Path of the configuration file to write
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    output: PathBuf,

    /// Print the configuration JSON schema to stdout instead
    #[arg(long)]
    schema: bool,

    /// Overwrite an existing file
    #[arg(short, long)]
    force: bool,
}

/// Settings merged from command-line flags, config file and defaults
#[derive(Debug)]
struct Settings {
    output_extension: String,
    input_extensions: Vec<String>,
    recursive: bool,
    jobs: Option<usize>,
    quiet: bool,
}

impl Settings {
    fn resolve(args: &ConvertArgs, config: Config) -> Result<Self> {
        if args.jobs == Some(0) {
            anyhow::bail!("--jobs must be at least 1");
        }
        Ok(Self {
            output_extension: config
                .output
                .extension
                .unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string()),
            input_extensions: config.input.extensions.unwrap_or_else(|| {
                DEFAULT_INPUT_EXTENSIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            }),
            recursive: args.recursive || config.input.recursive.unwrap_or(false),
            jobs: args.jobs.or(config.batch.jobs),
            quiet: args.quiet,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Init(args)) => {
            init_logging(false, false);
            run_init(&args)
        }
        None => {
            init_logging(cli.convert.verbose, cli.convert.quiet);
            run_convert(&cli.convert)
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the level picked by the flags
fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run_convert(args: &ConvertArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let settings = Settings::resolve(args, config)?;

    let input = args.input.as_deref().filter(|p| !is_stdio(p));

    match input {
        None => convert_stdin(args.output.as_deref(), &settings),
        Some(path) if path.is_file() => convert_single(path, args.output.as_deref(), &settings),
        Some(path) if path.is_dir() => convert_directory(path, args.output.as_deref(), &settings),
        Some(path) => anyhow::bail!("Input path does not exist: {}", path.display()),
    }
}

/// Load the explicit config file, or `_md2nb.toml` from the current directory
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        log::debug!("Using configuration file: {}", path.display());
        return Config::load(path);
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    match Config::load_from_dir(&cwd)? {
        Some(config) => {
            log::debug!("Using configuration file: {}", cwd.join(CONFIG_FILE_NAME).display());
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

fn is_stdio(path: &Path) -> bool {
    path == Path::new(STDIO_PATH)
}

/// Convert Markdown read from stdin
fn convert_stdin(output: Option<&Path>, settings: &Settings) -> Result<()> {
    let mut bytes = Vec::new();
    io::stdin()
        .read_to_end(&mut bytes)
        .context("Failed to read stdin")?;
    let text = decode_markdown(bytes, Path::new("<stdin>"))?;

    match output.filter(|p| !is_stdio(p)) {
        None => write_stdout(&text),
        Some(path) => {
            write_file(&text, path)?;
            if !settings.quiet {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

/// Convert a single Markdown file
fn convert_single(input: &Path, output: Option<&Path>, settings: &Settings) -> Result<()> {
    if let Some(out) = output
        && is_stdio(out)
    {
        let bytes =
            fs::read(input).with_context(|| format!("Failed to read: {}", input.display()))?;
        let text = decode_markdown(bytes, input)?;
        return write_stdout(&text);
    }

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => output_path_for(input, &settings.output_extension),
    };

    if same_path(&output_path, input) {
        anyhow::bail!(
            "Output would overwrite the input file: {}",
            input.display()
        );
    }

    let summary = convert_file(input, &output_path)
        .with_context(|| format!("Failed to convert: {}", input.display()))?;

    log::info!(
        "Converted {} -> {} ({} cells)",
        input.display(),
        summary.output.display(),
        summary.cells
    );

    if !settings.quiet {
        println!("{}", summary.output.display());
    }

    Ok(())
}

/// Convert a directory of Markdown files
fn convert_directory(input: &Path, output: Option<&Path>, settings: &Settings) -> Result<()> {
    let output_dir = output.unwrap_or(input);

    let collection =
        MarkdownCollection::from_directory(input, &settings.input_extensions, settings.recursive)
            .with_context(|| format!("Failed to read directory: {}", input.display()))?;

    if collection.files.is_empty() {
        log::warn!("No Markdown files found in {}", input.display());
        return Ok(());
    }

    log::debug!("Found {} Markdown files", collection.files.len());

    let options = BatchOptions {
        output_dir: output_dir.to_path_buf(),
        output_extension: settings.output_extension.clone(),
        parallel_jobs: settings.jobs,
    };
    let result = convert_collection(&collection, &options)?;

    if !settings.quiet {
        for summary in &result.output_files {
            println!("{}", summary.output.display());
        }
    }

    for (file, e) in &result.failed_files {
        log::error!("Error converting {}: {}", file.display(), e);
    }

    let failed_count = result.failed_files.len();
    log::info!(
        "Converted {} files, {} failed",
        result.success_count,
        failed_count
    );

    if failed_count > 0 {
        anyhow::bail!("{} files failed to convert", failed_count);
    }

    Ok(())
}

/// Convert text and write the notebook to a file
fn write_file(text: &str, path: &Path) -> Result<()> {
    let bytes = md2nb_core::markdown_to_ipynb(text)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write: {}", path.display()))
}

/// Convert text and write the notebook to stdout
fn write_stdout(text: &str) -> Result<()> {
    let notebook = convert(text);
    let mut stdout = io::stdout().lock();
    write_notebook(&notebook, &mut stdout)?;
    stdout.flush().context("Failed to write stdout")?;
    log::debug!("Wrote notebook with {} cells to stdout", notebook.cells.len());
    Ok(())
}

/// Write a sample configuration file, or print the JSON schema
fn run_init(args: &InitArgs) -> Result<()> {
    if args.schema {
        println!("{}", Config::json_schema_string()?);
        return Ok(());
    }

    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.output.display()
        );
    }

    let content = Config::sample().to_toml_with_schema()?;
    fs::write(&args.output, content)
        .with_context(|| format!("Failed to write: {}", args.output.display()))?;

    println!("{}", args.output.display());
    Ok(())
}
