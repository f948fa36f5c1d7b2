use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use arclift::Config;
use arclift::archive::{ArchiveInspector, ObjectFetcher};
use arclift::cache::TreeCache;
use arclift::s3::TransferMetrics;
use arclift::shell::commands::tree::render;
use arclift::shell::commands::upload::{print_summary, upload_file};
use arclift::shell::{Backend, ShellState, connect_client};
use arclift::tree::{NodePath, TreeNode, TreeView};

#[derive(Parser)]
#[command(
    name = "arclift",
    version,
    about = "Upload exported archives in parts and browse their contents"
)]
struct Cli {
    /// Bucket receiving uploads
    #[arg(long, global = true, env = "ARCLIFT_BUCKET")]
    bucket: Option<String>,

    /// Part size in bytes
    #[arg(long, global = true)]
    chunk_size: Option<u64>,

    /// S3 provider preset (aws, localstack)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Custom S3 endpoint URL
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    #[arg(long, global = true)]
    region: Option<String>,

    /// Keep uploads in memory instead of sending them to S3
    #[arg(long, global = true)]
    dry_run: bool,

    /// Reject archives that declare a name as both file and directory
    #[arg(long, global = true)]
    strict: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to <config dir>/arclift/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local archive
    Upload { file: PathBuf },
    /// Print the directory tree of an uploaded archive
    Inspect {
        locator: String,
        /// Expand directories down to this depth
        #[arg(long, default_value_t = 1)]
        depth: usize,
    },
    /// Start the interactive shell (default)
    Shell,
}

impl Cli {
    /// Reject flag combinations that cannot do anything useful
    fn check_flags(&self) -> Result<()> {
        if self.dry_run && matches!(self.command, Some(Commands::Inspect { .. })) {
            bail!("inspect reads uploaded objects from S3 and does not support --dry-run");
        }
        Ok(())
    }

    /// File configuration with command line overrides applied
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(bucket) = &self.bucket {
            config.bucket = Some(bucket.clone());
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size_bytes = chunk_size;
        }
        if let Some(provider) = &self.provider {
            config.provider = provider.clone();
        }
        if let Some(endpoint) = &self.endpoint_url {
            config.endpoint_url = Some(endpoint.clone());
        }
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("arclift=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    cli.check_flags()?;
    let config = cli.load_config()?;
    if cli.dry_run {
        tracing::info!("dry run: uploads are kept in memory");
    }

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Upload { file } => {
            let backend = connect(&config, cli.dry_run).await?;
            let metrics = TransferMetrics::new();
            let outcome = upload_file(
                backend.gateway,
                backend.auth,
                config.chunk_size_bytes,
                Some(Arc::clone(&metrics)),
                &file,
            )
            .await?;
            print_summary(&outcome, &metrics);
            Ok(())
        }
        Commands::Inspect { locator, depth } => {
            // Inspecting needs no upload bucket
            let fetcher: Arc<dyn ObjectFetcher> = connect_client(&config).await?;
            let inspector = ArchiveInspector::new(fetcher, TreeCache::new(1))
                .with_strict_conflicts(cli.strict);
            let tree = inspector.inspect(&locator).await?;

            let mut view = TreeView::new();
            expand_to_depth(&mut view, &tree, &NodePath::root(), depth);

            println!("{}", locator.bold());
            for line in render(&view, &tree) {
                println!("{line}");
            }
            println!(
                "{} files, {} directories",
                tree.file_count(),
                tree.dir_count()
            );
            Ok(())
        }
        Commands::Shell => {
            let backend = connect(&config, cli.dry_run).await?;
            run_shell(ShellState::new(config, backend, cli.strict)).await
        }
    }
}

async fn connect(config: &Config, dry_run: bool) -> Result<Backend> {
    if dry_run {
        Ok(Backend::in_memory())
    } else {
        Backend::connect(config).await
    }
}

/// Expand every directory whose depth below the root is less than `depth`
fn expand_to_depth(view: &mut TreeView, node: &TreeNode, path: &NodePath, depth: usize) {
    if depth <= 1 {
        return;
    }
    for (name, child) in node.list().filter(|(_, c)| c.is_dir()) {
        let child_path = path.child(name);
        view.expand_to(&child_path.key());
        expand_to_depth(view, child, &child_path, depth - 1);
    }
}

async fn run_shell(mut state: ShellState) -> Result<()> {
    println!("{}", "=".repeat(60).cyan());
    println!("{}", "  arclift - archive upload shell".bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    println!();
    println!("Type 'help' for available commands or 'exit' to quit");
    println!();

    let mut rl = DefaultEditor::new().context("Failed to start line editor")?;

    let history_file = dirs::home_dir().map(|mut p| {
        p.push(".arclift_history");
        p
    });

    if let Some(path) = &history_file {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = state.prompt();

        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                if let Err(e) = state.execute(&line).await {
                    if e.to_string() == "exit" {
                        break;
                    }
                    eprintln!("{} {:#}", "Error:".red().bold(), e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("exit");
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".red().bold(), err);
                break;
            }
        }
    }

    if let Some(path) = &history_file {
        let _ = rl.save_history(path);
    }

    println!("Goodbye!");
    Ok(())
}
