pub mod commands;

use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::sync::Arc;

use crate::Config;
use crate::archive::{ArchiveInspector, ObjectFetcher};
use crate::cache::TreeCache;
use crate::gateway::memory::MemoryGateway;
use crate::gateway::s3::S3Gateway;
use crate::gateway::{AuthToken, UploadGateway};
use crate::providers::ProviderRegistry;
use crate::s3::{S3Client, TransferMetrics};
use crate::tree::{NodePath, TreeNode, TreeView};
use commands::Command;

/// Where uploads go and where archives are fetched from
#[derive(Clone)]
pub struct Backend {
    pub gateway: Arc<dyn UploadGateway>,
    pub fetcher: Arc<dyn ObjectFetcher>,
    /// Credential presented on every gateway call
    pub auth: AuthToken,
}

impl Backend {
    /// S3 backend for the provider, bucket and prefix in `config`
    pub async fn connect(config: &Config) -> Result<Self> {
        let bucket = config.require_bucket()?.to_string();
        let client = connect_client(config).await?;
        tracing::debug!(%bucket, "S3 backend ready");

        // S3 requests are signed by the SDK credential chain, not the token
        let gateway = S3Gateway::new(Arc::clone(&client), bucket, config.key_prefix.clone());

        Ok(Backend {
            gateway: Arc::new(gateway),
            fetcher: client,
            auth: AuthToken::anonymous(),
        })
    }

    /// Backend that keeps uploaded objects in this process (`--dry-run`)
    pub fn in_memory() -> Self {
        let gateway = Arc::new(MemoryGateway::new());

        Backend {
            gateway: gateway.clone(),
            fetcher: gateway,
            auth: AuthToken::anonymous(),
        }
    }
}

/// S3 client for the provider named in `config`
pub async fn connect_client(config: &Config) -> Result<Arc<S3Client>> {
    let provider_config = ProviderRegistry::new().resolve(config).await?;
    let client = S3Client::from_provider(provider_config)
        .await
        .context("Failed to initialize S3 client")?;
    tracing::debug!(provider = %config.provider, region = client.region(), "S3 client ready");
    Ok(Arc::new(client))
}

/// An inspected archive and the shell's position inside it
pub struct OpenArchive {
    pub locator: String,
    pub tree: Arc<TreeNode>,
    pub view: TreeView,
    pub cwd: NodePath,
}

impl OpenArchive {
    pub fn new(locator: String, tree: Arc<TreeNode>) -> Self {
        OpenArchive {
            locator,
            tree,
            view: TreeView::new(),
            cwd: NodePath::root(),
        }
    }

    /// Resolve `arg` against the current directory
    pub fn resolve(&self, arg: &str) -> NodePath {
        self.cwd.join(arg)
    }

    /// Short name of the archive for prompts
    pub fn display_name(&self) -> &str {
        self.locator.rsplit('/').next().unwrap_or(&self.locator)
    }
}

/// Shell state - tracks the open archive and provides command execution
pub struct ShellState {
    config: Config,
    backend: Backend,
    inspector: ArchiveInspector,
    metrics: Arc<TransferMetrics>,
    archive: Option<OpenArchive>,
    last_upload: Option<String>,
    commands: HashMap<String, Arc<dyn Command>>,
}

impl ShellState {
    /// Create a new shell state over `backend`
    pub fn new(config: Config, backend: Backend, strict: bool) -> Self {
        let inspector = ArchiveInspector::new(
            Arc::clone(&backend.fetcher),
            TreeCache::new(config.cache_capacity),
        )
        .with_strict_conflicts(strict);

        let mut state = ShellState {
            config,
            backend,
            inspector,
            metrics: TransferMetrics::new(),
            archive: None,
            last_upload: None,
            commands: HashMap::new(),
        };

        state.register_command(Arc::new(commands::upload::UploadCommand));
        state.register_command(Arc::new(commands::open::OpenCommand));
        state.register_command(Arc::new(commands::ls::LsCommand));
        state.register_command(Arc::new(commands::cd::CdCommand));
        state.register_command(Arc::new(commands::toggle::ToggleCommand));
        state.register_command(Arc::new(commands::tree::TreeCommand));

        state
    }

    /// Register a command
    pub fn register_command(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Execute a command line
    pub async fn execute(&mut self, line: &str) -> Result<()> {
        let parts = Self::parse_command_line(line.trim())?;

        if parts.is_empty() {
            return Ok(());
        }

        let cmd_name = &parts[0];
        let args = &parts[1..];

        // Check for built-in commands first
        match cmd_name.as_str() {
            "exit" | "quit" => {
                return Err(anyhow!("exit"));
            }
            "help" => {
                self.print_help();
                return Ok(());
            }
            "pwd" => {
                println!("{}", self.current_path());
                return Ok(());
            }
            _ => {}
        }

        if let Some(command) = self.commands.get(cmd_name) {
            let cmd = Arc::clone(command);
            cmd.execute(self, args).await
        } else {
            Err(anyhow!("Unknown command: {cmd_name}"))
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<dyn UploadGateway> {
        &self.backend.gateway
    }

    pub fn auth(&self) -> &AuthToken {
        &self.backend.auth
    }

    pub fn inspector(&self) -> &ArchiveInspector {
        &self.inspector
    }

    pub fn metrics(&self) -> &Arc<TransferMetrics> {
        &self.metrics
    }

    pub fn archive(&self) -> Option<&OpenArchive> {
        self.archive.as_ref()
    }

    /// The open archive, or an error telling the user to open one
    pub fn require_archive(&self) -> Result<&OpenArchive> {
        self.archive
            .as_ref()
            .ok_or_else(|| anyhow!("No archive open. Use 'open LOCATOR' first"))
    }

    pub fn require_archive_mut(&mut self) -> Result<&mut OpenArchive> {
        self.archive
            .as_mut()
            .ok_or_else(|| anyhow!("No archive open. Use 'open LOCATOR' first"))
    }

    pub fn set_archive(&mut self, archive: OpenArchive) {
        self.archive = Some(archive);
    }

    /// Locator of the most recent successful upload in this session
    pub fn last_upload(&self) -> Option<&str> {
        self.last_upload.as_deref()
    }

    pub fn set_last_upload(&mut self, locator: String) {
        self.last_upload = Some(locator);
    }

    /// Current directory inside the open archive
    pub fn current_path(&self) -> NodePath {
        self.archive
            .as_ref()
            .map(|a| a.cwd.clone())
            .unwrap_or_else(NodePath::root)
    }

    /// Print help message
    fn print_help(&self) {
        println!("Available commands:");
        let mut names: Vec<_> = self.commands.keys().collect();
        names.sort();
        for name in names {
            if let Some(command) = self.commands.get(name) {
                println!("  {}", command.usage());
            }
        }
        println!("  pwd - Print current directory inside the open archive");
        println!("  help - Show this help");
        println!("  exit/quit - Exit the shell");
        println!();
        println!("Providers (current: {}):", self.config.provider);
        for line in ProviderRegistry::new().describe() {
            println!("  {line}");
        }
    }

    /// Get the prompt string
    pub fn prompt(&self) -> String {
        match &self.archive {
            Some(archive) => format!("arclift:{}:{} $ ", archive.display_name(), archive.cwd),
            None => "arclift $ ".to_string(),
        }
    }

    /// Parse command line respecting quotes (both single and double)
    pub fn parse_command_line(line: &str) -> Result<Vec<String>> {
        let mut args = Vec::new();
        let mut current_arg = String::new();
        let mut in_single_quote = false;
        let mut in_double_quote = false;
        let mut escape_next = false;

        for ch in line.chars() {
            if escape_next {
                current_arg.push(ch);
                escape_next = false;
                continue;
            }

            match ch {
                '\\' if !in_single_quote => {
                    escape_next = true;
                }
                '\'' if !in_double_quote => {
                    in_single_quote = !in_single_quote;
                }
                '"' if !in_single_quote => {
                    in_double_quote = !in_double_quote;
                }
                ' ' | '\t' if !in_single_quote && !in_double_quote => {
                    if !current_arg.is_empty() {
                        args.push(std::mem::take(&mut current_arg));
                    }
                }
                _ => {
                    current_arg.push(ch);
                }
            }
        }

        if !current_arg.is_empty() {
            args.push(current_arg);
        }

        if in_single_quote {
            return Err(anyhow!("Unclosed single quote"));
        }
        if in_double_quote {
            return Err(anyhow!("Unclosed double quote"));
        }

        Ok(args)
    }
}
