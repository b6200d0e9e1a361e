//! Artifact Registry CLI
//!
//! Browse schemas, terminal profiles and exit codes. The process exits with
//! codes from the taxonomy it serves.

use std::path::PathBuf;
use std::process::ExitCode as ProcessExit;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use artifact_registry::{
    compare_schemas, normalize_schema, ExitCode, ExitCodeCategory, ExitCodeKey, Registry,
    RegistryConfig, RegistryError,
};

#[derive(Parser)]
#[command(name = "registry")]
#[command(about = "Query the artifact registry")]
#[command(version)]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serve documents from this directory instead of the bundled catalog
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schema documents
    #[command(subcommand)]
    Schema(SchemaCommand),

    /// Terminal profiles
    #[command(subcommand)]
    Terminal(TerminalCommand),

    /// Exit-code taxonomy
    #[command(subcommand)]
    ExitCode(ExitCodeCommand),

    /// Configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum SchemaCommand {
    /// List categories, versions of a category, or schemas of a version
    List {
        category: Option<String>,
        version: Option<String>,
    },

    /// Print one document
    Get {
        category: String,
        version: String,
        name: String,
        /// Print the stored checksum instead of the content
        #[arg(long)]
        checksum: bool,
    },

    /// Print a JSON or TOML schema file as canonical JSON
    Normalize { file: PathBuf },

    /// Compare two schema files after normalization
    Compare { left: PathBuf, right: PathBuf },
}

#[derive(Subcommand)]
enum TerminalCommand {
    /// List profile names
    List,

    /// Print one profile
    Get { name: String },

    /// Detect the current terminal from the environment
    Detect,
}

#[derive(Subcommand)]
enum ExitCodeCommand {
    /// List every code
    List {
        /// Only codes in this category (e.g. "networking")
        #[arg(long)]
        category: Option<ExitCodeCategory>,
    },

    /// Show one code by number or name
    Info { key: ExitCodeKey },

    /// Map a code to its simplified mode
    Map {
        key: ExitCodeKey,
        /// Mapping version (defaults to the configured one)
        #[arg(short, long)]
        mapping_version: Option<String>,
    },

    /// Show the taxonomy and mapping versions
    Version,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
}

fn main() -> ProcessExit {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::Usage.into()
            } else {
                ExitCode::Success.into()
            };
        }
    };

    let config = RegistryConfig::load_from(cli.config.as_deref());
    let filter = config
        .as_ref()
        .ok()
        .and_then(|c| c.log_filter.clone())
        .unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let outcome = config
        .map_err(anyhow::Error::from)
        .and_then(|mut config| {
            if cli.data_dir.is_some() {
                config.data_dir = cli.data_dir.clone();
            }
            run(&cli, config)
        });

    match outcome {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<RegistryError>()
                .map(RegistryError::exit_code)
                .unwrap_or(ExitCode::Failure);
            code.into()
        }
    }
}

fn run(cli: &Cli, config: RegistryConfig) -> anyhow::Result<ExitCode> {
    if let Commands::Config(ConfigCommand::Show) = &cli.command {
        print!("{}", toml::to_string_pretty(&config)?);
        if let Some(path) = RegistryConfig::user_config_path() {
            eprintln!("# user config: {}", path.display());
        }
        return Ok(ExitCode::Success);
    }

    let registry = Registry::from_config(&config)?;

    match &cli.command {
        Commands::Schema(command) => run_schema(&registry, command, cli.json),
        Commands::Terminal(command) => run_terminal(&registry, command, cli.json),
        Commands::ExitCode(command) => run_exit_code(&registry, command, cli.json),
        Commands::Config(_) => Ok(ExitCode::Success),
    }
}

fn run_schema(registry: &Registry, command: &SchemaCommand, json: bool) -> anyhow::Result<ExitCode> {
    match command {
        SchemaCommand::List { category, version } => {
            let store = registry.store();
            let names = match (category, version) {
                (None, _) => store.categories(),
                (Some(category), None) => store.versions(category),
                (Some(category), Some(version)) => registry.list_schemas(category, version),
            };
            print_list(&names, json)?;
        }

        SchemaCommand::Get {
            category,
            version,
            name,
            checksum,
        } => {
            let doc = registry.get_schema(category, version, name)?;
            if *checksum {
                println!("{}  {}", doc.checksum, doc.key);
            } else {
                println!("{}", serde_json::to_string_pretty(&doc.content)?);
            }
        }

        SchemaCommand::Normalize { file } => {
            let text = std::fs::read_to_string(file)
                .map_err(RegistryError::from)
                .with_context(|| format!("reading {}", file.display()))?;
            println!("{}", normalize_schema(&text)?);
        }

        SchemaCommand::Compare { left, right } => {
            let a = std::fs::read_to_string(left)
                .map_err(RegistryError::from)
                .with_context(|| format!("reading {}", left.display()))?;
            let b = std::fs::read_to_string(right)
                .map_err(RegistryError::from)
                .with_context(|| format!("reading {}", right.display()))?;
            let comparison = compare_schemas(&a, &b)?;
            if comparison.equal {
                println!("✅ Schemas are equivalent");
            } else {
                println!("❌ Schemas differ");
                println!("--- {}\n{}", left.display(), comparison.left);
                println!("+++ {}\n{}", right.display(), comparison.right);
                return Ok(ExitCode::Failure);
            }
        }
    }
    Ok(ExitCode::Success)
}

fn run_terminal(registry: &Registry, command: &TerminalCommand, json: bool) -> anyhow::Result<ExitCode> {
    match command {
        TerminalCommand::List => {
            let names: Vec<String> = registry.load_terminal_catalog()?.keys().cloned().collect();
            print_list(&names, json)?;
        }

        TerminalCommand::Get { name } => {
            print_value(registry.get_terminal_config(name)?, json)?;
        }

        TerminalCommand::Detect => match registry.terminals()?.detect_current() {
            Some(profile) => print_value(profile, json)?,
            None => {
                eprintln!("No terminal profile matches the current environment");
                return Ok(ExitCode::Failure);
            }
        },
    }
    Ok(ExitCode::Success)
}

fn run_exit_code(registry: &Registry, command: &ExitCodeCommand, json: bool) -> anyhow::Result<ExitCode> {
    match command {
        ExitCodeCommand::List { category } => {
            let codes = match category {
                Some(category) => registry.taxonomy().codes_in_category(*category),
                None => registry.get_detailed_codes(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&codes)?);
            } else {
                for info in codes {
                    println!(
                        "{:>3}  {:<36} {:<18} {}",
                        info.code, info.name, info.simplified, info.description
                    );
                }
            }
        }

        ExitCodeCommand::Info { key } => {
            let info = registry.get_exit_code_info(key.clone())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{} ({})", info.name, info.code);
                println!("  category:    {}", info.category);
                println!("  description: {}", info.description);
                println!("  context:     {}", info.context);
                println!("  simplified:  {}", info.simplified);
                if let Some(hint) = info.retry_hint {
                    println!("  retry:       {}", hint.as_str());
                }
                if let Some(bsd) = info.bsd_equivalent {
                    println!("  bsd:         {}", bsd);
                }
            }
        }

        ExitCodeCommand::Map { key, mapping_version } => {
            let version = mapping_version
                .clone()
                .unwrap_or_else(|| registry.default_mapping_version());
            let mode = registry.map_to_simplified(key.clone(), &version)?;
            if json {
                #[derive(Serialize)]
                struct Mapped<'a> {
                    key: String,
                    mapping_version: &'a str,
                    mode: artifact_registry::SimplifiedMode,
                    exit_value: i32,
                }
                let mapped = Mapped {
                    key: key.to_string(),
                    mapping_version: &version,
                    mode,
                    exit_value: mode.exit_value(),
                };
                println!("{}", serde_json::to_string_pretty(&mapped)?);
            } else {
                println!("{} -> {} (exit {}) under {}", key, mode, mode.exit_value(), version);
            }
        }

        ExitCodeCommand::Version => {
            let taxonomy = registry.taxonomy();
            let default = registry.default_mapping_version();
            println!("taxonomy: {}", taxonomy.exit_codes_version());
            for version in taxonomy.mapping_versions() {
                let marker = if version == default { " (default)" } else { "" };
                let description = taxonomy.mapping_description(&version)?.unwrap_or("");
                println!("mapping:  {}{}  {}", version, marker, description);
            }
            println!("bundle:   {}", registry.bundle_checksum());
        }
    }
    Ok(ExitCode::Success)
}

fn print_list(items: &[String], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        for item in items {
            println!("{}", item);
        }
    }
    Ok(())
}

fn print_value<T: Serialize>(value: &T, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", toml::to_string_pretty(value)?);
    }
    Ok(())
}
