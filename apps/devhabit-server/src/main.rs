use anyhow::Result;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// Adapter to make AppConfig implement modkit::ConfigProvider
struct ModkitConfigAdapter(Arc<AppConfig>);

impl modkit::ConfigProvider for ModkitConfigAdapter {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.module_section(module_name)
    }
}

use api_ingress::ApiIngress;
use habits::HabitsModule;
use modkit::runtime::{run, RunOptions, ShutdownOptions};
use modkit::ModuleRegistry;
use std::path::PathBuf;
use std::sync::Arc;

const API_INGRESS: &str = "api_ingress";
const HABITS: &str = "habits";

/// DevHabit Server - habit tracking API
#[derive(Parser)]
#[command(name = "devhabit-server")]
#[command(about = "DevHabit Server - habit tracking API")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    derive_ingress_section(&mut config);

    // Print config and exit if requested
    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    let base_dir = std::env::current_dir()?;
    runtime::logging::init_logging_from_config(&logging_config, &base_dir);
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "DevHabit Server starting"
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

/// The ingress reads its own module section; fill it from `server` unless given.
fn derive_ingress_section(config: &mut AppConfig) {
    if config.modules.contains_key(API_INGRESS) {
        return;
    }
    let server = &config.server;
    let section = serde_json::json!({
        "bind_addr": format!("{}:{}", server.host, server.port),
        "timeout_sec": server.timeout_sec,
        "cors_enabled": server.cors_enabled,
        "body_limit_bytes": server.body_limit_bytes,
    });
    config.modules.insert(API_INGRESS.to_owned(), section);
}

fn build_registry() -> Result<ModuleRegistry> {
    Ok(ModuleRegistry::builder()
        .with_rest_host(API_INGRESS, Arc::new(ApiIngress::default()))
        .with_rest(HABITS, Arc::new(HabitsModule::default()))
        .build()?)
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let base_url = config.server.base_url.clone();
    let config_provider = Arc::new(ModkitConfigAdapter(Arc::new(config)));

    let run_options = RunOptions {
        modules_cfg: config_provider,
        registry: build_registry()?,
        base_url,
        shutdown: ShutdownOptions::Signals,
    };

    run(run_options).await
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    build_registry()?;
    let habits: habits::config::HabitsConfig = config.module_config(HABITS)?;
    if habits.max_page_size == 0 {
        anyhow::bail!("modules.habits.max_page_size must be at least 1");
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
