use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use inventory::cli::{
    handle_admin_command, handle_auth_command, handle_device_command, handle_export_command,
    require_identity,
};
use inventory::config::{paths::InventoryPaths, settings::Settings};
use inventory::storage::Storage;

#[derive(Parser)]
#[command(
    name = "inventory",
    author = "Kaylee Beyene",
    version,
    about = "Device inventory management with a change-history trail",
    long_about = "Keeps a list of physical devices with their type, status and condition. \
                  Devices can be searched, filtered and paged, edited by signed-in staff, \
                  and exported as a spreadsheet table or a printable document. Every \
                  change is recorded in an append-only history."
)]
struct Cli {
    /// Session token (defaults to the one saved by 'auth login')
    #[arg(long, global = true, env = "INVENTORY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Device management commands
    #[command(subcommand, alias = "dev")]
    Device(inventory::cli::DeviceCommands),

    /// Export the device list
    #[command(subcommand)]
    Export(inventory::cli::ExportCommands),

    /// Sign in, sign out and register users
    #[command(subcommand)]
    Auth(inventory::cli::AuthCommands),

    /// Administrative commands
    #[command(subcommand)]
    Admin(inventory::cli::AdminCommands),

    /// Write default settings and create the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_logging(settings: &Settings) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = InventoryPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_logging(&settings);

    // Initialize storage
    let storage = Storage::open(paths.clone())?;
    let token = cli.token.as_deref();

    match cli.command {
        Some(Commands::Device(cmd)) => {
            let identity = require_identity(&storage, &settings, token)?;
            handle_device_command(&storage, &settings, &identity, cmd)?;
        }
        Some(Commands::Export(cmd)) => {
            require_identity(&storage, &settings, token)?;
            handle_export_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Auth(cmd)) => {
            handle_auth_command(&storage, &settings, token, cmd)?;
        }
        Some(Commands::Admin(cmd)) => {
            handle_admin_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Init) => {
            println!("Initializing inventory at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Run 'inventory admin seed' to create the first administrator,");
            println!("then 'inventory auth login admin' to sign in.");
        }
        Some(Commands::Config) => {
            println!("Inventory Configuration");
            println!("=======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Initialized:      {}", storage.is_initialized());
            println!();
            println!("Settings:");
            println!("  Default page size: {}", settings.default_page_size);
            println!("  Session lifetime:  {} hours", settings.session_ttl_hours);
            println!("  Date format:       {}", settings.date_format);
            println!("  Log level:         {}", settings.log_level);
            println!("  Document title:    {}", settings.document_title);
        }
        None => {
            println!("inventory - device inventory management");
            println!();
            println!("Run 'inventory --help' for usage information.");
        }
    }

    Ok(())
}
