//! MockServer Config Command Line Tool
//!
//! Resolves the effective MockServer configuration from the property file,
//! the environment and command line overrides, and prints it.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{debug, info};

use mockserver_config::common::{apply_log_level, init_logger, AppError, Result};
use mockserver_config::config::{settings, ConfigBuilder, ConfigChangeEvent, ConfigManager, LogLevel};
use mockserver_config::{APP_NAME, VERSION};

/// MockServer Config: inspect layered runtime configuration
#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Property file location, searched in resource directories first
    #[arg(long)]
    property_file: Option<String>,

    /// Directory searched for the property file and other resources
    #[arg(long)]
    resource_dir: Vec<PathBuf>,

    /// Override a setting, by accessor name, property key or environment name
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_define)]
    define: Vec<(String, String)>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR, OFF or the Java names)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the effective value of one setting
    Get {
        /// Accessor name, property key or environment name
        name: String,
    },
    /// Print every setting with its value and source
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the effective values of validated settings
    Check,
}

fn parse_define(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got \"{}\"", arg)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let initial_level = match args.log_level.as_deref() {
        Some(level) => LogLevel::from_str(level)?,
        None => LogLevel::default(),
    };
    init_logger(initial_level);
    debug!("Starting {} v{}", APP_NAME, VERSION);

    let config = Arc::new(build_config(&args)?);
    apply_log_level(config.log_level());

    // Follow log level changes made through the engine
    let weak = Arc::downgrade(&config);
    config.add_listener(move |event| {
        let follows = match event {
            ConfigChangeEvent::Updated(key) | ConfigChangeEvent::Cleared(key) => key == settings::LOG_LEVEL.def.key,
            ConfigChangeEvent::Reset => true,
        };
        if let Some(config) = weak.upgrade().filter(|_| follows) {
            apply_log_level(config.log_level());
        }
    });

    if let Some(level) = &args.log_level {
        config.set_raw(&settings::LOG_LEVEL.def, level)?;
    }
    for (name, value) in &args.define {
        let def = settings::require(name)?;
        config.set_raw(def, value)?;
    }

    match args.command {
        Command::Get { name } => print_setting(&config, &name),
        Command::List { json } => print_all(&config, json),
        Command::Check => check(&config),
    }
}

fn build_config(args: &Args) -> Result<ConfigManager> {
    let mut builder = ConfigBuilder::new();
    if let Some(location) = &args.property_file {
        builder = builder.with_property_file(location.as_str());
    }
    for dir in &args.resource_dir {
        builder = builder.with_resource_dir(dir.clone());
    }

    let config = builder.build()?;
    match config.property_file() {
        Some(path) => info!("Using property file {}", path.display()),
        None => debug!("No property file found"),
    }
    Ok(config)
}

fn print_setting(config: &ConfigManager, name: &str) -> Result<()> {
    let def = settings::require(name)?;
    let setting = config.resolve_setting(def)?;
    println!("{}", setting.value);
    Ok(())
}

fn print_all(config: &ConfigManager, json: bool) -> Result<()> {
    let resolved = config.resolved();
    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    let width = resolved.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for setting in &resolved {
        println!("{:width$}  {:<11}  {}", setting.name, setting.source.to_string(), setting.value, width = width);
    }
    Ok(())
}

fn check(config: &ConfigManager) -> Result<()> {
    let problems = config.check();
    if problems.is_empty() {
        println!("Configuration is valid");
        return Ok(());
    }

    for problem in &problems {
        println!("{}", problem);
    }
    Err(AppError::InvalidArgument(format!("{} invalid setting(s)", problems.len())))
}
