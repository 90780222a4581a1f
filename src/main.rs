use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use gridtopo::config_loader::{self, CliOverrides};
use gridtopo::orchestrator::{self, IpMapOptions};
use gridtopo::output::{IpMapFormat, IpMapScope};

/// Topology generator for rettij smart-grid network emulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the resulting topology file
    #[arg(required_unless_present = "print_config")]
    topology_output: Option<PathBuf>,

    /// Path of the resulting IP map file
    #[arg(required_unless_present = "print_config")]
    ip_map_output: Option<PathBuf>,

    /// Path to a YAML file with generation parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of backbone router pairs
    #[arg(long)]
    backbone: Option<usize>,

    /// Aggregation router pairs per backbone segment
    #[arg(long)]
    aggregation: Option<usize>,

    /// Access routers per aggregation pair
    #[arg(long)]
    access: Option<usize>,

    /// Format of the IP map
    #[arg(long, value_enum, default_value_t = IpMapFormat::Text)]
    ip_map_format: IpMapFormat,

    /// Nodes listed in the IP map
    #[arg(long, value_enum, default_value_t = IpMapScope::All)]
    ip_map_scope: IpMapScope,

    /// Print the effective generation parameters as YAML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut config = config_loader::load_or_default(args.config.as_deref())?;
    let overrides = CliOverrides {
        backbone_length: args.backbone,
        aggregation_length: args.aggregation,
        access_length: args.access,
    };
    config_loader::apply_overrides(&mut config, &overrides)?;

    if args.print_config {
        let yaml = serde_yaml::to_string(&config).wrap_err("Failed to serialize configuration")?;
        print!("{}", yaml);
        return Ok(());
    }

    let (Some(topology_output), Some(ip_map_output)) = (args.topology_output, args.ip_map_output) else {
        return Err(color_eyre::eyre::eyre!("Both output paths are required"));
    };

    info!("Starting topology generation");
    info!("Topology file: {:?}", topology_output);
    info!("IP map file: {:?}", ip_map_output);

    let options = IpMapOptions {
        format: args.ip_map_format,
        scope: args.ip_map_scope,
    };
    orchestrator::generate(&config, &topology_output, &ip_map_output, options)?;

    info!("Topology generation completed successfully");
    Ok(())
}
