use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Load and parse generation parameters from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Load parameters from `config_path`, or fall back to the reference experiment
pub fn load_or_default(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using the reference topology parameters");
            Ok(Config::default())
        }
    }
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backbone_length: Option<usize>,
    pub aggregation_length: Option<usize>,
    pub access_length: Option<usize>,
}

/// Apply CLI overrides to a configuration
pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) -> Result<()> {
    if let Some(backbone) = overrides.backbone_length {
        info!("Overriding backbone_length: {} -> {}", config.backbone_length, backbone);
        config.backbone_length = backbone;
    }

    if let Some(aggregation) = overrides.aggregation_length {
        info!("Overriding aggregation_length: {} -> {}", config.aggregation_length, aggregation);
        config.aggregation_length = aggregation;
    }

    if let Some(access) = overrides.access_length {
        info!("Overriding access_length: {} -> {}", config.access_length, access);
        config.access_length = access;
    }

    // Re-validate after applying overrides
    config.validate()?;

    if config.aggregation_length == 0 && config.access_length > 0 {
        warn!("access_length is {} but there are no aggregation pairs to attach access routers to",
              config.access_length);
    }

    Ok(())
}
