//! Generation orchestrator.
//!
//! This module coordinates one generation run: build the model, check it,
//! render both artifacts in memory and only then touch the filesystem.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::output::{render_document, topology_document, IpMap, IpMapFormat, IpMapScope};
use crate::topology::{build_topology, node_routes, GeneratorError, Topology};
use crate::utils::validation::{validate_ip_map_consistency, validate_topology};

/// How the IP map is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IpMapOptions {
    pub format: IpMapFormat,
    pub scope: IpMapScope,
}

/// Both artifacts of a run, rendered and ready to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutputs {
    pub topology: String,
    pub ip_map: String,
}

/// Build and check the topology described by `config`
pub fn generate_topology(config: &Config) -> Result<Topology, GeneratorError> {
    let topology = build_topology(config)?;
    validate_topology(&topology).map_err(GeneratorError::Inconsistent)?;
    log_first_nodes(&topology);
    Ok(topology)
}

fn log_first_nodes(topology: &Topology) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    if let Some(&uw) = topology.uw_nodes().first() {
        let node = topology.node(uw);
        debug!("First substation {} has addresses {:?}", node.role, topology.node_addresses(uw));
    }

    if let Some(&first) = topology.ordered_nodes().first() {
        debug!("Routes of {}:", topology.node(first).role);
        for route in node_routes(topology, first) {
            debug!("  {} via {} metric {}", route.network, route.gateway, route.metric);
        }
    }
}

/// Render the topology document and the IP map from the same model
pub fn render_outputs(topology: &Topology, options: IpMapOptions) -> Result<RenderedOutputs> {
    let document = topology_document(topology);
    let ip_map = IpMap::from_topology(topology, options.scope);
    if ip_map.is_empty() {
        warn!("IP map with scope {:?} lists no nodes", options.scope);
    }

    if options.scope == IpMapScope::All {
        validate_ip_map_consistency(&document, &ip_map)
            .map_err(|e| eyre!("IP map does not match the topology document: {}", e))?;
    }

    let topology_yaml = render_document(&document).wrap_err("Failed to serialize topology document")?;
    let ip_map_content = ip_map
        .render(options.format)
        .wrap_err("Failed to serialize IP map")?;

    info!(
        "Rendered topology document ({} nodes, {} channels) and IP map ({} entries, {:?}/{:?})",
        document.nodes.len(),
        document.channels.len(),
        ip_map.len(),
        options.scope,
        options.format
    );

    Ok(RenderedOutputs {
        topology: topology_yaml,
        ip_map: ip_map_content,
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write both artifacts, or neither.
///
/// Contents go to temporary siblings first and are renamed into place once
/// both writes succeeded. On failure every file this call created is removed.
pub fn write_outputs(outputs: &RenderedOutputs, topology_path: &Path, ip_map_path: &Path) -> Result<()> {
    if topology_path == ip_map_path {
        return Err(eyre!(
            "Topology document and IP map cannot share the path '{}'",
            topology_path.display()
        ));
    }

    let files = [
        (topology_path, outputs.topology.as_str()),
        (ip_map_path, outputs.ip_map.as_str()),
    ];

    let mut staged: Vec<PathBuf> = Vec::new();
    for (path, content) in files {
        let staging = staging_path(path);
        if let Err(e) = fs::write(&staging, content) {
            remove_all(&staged);
            let _ = fs::remove_file(&staging);
            return Err(e).wrap_err_with(|| format!("Failed to write '{}'", staging.display()));
        }
        staged.push(staging);
    }

    let mut placed: Vec<PathBuf> = Vec::new();
    for ((path, _), staging) in files.iter().zip(&staged) {
        if let Err(e) = fs::rename(staging, path) {
            remove_all(&placed);
            remove_all(&staged);
            return Err(e).wrap_err_with(|| format!("Failed to move output into '{}'", path.display()));
        }
        placed.push(path.to_path_buf());
    }

    info!("Wrote topology document to {:?}", topology_path);
    info!("Wrote IP map to {:?}", ip_map_path);
    Ok(())
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove partial output {:?}: {}", path, e);
            }
        }
    }
}

/// Run one complete generation: build, check, render, write
pub fn generate(config: &Config, topology_path: &Path, ip_map_path: &Path, options: IpMapOptions) -> Result<Topology> {
    let topology = generate_topology(config)?;
    let outputs = render_outputs(&topology, options)?;
    write_outputs(&outputs, topology_path, ip_map_path)?;
    Ok(topology)
}
