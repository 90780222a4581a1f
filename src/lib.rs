//! # Gridtopo - Topology generator for rettij smart-grid emulations
//!
//! This library builds the network topology of an emulated smart-grid
//! communication network and writes the two files the rest of the
//! experiment consumes: the topology document rettij provisions the
//! emulated network from, and an IP map operators use to bridge external
//! hosts (control-center PC, RTU) into it.
//!
//! ## Overview
//!
//! The generated grid is a ring of redundant backbone router pairs. Between
//! two neighbouring backbone pairs runs a chain of aggregation router pairs,
//! below every aggregation pair hangs a chain of access routers, and every
//! router group serves one substation (UW) container. External hosts sit on
//! their own networks attached to chosen routers.
//!
//! ## Key Features
//!
//! - **Deterministic**: identical parameters yield byte-identical outputs
//! - **Collision-free addressing**: link networks are carved sequentially from
//!   one pool and every address is registered exactly once
//! - **Static routes**: every router and substation gets aggregated routes to
//!   every link network
//! - **All or nothing**: both artifacts are written, or neither
//!
//! ## Architecture
//!
//! - `config`: generation parameters and their validation
//! - `config_loader`: YAML loading and CLI overrides
//! - `ip`: link network pool and address registry
//! - `topology`: the in-memory model, grid construction and route distribution
//! - `output`: topology document and IP map serializers
//! - `utils`: consistency checks on the model and the artifacts
//! - `orchestrator`: one generation run from parameters to files
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gridtopo::{config_loader, orchestrator};
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("grid.yaml"))?;
//! orchestrator::generate(
//!     &config,
//!     Path::new("topology.yml"),
//!     Path::new("ips.txt"),
//!     orchestrator::IpMapOptions::default(),
//! )?;
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Node Enumeration Order
//!
//! Link networks are assigned in construction order and nodes are listed in
//! a fixed order (backbone pairs, aggregation pairs, access routers,
//! substations, external hosts). Downstream bridging commands rely on this:
//! with the default parameters the control-center PC is always reachable at
//! `10.100.101.2` and the RTU at `10.100.102.2`.
//!
//! ## Error Handling
//!
//! Library errors are `thiserror` enums (`ValidationError`, `AllocationError`,
//! `GeneratorError`); the orchestration layer reports them through
//! `color_eyre` with context.

pub mod config;
pub mod config_loader;
pub mod ip;
pub mod topology;
pub mod output;
pub mod utils;
pub mod orchestrator;
