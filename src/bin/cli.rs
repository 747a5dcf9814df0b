// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Thermbridge CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thermbridge::cli::{parse_edge, BoundaryKind, Reporter};
use thermbridge::thermal::{self, MaterialLayer, USection};
use thermbridge::{export_scene, import_therm, MemoryScene, SegmentId, ThermConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thermbridge")]
#[command(about = "Thermbridge - THERM boundary tagging and exchange", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./thermbridge.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene to a THERM-XML file
    Export {
        /// Scene JSON file
        scene: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Restrict the export to these solids
        #[arg(short, long = "select")]
        select: Vec<String>,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// Import a THERM-XML file, optionally merging it into a scene
    Import {
        /// THERM-XML file
        input: PathBuf,

        /// Scene JSON file to merge into (created when missing)
        #[arg(long)]
        scene: Option<PathBuf>,
    },

    /// Tag edges of a scene with a boundary condition
    Assign {
        /// Scene JSON file
        scene: PathBuf,

        /// Boundary condition kind
        #[arg(value_enum)]
        kind: BoundaryKind,

        /// Surface temperature in °C
        #[arg(long, allow_hyphen_values = true)]
        temperature: Option<f64>,

        /// Surface resistance in m²K/W
        #[arg(long)]
        resistance: Option<f64>,

        /// U-factor tag
        #[arg(long)]
        label: Option<String>,

        /// Solids whose exterior edges are tagged (all when empty)
        #[arg(short, long = "select")]
        select: Vec<String>,

        /// Explicit edge `x1,y1,x2,y2`; may repeat
        #[arg(long = "edge", allow_hyphen_values = true)]
        edges: Vec<String>,
    },

    /// List boundary groups of a scene
    Groups {
        /// Scene JSON file
        scene: PathBuf,
    },

    /// Delete a boundary group by name
    DeleteGroup {
        /// Scene JSON file
        scene: PathBuf,

        /// Group name, e.g. THERM_Adiabatic
        name: String,
    },

    /// Compute a layered U-value
    Uvalue {
        /// Layer as `thickness:conductivity`; may repeat
        #[arg(short, long = "layer", required = true)]
        layers: Vec<MaterialLayer>,

        /// Interior surface resistance
        #[arg(long)]
        rsi: Option<f64>,

        /// Exterior surface resistance
        #[arg(long)]
        rse: Option<f64>,
    },

    /// Evaluate a U-section and write its standalone file
    Usection {
        /// Scene JSON file
        scene: PathBuf,

        /// Section name
        #[arg(short, long)]
        name: String,

        /// Internal segment id
        #[arg(long)]
        internal: u64,

        /// External segment id
        #[arg(long)]
        external: Option<u64>,

        /// Layer solid names, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        layers: Vec<String>,

        /// Output file; evaluation only when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check selected solids for export problems
    Check {
        /// Scene JSON file
        scene: PathBuf,
    },

    /// Write the default configuration
    InitConfig {
        /// Target file
        #[arg(default_value = thermbridge::config::CONFIG_FILE)]
        path: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            scene,
            output,
            select,
            title,
        } => export_command(&scene, &output, select, title, config),
        Commands::Import { input, scene } => import_command(&input, scene.as_deref()),
        Commands::Assign {
            scene,
            kind,
            temperature,
            resistance,
            label,
            select,
            edges,
        } => {
            let key = kind.to_key(temperature, resistance, label.as_deref(), &config)?;
            assign_command(&scene, key, select, &edges, &config)
        }
        Commands::Groups { scene } => {
            let scene = MemoryScene::load(&scene)?;
            Reporter::report_groups(&scene.registry);
            Ok(())
        }
        Commands::DeleteGroup { scene: path, name } => {
            let mut scene = MemoryScene::load(&path)?;
            let removed = scene.registry.delete_group(&name)?;
            scene.save(&path)?;
            Reporter::success(&format!("Deleted {} ({} segments)", name, removed.len()));
            Ok(())
        }
        Commands::Uvalue { layers, rsi, rse } => {
            let report = thermal::compute(
                &layers,
                rsi.unwrap_or(config.internal.resistance),
                rse.unwrap_or(config.external.resistance),
            );
            Reporter::report_resistance(&report);
            Ok(())
        }
        Commands::Usection {
            scene,
            name,
            internal,
            external,
            layers,
            output,
        } => {
            let mut section = USection::new(name, SegmentId(internal)).with_layers(layers);
            if let Some(external) = external {
                section = section.with_external(SegmentId(external));
            }
            usection_command(&scene, &section, output.as_deref(), &config)
        }
        Commands::Check { scene } => {
            let scene = MemoryScene::load(&scene)?;
            if !Reporter::report_preflight(&scene.preflight(&config)) {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::InitConfig { path } => {
            config.save(&path)?;
            Reporter::success(&format!("Wrote {}", path.display()));
            Ok(())
        }
        Commands::Version => {
            println!("Thermbridge v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "thermbridge=debug" } else { "thermbridge=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ThermConfig> {
    match path {
        Some(path) => {
            let mut config = ThermConfig::from_file(path)?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => ThermConfig::load(),
    }
}

fn export_command(
    scene_path: &Path,
    output: &Path,
    select: Vec<String>,
    title: Option<String>,
    mut config: ThermConfig,
) -> Result<()> {
    let mut scene = MemoryScene::load(scene_path)?;
    if !select.is_empty() {
        scene.select(select);
    }
    if let Some(title) = title {
        config.header.title = title;
    }

    let start = Instant::now();
    let summary = export_scene(output, &scene, &config)
        .with_context(|| format!("Failed to export {}", output.display()))?;
    Reporter::report_export(&output.display().to_string(), &summary, start.elapsed());
    Ok(())
}

fn import_command(input: &Path, scene_path: Option<&Path>) -> Result<()> {
    let model = import_therm(input)
        .with_context(|| format!("Failed to import {}", input.display()))?;

    Reporter::report_import(&input.display().to_string(), &model);
    let Some(scene_path) = scene_path else {
        return Ok(());
    };

    let mut scene = if scene_path.exists() {
        MemoryScene::load(scene_path)?
    } else {
        MemoryScene::new()
    };
    let merged = scene.absorb(model);
    scene.save(scene_path)?;
    Reporter::report_assign(&scene_path.display().to_string(), &merged);
    Ok(())
}

fn assign_command(
    scene_path: &Path,
    key: thermbridge::GroupKey,
    select: Vec<String>,
    edges: &[String],
    config: &ThermConfig,
) -> Result<()> {
    let mut scene = MemoryScene::load(scene_path)?;

    let report = if edges.is_empty() {
        if !select.is_empty() {
            scene.select(select);
        }
        scene.assign_external(&key, config)
    } else {
        let edges = edges
            .iter()
            .map(|edge| parse_edge(edge))
            .collect::<Result<Vec<_>>>()?;
        scene.assign(&edges, &key, config)
    };

    if report.created_count() == 0 {
        Reporter::report_warning("no segments were created");
    }
    scene.save(scene_path)?;
    Reporter::report_assign(&key.label(), &report);
    Ok(())
}

fn usection_command(
    scene_path: &Path,
    section: &USection,
    output: Option<&Path>,
    config: &ThermConfig,
) -> Result<()> {
    let scene = MemoryScene::load(scene_path)?;

    match output {
        Some(output) => {
            let (report, summary) = thermal::export_usection(output, section, &scene, config)?;
            Reporter::report_usection(&report);
            Reporter::report_info(&format!(
                "Wrote {} ({} polygons, {} boundaries)",
                output.display(),
                summary.polygons,
                summary.boundaries
            ));
        }
        None => {
            let report = section.evaluate(&scene, config)?;
            Reporter::report_usection(&report);
        }
    }
    Ok(())
}
