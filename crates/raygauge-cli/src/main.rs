//! raygauge CLI - batch volumetric analysis of solid-model scenes.
//!
//! Loads a scene file, runs one convergence analysis, and prints the
//! per-region and total results with their high/low ranges.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use raygauge_engine::{Analysis, AnalysisConfig, GridMode, PlotWriter, Report};
use raygauge_trace::Scene;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "raygauge")]
#[command(about = "Grid quantitative analysis of solid-model scenes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a scene file and print per-region and total results
    Analyze {
        /// Scene JSON file (list of regions with CSG solids)
        scene: PathBuf,
        /// Initial grid spacing
        #[arg(long, default_value_t = 1.0)]
        spacing: f64,
        /// Refinement floor: spacing never drops below this
        #[arg(long, default_value_t = 0.125)]
        spacing_limit: f64,
        /// View azimuth in degrees (ignored with --triple)
        #[arg(long, default_value_t = 35.0)]
        azimuth: f64,
        /// View elevation in degrees (ignored with --triple)
        #[arg(long, default_value_t = 25.0)]
        elevation: f64,
        /// Sample three axis views per pass instead of one
        #[arg(long)]
        triple: bool,
        /// Relative volume tolerance
        #[arg(long, default_value_t = 0.01)]
        vol_tol: f64,
        /// Relative mass tolerance (mass untracked if omitted)
        #[arg(long)]
        mass_tol: Option<f64>,
        /// Relative surface-area tolerance (untracked if omitted)
        #[arg(long)]
        area_tol: Option<f64>,
        /// Minimum overlap depth to report
        #[arg(long, default_value_t = 1e-6)]
        overlap_tol: f64,
        /// Worker threads
        #[arg(long, default_value_t = 1)]
        ncpu: usize,
        /// Track air regions (enables gap and air diagnostics)
        #[arg(long)]
        use_air: bool,
        /// Minimum ray hits before a region's result is trusted
        #[arg(long, default_value_t = 1)]
        required_hits: u64,
        /// Suppress under-sampled warnings (the flag is still set)
        #[arg(long)]
        quiet_missed: bool,
        /// Density table file: `<id> <g/mm3> <name>` per line
        #[arg(long)]
        density_file: Option<PathBuf>,
        /// Density for materials missing from the table
        #[arg(long, default_value_t = 0.0)]
        default_density: f64,
        /// Write sampled in-solid segments to this plot file
        #[arg(long)]
        plot_file: Option<PathBuf>,
        /// Print the report as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            scene,
            spacing,
            spacing_limit,
            azimuth,
            elevation,
            triple,
            vol_tol,
            mass_tol,
            area_tol,
            overlap_tol,
            ncpu,
            use_air,
            required_hits,
            quiet_missed,
            density_file,
            default_density,
            plot_file,
            json,
        } => {
            let file = File::open(&scene)
                .with_context(|| format!("cannot open scene {}", scene.display()))?;
            let scene = Scene::from_json_reader(file).context("cannot parse scene")?;

            let mut config = AnalysisConfig::new(spacing, spacing_limit);
            config.mode = if triple {
                GridMode::Triple
            } else {
                GridMode::Single {
                    azimuth_deg: azimuth,
                    elevation_deg: elevation,
                }
            };
            config.volume_tolerance = Some(vol_tol);
            config.mass_tolerance = mass_tol;
            config.area_tolerance = area_tol;
            config.overlap_tolerance = overlap_tol;
            config.ncpu = ncpu;
            config.use_air = use_air;
            config.required_hits = required_hits;
            config.quiet_missed = quiet_missed;
            config.default_density = default_density;

            let mut analysis = Analysis::new(&scene, config).context("invalid configuration")?;
            if let Some(path) = density_file {
                analysis
                    .load_density_file(&path)
                    .with_context(|| format!("cannot load density table {}", path.display()))?;
            }
            if let Some(path) = plot_file {
                analysis.set_plot_writer(
                    PlotWriter::from_path(&path)
                        .with_context(|| format!("cannot create plot file {}", path.display()))?,
                );
            }

            let report = analysis.run().context("analysis failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
            } else {
                print_report(&report);
            }
        }
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!(
        "passes: {}   final spacing: {}   views: {}",
        report.passes, report.final_spacing, report.num_views
    );
    println!();
    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>12} {:>8}",
        "region", "volume", "vol lo", "vol hi", "mass", "hits"
    );
    for region in &report.regions {
        let mut flags = String::new();
        if region.air {
            flags.push_str(" [air]");
        }
        if region.unreliable {
            flags.push_str(" [unreliable]");
        }
        println!(
            "{:<20} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {:>8}{}",
            region.name,
            region.volume.value,
            region.volume.low,
            region.volume.high,
            region.mass.value,
            region.hits,
            flags
        );
    }
    println!(
        "{:<20} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
        "total",
        report.total_volume.value,
        report.total_volume.low,
        report.total_volume.high,
        report.total_mass.value
    );
    println!();
    println!(
        "surface area: {:.6} [{:.6}, {:.6}]",
        report.total_surface_area.value,
        report.total_surface_area.low,
        report.total_surface_area.high
    );
    let c = report.total_centroid;
    println!("centroid: ({:.6}, {:.6}, {:.6})", c.x, c.y, c.z);

    if !report.overlaps.is_empty() {
        println!();
        println!("overlapping region pairs:");
        for overlap in &report.overlaps {
            println!(
                "  {} / {}: {} rays, max depth {:.6}",
                overlap.names.0, overlap.names.1, overlap.count, overlap.max_depth
            );
        }
    }
    for region in &report.regions {
        if region.unreliable {
            println!(
                "note: region {} received only {} hits; its results are unreliable",
                region.name, region.hits
            );
        }
    }
    if report.spacing_floor_reached() {
        println!(
            "note: spacing floor {} reached before tolerances were met; \
             results are the best available",
            report.final_spacing
        );
    }
}

fn report_json(report: &Report) -> serde_json::Value {
    let range = |q: &raygauge_engine::QuantityRange| {
        serde_json::json!({ "value": q.value, "high": q.high, "low": q.low })
    };
    serde_json::json!({
        "converged": report.converged(),
        "spacing_floor_reached": report.spacing_floor_reached(),
        "passes": report.passes,
        "final_spacing": report.final_spacing,
        "num_views": report.num_views,
        "total": {
            "volume": range(&report.total_volume),
            "mass": range(&report.total_mass),
            "surface_area": range(&report.total_surface_area),
            "centroid": [
                report.total_centroid.x,
                report.total_centroid.y,
                report.total_centroid.z,
            ],
        },
        "regions": report.regions.iter().map(|r| {
            serde_json::json!({
                "name": r.name,
                "air": r.air,
                "volume": range(&r.volume),
                "mass": range(&r.mass),
                "surface_area": range(&r.surface_area),
                "centroid": [r.centroid.x, r.centroid.y, r.centroid.z],
                "hits": r.hits,
                "unreliable": r.unreliable,
            })
        }).collect::<Vec<_>>(),
        "overlaps": report.overlaps.iter().map(|o| {
            serde_json::json!({
                "regions": [o.names.0, o.names.1],
                "count": o.count,
                "max_depth": o.max_depth,
            })
        }).collect::<Vec<_>>(),
    })
}
