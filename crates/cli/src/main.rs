//! geobatch CLI - batch geoprocessing utilities

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use geobatch_algorithms::area::{AreaParams, AreaReport};
use geobatch_algorithms::batch::{area_directory, clean_directory, dxf_directory, BatchReport};
use geobatch_algorithms::cleaning::{CleanParams, CleanSummary};
use geobatch_algorithms::convert::{convert_raster, tiff_to_rst, DxfParams, DEFAULT_TIFF_EPSG};
use geobatch_algorithms::vector::HoleMode;
use geobatch_core::CRS;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "geobatch")]
#[command(author, version, about = "Batch geoprocessing utilities", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove duplicate road geometries and keep their long boundary segments
    Clean {
        /// Directory holding the .geojson inputs
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Output directory name inside DIR [default: cleaned_output]
        #[arg(short, long)]
        output_dir: Option<String>,
        /// Duplicate tolerance in input coordinate units [default: 1e-6]
        #[arg(short, long)]
        tolerance: Option<f64>,
        /// Minimum segment length in meters, exclusive [default: 3.5]
        #[arg(short = 'm', long)]
        min_length: Option<f64>,
        /// Metric EPSG code used for lengths [default: 32631]
        #[arg(long)]
        metric_epsg: Option<u32>,
        /// Geographic EPSG code of the output [default: 4326]
        #[arg(long)]
        geographic_epsg: Option<u32>,
        /// Also segment polygon holes
        #[arg(long)]
        include_holes: bool,
        /// JSON file with cleaning parameters; flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Compute polygon areas in hectares and print a report
    Area {
        /// Directory holding the .shp inputs
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Output directory, relative to DIR
        #[arg(short, long, default_value = "processed")]
        output_dir: PathBuf,
        /// Metric EPSG code areas are measured in
        #[arg(short, long, default_value = "32631")]
        epsg: u32,
    },
    /// Convert GeoJSON files to DXF drawings next to the inputs
    ToDxf {
        /// Directory holding the .geojson inputs
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Skip polygon holes
        #[arg(long)]
        exclude_holes: bool,
        /// Circle radius drawn for points
        #[arg(short, long, default_value = "0.5")]
        point_radius: f64,
    },
    /// Convert a GeoTIFF to an Idrisi raster
    TiffToRst {
        /// Input GeoTIFF
        input: PathBuf,
        /// Output .rst file
        output: PathBuf,
    },
    /// Convert between GeoTIFF and Idrisi raster, by input extension
    Raster {
        /// Input .tif/.tiff or .rst file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// EPSG code written to GeoTIFF output
        #[arg(default_value_t = DEFAULT_TIFF_EPSG)]
        epsg: u32,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install logging subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Run a batch behind a spinner showing the current file
fn with_progress<T>(
    msg: &str,
    run: impl FnOnce(&mut dyn FnMut(&Path)) -> geobatch_core::Result<BatchReport<T>>,
) -> Result<BatchReport<T>> {
    let pb = spinner(msg);
    let mut tick = |file: &Path| pb.set_message(format!("Processing {}", file_name(file)));
    let report = run(&mut tick);
    pb.finish_and_clear();
    Ok(report?)
}

fn print_failures<T>(report: &BatchReport<T>) {
    for (file, message) in report.failures() {
        println!("Error processing {}: {}", file_name(file), message);
    }
}

fn print_clean_summary(file: &Path, summary: &CleanSummary) {
    match &summary.output {
        Some(output) => {
            println!("Cleaned {}:", file_name(file));
            println!(" - Original features: {}", summary.original_count);
            println!(" - Duplicates removed: {}", summary.duplicates_removed);
            println!(" - Final segments: {}", summary.segments_kept);
            println!(" - Saved to: {}", output.display());
        }
        None => println!(
            "{}: no valid segments left after filtering ({} checked)",
            file_name(file),
            summary.segments_produced
        ),
    }
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Clean {
            dir,
            output_dir,
            tolerance,
            min_length,
            metric_epsg,
            geographic_epsg,
            include_holes,
            config,
        } => {
            let mut params = match &config {
                Some(path) => CleanParams::from_json_file(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => CleanParams::default(),
            };
            if let Some(name) = output_dir {
                params.output_dir_name = name;
            }
            if let Some(tolerance) = tolerance {
                params.duplicate_tolerance = tolerance;
            }
            if let Some(min_length) = min_length {
                params.min_segment_length = min_length;
            }
            if let Some(code) = metric_epsg {
                params.metric_crs = CRS::from_epsg(code);
            }
            if let Some(code) = geographic_epsg {
                params.geographic_crs = CRS::from_epsg(code);
            }
            if include_holes {
                params.holes = HoleMode::Include;
            }
            params.validate().context("Invalid cleaning parameters")?;

            let start = Instant::now();
            let report = with_progress("Cleaning road geometries...", |tick| {
                clean_directory(&dir, &params, tick)
            })
            .with_context(|| format!("Failed to clean {}", dir.display()))?;

            if report.is_empty() {
                println!("No .geojson files found in {}", dir.display());
                return Ok(());
            }
            for outcome in &report.outcomes {
                if let Ok(summary) = &outcome.result {
                    print_clean_summary(&outcome.file, summary);
                }
            }
            print_failures(&report);
            println!(
                "\nDone: {} cleaned, {} failed. Cleaned files in '{}/' ({:.2?})",
                report.succeeded(),
                report.failed(),
                params.output_dir_name,
                start.elapsed()
            );
        }

        Commands::Area {
            dir,
            output_dir,
            epsg,
        } => {
            let params = AreaParams {
                target_crs: CRS::from_epsg(epsg),
                ..AreaParams::default()
            };
            let output_dir = dir.join(output_dir);

            let report = with_progress("Calculating areas...", |tick| {
                area_directory(&dir, &output_dir, &params, tick)
            })
            .with_context(|| format!("Failed to process {}", dir.display()))?;

            print_failures(&report);
            let rows: Vec<_> = report.successes().cloned().collect();
            if rows.is_empty() {
                println!("No shapefiles processed.");
                return Ok(());
            }
            println!();
            print!("{}", AreaReport::new("Wetlands Area Report (in hectares)", rows));
            println!(
                "\nAll processing complete. Files saved to '{}'.",
                output_dir.display()
            );
        }

        Commands::ToDxf {
            dir,
            exclude_holes,
            point_radius,
        } => {
            let params = DxfParams {
                holes: if exclude_holes {
                    HoleMode::Exclude
                } else {
                    HoleMode::Include
                },
                point_radius,
            };

            let report = with_progress("Converting to DXF...", |tick| {
                dxf_directory(&dir, &params, tick)
            })
            .with_context(|| format!("Failed to convert {}", dir.display()))?;

            for output in report.successes() {
                println!("Saved DXF: {}", file_name(output));
            }
            print_failures(&report);
        }

        Commands::TiffToRst { input, output } => {
            let pb = spinner("Converting raster...");
            let start = Instant::now();
            tiff_to_rst(&input, &output)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            pb.finish_and_clear();
            done("Idrisi raster", &output, start.elapsed());
        }

        Commands::Raster {
            input,
            output,
            epsg,
        } => {
            let pb = spinner("Converting raster...");
            let start = Instant::now();
            convert_raster(&input, &output, epsg)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            pb.finish_and_clear();
            done("Raster", &output, start.elapsed());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn raster_epsg_defaults() {
        let cli = Cli::try_parse_from(["geobatch", "raster", "in.rst", "out.tif"]).unwrap();
        match cli.command {
            Commands::Raster { epsg, .. } => assert_eq!(epsg, 32631),
            _ => panic!("expected raster subcommand"),
        }
    }

    #[test]
    fn clean_dir_defaults_to_current() {
        let cli = Cli::try_parse_from(["geobatch", "clean", "--include-holes"]).unwrap();
        match cli.command {
            Commands::Clean {
                dir, include_holes, ..
            } => {
                assert_eq!(dir, PathBuf::from("."));
                assert!(include_holes);
            }
            _ => panic!("expected clean subcommand"),
        }
    }

    #[test]
    fn tiff_to_rst_needs_two_paths() {
        assert!(Cli::try_parse_from(["geobatch", "tiff-to-rst", "only.tif"]).is_err());
    }
}
