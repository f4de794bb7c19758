//! verdex CLI - spectral indices from uploaded bands or a STAC archive

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use verdex_algorithms::imagery::{
    points_from_indexed_form, run_band_analysis, AlignOptions, BandAnalysisRequest, GeoPoint,
    SampleResult,
};
use verdex_algorithms::timeseries::{AnnualComposite, CompositeOptions, TimeSeriesBuilder};
use verdex_cloud::{StacArchive, StacArchiveOptions, StacCatalog, StacClientOptions};
use verdex_colormap::{preview_vis_params, raster_to_rgba, timeseries_vis_params, VisParams};
use verdex_core::io::{read_geotiff, write_geotiff, GeoTiffOptions, GeoTiffSource};
use verdex_core::{IndexType, Raster, RegionOfInterest, CRS};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "verdex")]
#[command(author, version, about = "Spectral index analysis of satellite imagery", long_about = None)]
struct Cli {
    /// Verbose output (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// List the supported spectral indices
    Indices,
    /// Compute an index from uploaded bands and sample it at points
    Analyze {
        /// Band files in order B2 (blue), B3 (green), B4 (red), B5 (NIR),
        /// B6 (SWIR); at least five
        #[arg(short, long = "band", required = true)]
        bands: Vec<PathBuf>,
        /// Index: NDVI, NDWI, MNDWI or EVI
        #[arg(short, long, default_value = "NDVI")]
        index: String,
        /// Sample point as LAT,LON (repeatable)
        #[arg(short, long = "point", allow_hyphen_values = true)]
        points: Vec<String>,
        /// JSON object with coordinates[i][lat] / coordinates[i][lon] fields
        #[arg(long)]
        form: Option<PathBuf>,
        /// Year shown in the report title
        #[arg(long, default_value = "2023")]
        year: String,
        /// Study area label
        #[arg(long, default_value = "Study Area")]
        study_area: String,
        /// Reject bands whose georeferencing differs from the first band
        #[arg(long)]
        strict: bool,
        /// Write the index grid as GeoTIFF
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the preview-colored grid as raw row-major RGBA bytes
        #[arg(long)]
        preview_rgba: Option<PathBuf>,
    },
    /// Annual least-cloudy index series from a STAC archive
    Timeseries {
        /// Region of interest ring as "lon,lat;lon,lat;..."
        #[arg(long, allow_hyphen_values = true)]
        polygon: String,
        /// First year (inclusive)
        #[arg(long)]
        start: i32,
        /// Last year (inclusive)
        #[arg(long)]
        end: i32,
        /// Index: NDVI or NDWI
        #[arg(short, long, default_value = "NDVI")]
        index: String,
        /// STAC catalog: pc, es, or an API URL
        #[arg(long, default_value = "pc")]
        catalog: String,
        /// STAC collection
        #[arg(long, default_value = "landsat-c2-l2")]
        collection: String,
        /// Platform filter (repeatable)
        #[arg(long = "platform", default_values_t = vec!["landsat-8".to_string()])]
        platforms: Vec<String>,
        /// Maximum items fetched per year
        #[arg(long, default_value = "100")]
        max_items: usize,
        /// Output directory for per-year GeoTIFFs and manifest.json
        #[arg(short, long)]
        out_dir: PathBuf,
    },
}

// ─── Reports ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct AnalysisReport<'a> {
    title: &'a str,
    study_area: &'a str,
    coordinates: &'a [SampleResult],
    message: String,
    vis: VisParams,
}

#[derive(Serialize)]
struct Manifest {
    index: IndexType,
    start: i32,
    end: i32,
    years: Vec<i32>,
    frames: Vec<ManifestFrame>,
    vis: Option<VisParams>,
}

#[derive(Serialize)]
struct ManifestFrame {
    year: i32,
    file: String,
    scene_id: String,
    cloud_cover: Option<f64>,
    mean: Option<f64>,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_result(raster: &Raster<f64>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    let options = GeoTiffOptions {
        epsg: raster.crs().map(|crs| crs.epsg()),
        ..GeoTiffOptions::default()
    };
    write_geotiff(raster, path, Some(options))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

/// `LAT,LON` kept as text; malformed input is left for the sampler to
/// report as an absent value.
fn parse_point(s: &str) -> GeoPoint {
    match s.split_once(',') {
        Some((lat, lon)) => GeoPoint::new(lat.trim(), lon.trim()),
        None => GeoPoint::new(s.trim(), ""),
    }
}

fn read_form(path: &Path) -> Result<Vec<GeoPoint>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read form {}", path.display()))?;
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&text).context("Form must be a flat JSON object")?;

    let form: HashMap<String, String> = object
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (k, text)
        })
        .collect();
    Ok(points_from_indexed_form(&form))
}

fn parse_polygon(s: &str) -> Result<RegionOfInterest> {
    let ring = s
        .split(';')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            let (lon, lat) = pair
                .split_once(',')
                .with_context(|| format!("Vertex must be 'lon,lat', got: {}", pair))?;
            let lon: f64 = lon.trim().parse().context("Invalid longitude")?;
            let lat: f64 = lat.trim().parse().context("Invalid latitude")?;
            Ok([lon, lat])
        })
        .collect::<Result<Vec<_>>>()?;
    RegionOfInterest::from_lon_lat_ring(&ring).context("Invalid region of interest")
}

fn frame_file(index: IndexType, year: i32) -> String {
    format!("{}_{}.tif", index.name().to_lowercase(), year)
}

fn write_frame(
    composite: &AnnualComposite,
    index: IndexType,
    out_dir: &Path,
) -> Result<ManifestFrame> {
    let file = frame_file(index, composite.year);
    write_result(&composite.grid, &out_dir.join(&file))?;
    Ok(ManifestFrame {
        year: composite.year,
        file,
        scene_id: composite.scene_id.clone(),
        cloud_cover: composite.cloud_cover,
        mean: composite.grid.statistics().mean,
    })
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let pb = spinner("Reading raster...");
            let raster: Raster<f64> =
                read_geotiff(&input, None).context("Failed to read raster")?;
            pb.finish_and_clear();

            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }

        // ── Indices ──────────────────────────────────────────────────
        Commands::Indices => {
            for index in IndexType::ALL {
                let series = if index.has_two_band_form() {
                    "uploaded bands, time series"
                } else {
                    "uploaded bands"
                };
                println!("{:<6} {}", index.name(), series);
            }
        }

        // ── Analyze ──────────────────────────────────────────────────
        Commands::Analyze {
            bands,
            index,
            points,
            form,
            year,
            study_area,
            strict,
            output,
            preview_rgba,
        } => {
            let mut coordinates: Vec<GeoPoint> = points.iter().map(|p| parse_point(p)).collect();
            if let Some(form) = &form {
                coordinates.extend(read_form(form)?);
            }

            let sources = bands
                .iter()
                .map(|path| {
                    GeoTiffSource::open(path)
                        .with_context(|| format!("Failed to open {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;
            let epsg = sources.first().and_then(|s| s.crs()).map(|crs| crs.epsg());

            let request = BandAnalysisRequest::new(sources)
                .with_index(index)
                .with_year(year)
                .with_study_area(study_area)
                .with_points(coordinates);
            let options = if strict {
                AlignOptions::strict()
            } else {
                AlignOptions::default()
            };

            let pb = spinner("Computing index...");
            let start = Instant::now();
            let analysis = run_band_analysis(&request, &options).context("Band analysis failed")?;
            pb.finish_and_clear();
            info!("{} computed in {:.2?}", analysis.title, start.elapsed());

            if let Some(path) = &output {
                let mut grid = analysis.grid.clone();
                grid.set_crs(epsg.map(CRS::from_epsg));
                write_result(&grid, path)?;
                info!("Index grid saved to: {}", path.display());
            }

            let vis = preview_vis_params(&analysis.grid, analysis.index);
            if let Some(path) = &preview_rgba {
                let rgba = raster_to_rgba(&analysis.grid, &vis.colormap());
                fs::write(path, rgba)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                let (rows, cols) = analysis.grid.shape();
                info!("Preview ({} x {} RGBA) saved to: {}", cols, rows, path.display());
            }

            let report = AnalysisReport {
                title: &analysis.title,
                study_area: &analysis.study_area,
                coordinates: &analysis.samples,
                message: "Analysis completed successfully".to_string(),
                vis,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        // ── Time series ──────────────────────────────────────────────
        Commands::Timeseries {
            polygon,
            start,
            end,
            index,
            catalog,
            collection,
            platforms,
            max_items,
            out_dir,
        } => {
            let index: IndexType = index.parse()?;
            let roi = parse_polygon(&polygon)?;

            let archive = StacArchive::new(StacArchiveOptions {
                catalog: StacCatalog::from_str_or_url(&catalog),
                client: StacClientOptions {
                    max_items,
                    ..StacClientOptions::default()
                },
                platforms,
                ..StacArchiveOptions::default()
            })
            .context("Failed to create STAC client")?;
            let builder = TimeSeriesBuilder::with_options(
                archive,
                CompositeOptions {
                    collection,
                    ..CompositeOptions::default()
                },
            );

            let pb = spinner(&format!("Building {} series {}-{}...", index, start, end));
            let timer = Instant::now();
            let series = builder
                .build(start, end, &roi, index)
                .context("Time series failed")?;
            pb.finish_and_clear();
            info!(
                "{} of {} years found in {:.2?}",
                series.len(),
                end - start + 1,
                timer.elapsed()
            );

            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            let frames = series
                .iter()
                .map(|composite| write_frame(composite, index, &out_dir))
                .collect::<Result<Vec<_>>>()?;

            let manifest = Manifest {
                index,
                start,
                end,
                years: frames.iter().map(|f| f.year).collect(),
                frames,
                vis: timeseries_vis_params(index),
            };
            let manifest_path = out_dir.join("manifest.json");
            let file = File::create(&manifest_path)
                .with_context(|| format!("Failed to create {}", manifest_path.display()))?;
            serde_json::to_writer_pretty(file, &manifest)?;

            println!("Series saved to: {}", out_dir.display());
            for frame in &manifest.frames {
                println!("  {}  {}  ({})", frame.year, frame.file, frame.scene_id);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_text_is_kept_verbatim() {
        assert_eq!(parse_point("-33.4, -70.6"), GeoPoint::new("-33.4", "-70.6"));
        assert_eq!(parse_point("abc"), GeoPoint::new("abc", ""));
    }

    #[test]
    fn polygon_ring() {
        let roi = parse_polygon("-70.7,-33.5; -70.5,-33.5; -70.5,-33.3;").unwrap();
        assert_eq!(roi.bbox(), (-70.7, -33.5, -70.5, -33.3));
        assert!(parse_polygon("-70.7 -33.5").is_err());
    }

    #[test]
    fn frame_names() {
        assert_eq!(frame_file(IndexType::NDWI, 2021), "ndwi_2021.tif");
    }

    #[test]
    fn form_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coords.json");
        fs::write(
            &path,
            r#"{"coordinates[0][lat]": "-33.4", "coordinates[0][lon]": -70.6,
                "coordinates[2][lat]": "1", "coordinates[2][lon]": "2"}"#,
        )
        .unwrap();

        let points = read_form(&path).unwrap();
        assert_eq!(points, vec![GeoPoint::new("-33.4", "-70.6")]);
    }
}
