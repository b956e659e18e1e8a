//! Per-feature area in hectares
//!
//! Reprojects a polygon layer into a metric CRS, attaches `fid` and
//! `area_ha` to every feature, writes the result (source attributes
//! included) as a shapefile and summarizes the areas.

use geobatch_core::io::{read_vector, write_shapefile};
use geobatch_core::{AttributeValue, Error, Feature, FeatureCollection, Result, CRS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::vector::area_hectares;

/// Attribute holding the feature's position in its source layer
pub const FID_FIELD: &str = "fid";
/// Attribute holding the area in hectares
pub const AREA_FIELD: &str = "area_ha";

/// Parameters for the area calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaParams {
    /// Metric CRS areas are measured in
    #[serde(with = "crate::crs_serde")]
    pub target_crs: CRS,
    /// Appended to the input stem to name the output shapefile
    pub output_suffix: String,
}

impl Default for AreaParams {
    fn default() -> Self {
        Self {
            target_crs: CRS::utm(31, true),
            output_suffix: "_with_area".to_string(),
        }
    }
}

impl AreaParams {
    pub fn validate(&self) -> Result<()> {
        if !self.target_crs.is_metric() {
            return Err(Error::InvalidParameter {
                name: "target_crs",
                value: self.target_crs.identifier(),
                reason: "areas in hectares need a metric CRS".to_string(),
            });
        }
        Ok(())
    }

    /// Output file name for an input path: `<stem><suffix>.shp`
    pub fn output_name(&self, input: &Path) -> String {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}{}.shp", stem, self.output_suffix)
    }

    /// Whether a path is an output of this calculator
    pub fn is_output(&self, path: &Path) -> bool {
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.ends_with(&self.output_suffix))
    }
}

/// Summary statistics for one processed layer, areas in hectares
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummary {
    pub filename: String,
    pub count: usize,
    pub min_area: f64,
    pub max_area: f64,
    pub total_area: f64,
}

impl AreaSummary {
    /// Summarize the `area_ha` attribute of a collection, rounded to 2 decimals
    pub fn from_collection(filename: impl Into<String>, collection: &FeatureCollection) -> Self {
        let areas: Vec<f64> = collection
            .iter()
            .filter_map(|f| f.get_property(AREA_FIELD).and_then(AttributeValue::as_f64))
            .collect();

        let (min, max, total) = if areas.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            areas.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY, 0.0),
                |(min, max, total), &a| (min.min(a), max.max(a), total + a),
            )
        };

        Self {
            filename: filename.into(),
            count: collection.len(),
            min_area: round2(min),
            max_area: round2(max),
            total_area: round2(total),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reproject into the target CRS (when needed) and attach `fid` and `area_ha`
pub fn compute_areas(collection: FeatureCollection, params: &AreaParams) -> Result<FeatureCollection> {
    params.validate()?;

    let collection = if collection.crs().is_equivalent(&params.target_crs) {
        collection
    } else {
        collection.to_crs(&params.target_crs)?
    };

    let crs = collection.crs().clone();
    let features = collection
        .into_iter()
        .enumerate()
        .map(|(fid, mut feature)| {
            let area = feature.geometry.as_ref().map_or(0.0, area_hectares);
            feature.set_property(FID_FIELD, AttributeValue::Int(fid as i64));
            feature.set_property(AREA_FIELD, AttributeValue::Float(area));
            feature
        })
        .collect::<Vec<Feature>>();

    Ok(FeatureCollection::from_features(features, crs))
}

/// Compute areas for one layer and write `output_dir/<stem>_with_area.shp`
pub fn area_file(input: &Path, output_dir: &Path, params: &AreaParams) -> Result<AreaSummary> {
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidParameter {
            name: "input",
            value: input.display().to_string(),
            reason: "not a file path".to_string(),
        })?;

    info!("Processing {}", input.display());
    let collection = compute_areas(read_vector(input)?, params)?;
    let summary = AreaSummary::from_collection(filename, &collection);

    if collection.geometries().flatten().next().is_none() {
        warn!("{}: no geometries, nothing written", input.display());
        return Ok(summary);
    }

    std::fs::create_dir_all(output_dir)?;
    let output: PathBuf = output_dir.join(params.output_name(input));
    write_shapefile(&collection, &output, &[FID_FIELD, AREA_FIELD])?;
    info!("Saved to {}", output.display());

    Ok(summary)
}

/// Fixed-width console table of area summaries
#[derive(Debug, Clone, Default)]
pub struct AreaReport {
    pub title: String,
    pub rows: Vec<AreaSummary>,
}

impl AreaReport {
    pub fn new(title: impl Into<String>, rows: Vec<AreaSummary>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }
}

impl fmt::Display for AreaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(60);
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:30} {:>6} {:>10} {:>10} {:>10}",
            "Shapefile", "Count", "Min", "Max", "Total"
        )?;
        writeln!(f, "{}", rule)?;
        for row in &self.rows {
            let name: String = row.filename.chars().take(30).collect();
            writeln!(
                f,
                "{:30} {:>6} {:>10} {:>10} {:>10}",
                name, row.count, row.min_area, row.max_area, row.total_area
            )?;
        }
        Ok(())
    }
}
