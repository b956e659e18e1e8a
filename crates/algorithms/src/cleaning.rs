//! Road cleaning pipeline
//!
//! Turns road polygons/lines into long boundary segments:
//!
//! 1. drop features without geometry
//! 2. drop duplicate geometries (first occurrence kept)
//! 3. reproject into the metric CRS
//! 4. explode every geometry into two-point segments
//! 5. keep segments longer than the minimum length
//! 6. reproject survivors into the geographic CRS
//!
//! [`clean_file`] wraps this with GeoJSON input and output.

use geo::Line;
use geobatch_core::io::{read_geojson, write_geojson};
use geobatch_core::{Error, Feature, FeatureCollection, Result, CRS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::vector::{filter_by_length, find_duplicates, segments_iter, HoleMode};

/// Parameters for the road cleaning pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanParams {
    /// Maximum vertex distance for two geometries to count as duplicates
    pub duplicate_tolerance: f64,
    /// Segments must be strictly longer than this (metric CRS units)
    pub min_segment_length: f64,
    /// CRS used for length measurement; must be metric
    #[serde(with = "crate::crs_serde")]
    pub metric_crs: CRS,
    /// CRS of the written output
    #[serde(with = "crate::crs_serde")]
    pub geographic_crs: CRS,
    /// Whether polygon holes produce segments
    pub holes: HoleMode,
    /// Name of the output directory created inside the batch directory
    pub output_dir_name: String,
}

impl Default for CleanParams {
    fn default() -> Self {
        Self {
            duplicate_tolerance: 1e-6,
            min_segment_length: 3.5,
            metric_crs: CRS::utm(31, true),
            geographic_crs: CRS::wgs84(),
            holes: HoleMode::Exclude,
            output_dir_name: "cleaned_output".to_string(),
        }
    }
}

impl CleanParams {
    /// Parse parameters from JSON; missing keys keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(text).map_err(|e| Error::InvalidParameter {
            name: "config",
            value: text.chars().take(60).collect(),
            reason: e.to_string(),
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path.as_ref())?)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.duplicate_tolerance.is_finite() || self.duplicate_tolerance < 0.0 {
            return Err(Error::InvalidParameter {
                name: "duplicate_tolerance",
                value: self.duplicate_tolerance.to_string(),
                reason: "must be a finite, non-negative distance".to_string(),
            });
        }
        if !self.min_segment_length.is_finite() || self.min_segment_length < 0.0 {
            return Err(Error::InvalidParameter {
                name: "min_segment_length",
                value: self.min_segment_length.to_string(),
                reason: "must be a finite, non-negative length".to_string(),
            });
        }
        if !self.metric_crs.is_metric() {
            return Err(Error::InvalidParameter {
                name: "metric_crs",
                value: self.metric_crs.identifier(),
                reason: "segment lengths need a metric CRS".to_string(),
            });
        }
        if self.output_dir_name.trim().is_empty() {
            return Err(Error::InvalidParameter {
                name: "output_dir_name",
                value: self.output_dir_name.clone(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Counts reported for one cleaned input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    /// Features with geometry before duplicate removal
    pub original_count: usize,
    pub duplicates_removed: usize,
    /// Segments produced before length filtering
    pub segments_produced: usize,
    /// Segments longer than the minimum length
    pub segments_kept: usize,
    /// Written file, `None` when no segment survived
    pub output: Option<PathBuf>,
}

/// Cleaned segments plus the counts that produced them
#[derive(Debug, Clone)]
pub struct CleanResult {
    /// Surviving segments as two-vertex line strings in the geographic CRS
    pub segments: FeatureCollection,
    pub summary: CleanSummary,
}

/// Run the in-memory cleaning steps on a collection
pub fn clean_collection(mut collection: FeatureCollection, params: &CleanParams) -> Result<CleanResult> {
    params.validate()?;

    let nulls = collection.drop_null_geometries();
    if nulls > 0 {
        debug!("Dropped {} features without geometry", nulls);
    }
    let original_count = collection.len();

    info!("Checking {} geometries for duplicates", original_count);
    let duplicates = find_duplicates(collection.geometries(), params.duplicate_tolerance);
    info!("Found {} duplicates", duplicates.len());
    collection.drop_indices(&duplicates);

    collection.reproject(&params.metric_crs)?;

    let segments: Vec<Line<f64>> = collection
        .geometries()
        .flatten()
        .flat_map(|geom| segments_iter(geom, params.holes))
        .collect();
    let segments_produced = segments.len();

    let kept = filter_by_length(segments, params.min_segment_length);
    debug!(
        "Kept {} of {} segments longer than {}",
        kept.len(),
        segments_produced,
        params.min_segment_length
    );

    let segments_kept = kept.len();
    let segments = FeatureCollection::from_features(
        kept.into_iter().map(Feature::from).collect(),
        params.metric_crs.clone(),
    )
    .to_crs(&params.geographic_crs)?;

    Ok(CleanResult {
        segments,
        summary: CleanSummary {
            original_count,
            duplicates_removed: duplicates.len(),
            segments_produced,
            segments_kept,
            output: None,
        },
    })
}

/// Clean one GeoJSON file into `output_dir/<same file name>`.
///
/// When no segment survives the length filter nothing is written and the
/// summary's `output` is `None`.
pub fn clean_file(input: &Path, output_dir: &Path, params: &CleanParams) -> Result<CleanSummary> {
    let file_name = input.file_name().ok_or_else(|| Error::InvalidParameter {
        name: "input",
        value: input.display().to_string(),
        reason: "not a file path".to_string(),
    })?;

    info!("Processing {}", input.display());
    let collection = read_geojson(input)?;
    let CleanResult { segments, mut summary } = clean_collection(collection, params)?;

    if segments.is_empty() {
        warn!(
            "{}: no segments longer than {} left after filtering, nothing written",
            input.display(),
            params.min_segment_length
        );
        return Ok(summary);
    }

    std::fs::create_dir_all(output_dir)?;
    let output = output_dir.join(file_name);
    write_geojson(&segments, &output)?;
    info!("Wrote {} segments to {}", summary.segments_kept, output.display());

    summary.output = Some(output);
    Ok(summary)
}
