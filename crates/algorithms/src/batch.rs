//! Directory batch runners
//!
//! Each runner processes every matching file in a directory, one after
//! another. A failing file is logged and recorded in the [`BatchReport`];
//! the batch carries on with the next file. Only an unreadable input
//! directory aborts the whole run.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use geobatch_core::io::extension_of;
use geobatch_core::Result;

use crate::area::{area_file, AreaParams, AreaSummary};
use crate::cleaning::{clean_file, CleanParams, CleanSummary};
use crate::convert::{geojson_to_dxf, DxfParams};

/// Result of processing a single file
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome<T> {
    pub file: PathBuf,
    /// The file's summary, or the error message that stopped it
    pub result: std::result::Result<T, String>,
}

impl<T> FileOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-file outcomes of a batch run, in processing order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    pub outcomes: Vec<FileOutcome<T>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Summaries of the files that succeeded
    pub fn successes(&self) -> impl Iterator<Item = &T> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Files that failed with their error messages
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.file.as_path(), e.as_str())))
    }

    pub fn succeeded(&self) -> usize {
        self.successes().count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

/// Files directly inside `dir` with the given extension (case-insensitive), sorted by name
pub fn find_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && extension_of(&path).as_deref() == Some(extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn run_batch<T, F, P>(files: Vec<PathBuf>, mut process: F, mut progress: P) -> BatchReport<T>
where
    F: FnMut(&Path) -> Result<T>,
    P: FnMut(&Path),
{
    let mut report = BatchReport::default();
    for file in files {
        progress(&file);
        let result = process(&file).map_err(|e| {
            error!("Error processing {}: {}", file.display(), e);
            e.to_string()
        });
        report.outcomes.push(FileOutcome { file, result });
    }
    report
}

/// Clean every `*.geojson` in `dir` into `dir/<output_dir_name>/`.
///
/// `progress` is called with each file before it is processed.
pub fn clean_directory<P>(dir: &Path, params: &CleanParams, progress: P) -> Result<BatchReport<CleanSummary>>
where
    P: FnMut(&Path),
{
    params.validate()?;
    let output_dir = dir.join(&params.output_dir_name);
    let files: Vec<PathBuf> = find_files(dir, "geojson")?
        .into_iter()
        .filter(|f| !f.starts_with(&output_dir))
        .collect();
    info!("Cleaning {} GeoJSON files in {}", files.len(), dir.display());

    Ok(run_batch(
        files,
        |file| clean_file(file, &output_dir, params),
        progress,
    ))
}

/// Compute areas for every `*.shp` in `dir` that is not itself an area output
pub fn area_directory<P>(
    dir: &Path,
    output_dir: &Path,
    params: &AreaParams,
    progress: P,
) -> Result<BatchReport<AreaSummary>>
where
    P: FnMut(&Path),
{
    params.validate()?;
    let files: Vec<PathBuf> = find_files(dir, "shp")?
        .into_iter()
        .filter(|f| !params.is_output(f))
        .collect();
    info!("Computing areas for {} shapefiles in {}", files.len(), dir.display());

    Ok(run_batch(
        files,
        |file| area_file(file, output_dir, params),
        progress,
    ))
}

/// Convert every `*.geojson` in `dir` to a DXF next to it
pub fn dxf_directory<P>(dir: &Path, params: &DxfParams, progress: P) -> Result<BatchReport<PathBuf>>
where
    P: FnMut(&Path),
{
    params.validate()?;
    let files = find_files(dir, "geojson")?;
    info!("Converting {} GeoJSON files in {} to DXF", files.len(), dir.display());

    Ok(run_batch(files, |file| geojson_to_dxf(file, params), progress))
}
