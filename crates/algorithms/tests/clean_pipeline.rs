//! End-to-end tests for the road cleaning pipeline.
//!
//! Inputs are small GeoJSON files around Lagos (UTM zone 31N) written
//! into a scratch directory; outputs are read back and checked.

use approx::assert_relative_eq;
use geo::{polygon, Euclidean, Geometry, Length, Line};
use geobatch_algorithms::cleaning::{clean_file, CleanParams};
use geobatch_algorithms::batch::clean_directory;
use geobatch_algorithms::vector::HoleMode;
use geobatch_core::io::{read_geojson, write_geojson};
use geobatch_core::{Feature, FeatureCollection, CRS};

/// Roughly 11 m east-west by 1.1 m north-south
fn thin_block() -> Geometry<f64> {
    Geometry::Polygon(polygon![
        (x: 3.3800, y: 6.5200),
        (x: 3.3801, y: 6.5200),
        (x: 3.3801, y: 6.52001),
        (x: 3.3800, y: 6.52001),
        (x: 3.3800, y: 6.5200),
    ])
}

/// Same block with a hole whose sides are about 4.4 m and 0.2 m
fn block_with_courtyard() -> Geometry<f64> {
    Geometry::Polygon(polygon!(
        exterior: [
            (x: 3.3800, y: 6.5200),
            (x: 3.3801, y: 6.5200),
            (x: 3.3801, y: 6.52001),
            (x: 3.3800, y: 6.52001),
            (x: 3.3800, y: 6.5200),
        ],
        interiors: [
            [
                (x: 3.38003, y: 6.520004),
                (x: 3.38007, y: 6.520004),
                (x: 3.38007, y: 6.520006),
                (x: 3.38003, y: 6.520006),
                (x: 3.38003, y: 6.520004),
            ],
        ],
    ))
}

fn write_input(dir: &std::path::Path, name: &str, geoms: Vec<Geometry<f64>>) -> std::path::PathBuf {
    let path = dir.join(name);
    let fc = FeatureCollection::from_geometries(geoms, CRS::wgs84());
    write_geojson(&fc, &path).unwrap();
    path
}

fn segment_of(feature: &Feature) -> Line<f64> {
    match &feature.geometry {
        Some(Geometry::LineString(ls)) if ls.0.len() == 2 => Line::new(ls.0[0], ls.0[1]),
        other => panic!("expected a two-vertex line string, got {:?}", other),
    }
}

#[test]
fn polygon_and_duplicate_give_two_long_segments() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "roads.geojson", vec![thin_block(), thin_block()]);
    let out_dir = dir.path().join("cleaned_output");

    let summary = clean_file(&input, &out_dir, &CleanParams::default()).unwrap();
    assert_eq!(summary.original_count, 2);
    assert_eq!(summary.duplicates_removed, 1);
    assert_eq!(summary.segments_produced, 4);
    assert_eq!(summary.segments_kept, 2);
    assert_eq!(summary.output.as_deref(), Some(out_dir.join("roads.geojson").as_path()));

    let written = read_geojson(out_dir.join("roads.geojson")).unwrap();
    assert_eq!(written.crs().epsg(), Some(4326));
    assert_eq!(written.len(), 2);

    // Survivors are the two long east-west edges, in geographic coordinates
    let metric = written.clone().to_crs(&CRS::utm(31, true)).unwrap();
    for feature in metric.iter() {
        let segment = segment_of(feature);
        assert!(segment.length::<Euclidean>() > 3.5);
        assert_relative_eq!(segment.start.y, segment.end.y, epsilon = 0.05);
    }
    for feature in written.iter() {
        let segment = segment_of(feature);
        assert!(segment.start.x > 3.37 && segment.start.x < 3.39);
        assert!(segment.start.y > 6.51 && segment.start.y < 6.53);
    }
}

#[test]
fn segments_follow_source_vertex_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "order.geojson", vec![thin_block()]);
    let out_dir = dir.path().join("out");
    clean_file(&input, &out_dir, &CleanParams::default()).unwrap();

    let written = read_geojson(out_dir.join("order.geojson")).unwrap();
    let first = segment_of(&written.features()[0]);
    let second = segment_of(&written.features()[1]);

    // First kept edge runs west to east along the south side, the second east to west along the north
    assert_relative_eq!(first.start.x, 3.3800, epsilon = 1e-7);
    assert_relative_eq!(first.end.x, 3.3801, epsilon = 1e-7);
    assert_relative_eq!(second.start.x, 3.3801, epsilon = 1e-7);
    assert!(second.start.y > first.start.y);
}

#[test]
fn include_holes_adds_long_courtyard_edges() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "courtyard.geojson", vec![block_with_courtyard()]);

    let excluded = clean_file(&input, &dir.path().join("a"), &CleanParams::default()).unwrap();
    assert_eq!(excluded.segments_produced, 4);
    assert_eq!(excluded.segments_kept, 2);

    let params = CleanParams {
        holes: HoleMode::Include,
        ..CleanParams::default()
    };
    let included = clean_file(&input, &dir.path().join("b"), &params).unwrap();
    assert_eq!(included.segments_produced, 8);
    assert_eq!(included.segments_kept, 4);
}

#[test]
fn short_segments_only_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let tiny = Geometry::Polygon(polygon![
        (x: 3.38000, y: 6.52000),
        (x: 3.38001, y: 6.52000),
        (x: 3.38001, y: 6.52001),
        (x: 3.38000, y: 6.52000),
    ]);
    let input = write_input(dir.path(), "tiny.geojson", vec![tiny]);
    let out_dir = dir.path().join("cleaned_output");

    let summary = clean_file(&input, &out_dir, &CleanParams::default()).unwrap();
    assert_eq!(summary.segments_produced, 3);
    assert_eq!(summary.segments_kept, 0);
    assert!(summary.output.is_none());
    assert!(!out_dir.join("tiny.geojson").exists());
}

#[test]
fn directory_run_reports_every_file() {
    let dir = tempfile::tempdir().unwrap();
    write_input(dir.path(), "a.geojson", vec![thin_block()]);
    write_input(dir.path(), "b.geojson", vec![thin_block(), thin_block(), thin_block()]);
    std::fs::write(dir.path().join("c.geojson"), "not json at all").unwrap();

    let report = clean_directory(dir.path(), &CleanParams::default(), |_| {}).unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let dup_counts: Vec<usize> = report.successes().map(|s| s.duplicates_removed).collect();
    assert_eq!(dup_counts, vec![0, 2]);
    assert!(dir.path().join("cleaned_output").join("a.geojson").exists());
    assert!(dir.path().join("cleaned_output").join("b.geojson").exists());
}
