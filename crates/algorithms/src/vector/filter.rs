//! Segment length filtering

use geo::{Euclidean, Length, Line};

/// Keep segments whose planar length is strictly greater than `min_length`.
///
/// Lengths are in the units of the segment coordinates, so segments must
/// already be in a metric CRS for `min_length` to mean meters.
pub fn filter_by_length<I>(segments: I, min_length: f64) -> Vec<Line<f64>>
where
    I: IntoIterator<Item = Line<f64>>,
{
    segments
        .into_iter()
        .filter(|segment| segment.length::<Euclidean>() > min_length)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn horizontal(len: f64) -> Line<f64> {
        Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: len, y: 0.0 })
    }

    #[test]
    fn threshold_is_exclusive() {
        let kept = filter_by_length(vec![horizontal(3.5), horizontal(3.5001), horizontal(1.0)], 3.5);
        assert_eq!(kept, vec![horizontal(3.5001)]);
    }

    #[test]
    fn kept_and_dropped_partition_the_input() {
        let input: Vec<Line<f64>> = (0..20).map(|i| horizontal(i as f64 * 0.5)).collect();
        let kept = filter_by_length(input.clone(), 3.5);
        assert!(kept.iter().all(|s| s.length::<Euclidean>() > 3.5));
        let dropped = input.iter().filter(|s| !kept.contains(s));
        assert!(dropped.into_iter().all(|s| s.length::<Euclidean>() <= 3.5));
        assert_eq!(kept.len(), 12);
    }

    #[test]
    fn diagonal_uses_euclidean_length() {
        let diagonal = Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 3.0, y: 4.0 });
        assert_eq!(filter_by_length(vec![diagonal], 4.9).len(), 1);
        assert!(filter_by_length(vec![diagonal], 5.0).is_empty());
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(filter_by_length(Vec::new(), 3.5).is_empty());
    }
}
