//! Vector geometry algorithms
//!
//! - Duplicates: tolerance-based exact-equality scan
//! - Segments: explode boundaries into two-point lines
//! - Filter: keep segments above a length threshold
//! - Measurements: planar area

mod duplicates;
mod filter;
mod measurements;
mod segments;

pub use duplicates::{equals_exact, find_duplicates, find_duplicates_with_progress, PROGRESS_INTERVAL};
pub use filter::filter_by_length;
pub use measurements::{area, area_hectares, SQUARE_METERS_PER_HECTARE};
pub use segments::{explode_to_segments, segments_iter, HoleMode};
