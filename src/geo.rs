// SPDX-License-Identifier: MIT

//! Great-circle distance between GPS fixes.

use crate::models::Coordinate;
use geo::{Distance, Haversine, Point};

/// Errors from distance computation.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Coordinate out of range or non-finite: ({0}, {1})")]
    InvalidCoordinate(f64, f64),
}

/// Haversine surface distance in meters.
///
/// Spherical approximation; well within 0.5% of geodesic distance for the
/// segment lengths GPS trackers report. Rejects non-finite or out-of-range
/// coordinates instead of returning NaN.
pub fn distance(a: Coordinate, b: Coordinate) -> Result<f64, GeoError> {
    for c in [a, b] {
        if !c.is_valid() {
            return Err(GeoError::InvalidCoordinate(c.latitude, c.longitude));
        }
    }

    let p1 = Point::new(a.longitude, a.latitude);
    let p2 = Point::new(b.longitude, b.latitude);
    Ok(Haversine.distance(p1, p2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let p = Coordinate::new(31.5204, 74.3587);
        assert_eq!(distance(p, p).unwrap(), 0.0);
    }

    #[test]
    fn test_short_segment_east() {
        // ~4.7m of longitude at this latitude
        let a = Coordinate::new(31.5204, 74.3587);
        let b = Coordinate::new(31.5204, 74.35875);
        let d = distance(a, b).unwrap();
        assert!((4.0..5.5).contains(&d), "got {}", d);
    }

    #[test]
    fn test_known_city_pair() {
        // Lahore to Islamabad, roughly 270 km
        let lahore = Coordinate::new(31.5204, 74.3587);
        let islamabad = Coordinate::new(33.6844, 73.0479);
        let d = distance(lahore, islamabad).unwrap();
        assert!((260_000.0..290_000.0).contains(&d), "got {}", d);
    }

    #[test]
    fn test_rejects_non_finite() {
        let a = Coordinate::new(f64::NAN, 74.0);
        let b = Coordinate::new(31.0, 74.0);
        assert!(distance(a, b).is_err());
        assert!(distance(b, a).is_err());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let a = Coordinate::new(91.0, 0.0);
        let b = Coordinate::new(0.0, 0.0);
        assert!(distance(a, b).is_err());

        let c = Coordinate::new(0.0, 181.0);
        assert!(distance(b, c).is_err());
    }
}
