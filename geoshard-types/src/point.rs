use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
///
/// Latitude is expected in `[-90, 90]` and longitude in `[-180, 180]`. The type
/// itself does not enforce the ranges; the index validates locations before
/// inserting them.
///
/// # Examples
///
/// ```
/// use geoshard_types::point::Location;
///
/// let nyc = Location::new(40.7128, -74.0060);
/// assert_eq!(nyc.to_geo().x(), -74.0060);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Convert to a `geo::Point` (x = longitude, y = latitude).
    pub fn to_geo(&self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }

    /// Whether both coordinates are finite and inside the geographic ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<geo::Point<f64>> for Location {
    fn from(point: geo::Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lon: point.x(),
        }
    }
}

impl From<Location> for geo::Point<f64> {
    fn from(location: Location) -> Self {
        location.to_geo()
    }
}

/// An identified geographic point.
///
/// The identifier is assigned by the caller and is not required to be unique.
/// A point without a location is accepted everywhere but never indexed.
///
/// # Examples
///
/// ```
/// use geoshard_types::point::Point;
///
/// let sf = Point::new("SF", 37.7749, -122.4194);
/// assert!(sf.location.is_some());
///
/// let unplaced = Point::unlocated("pending");
/// assert!(unplaced.location.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    pub location: Option<Location>,
}

impl Point {
    /// Create a point at the given latitude/longitude.
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            location: Some(Location::new(lat, lon)),
        }
    }

    /// Create a point with no location.
    pub fn unlocated(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: None,
        }
    }

    pub fn with_location(id: impl Into<String>, location: Location) -> Self {
        Self {
            id: id.into(),
            location: Some(location),
        }
    }

    pub fn lat(&self) -> Option<f64> {
        self.location.map(|l| l.lat)
    }

    pub fn lon(&self) -> Option<f64> {
        self.location.map(|l| l.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_geo_roundtrip() {
        let loc = Location::new(40.7128, -74.0060);
        let geo_point = loc.to_geo();
        assert_eq!(geo_point.x(), -74.0060);
        assert_eq!(geo_point.y(), 40.7128);
        assert_eq!(Location::from(geo_point), loc);
    }

    #[test]
    fn test_location_validity() {
        assert!(Location::new(90.0, 180.0).is_valid());
        assert!(Location::new(-90.0, -180.0).is_valid());
        assert!(!Location::new(90.1, 0.0).is_valid());
        assert!(!Location::new(0.0, -180.5).is_valid());
        assert!(!Location::new(f64::NAN, 0.0).is_valid());
        assert!(!Location::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_point_accessors() {
        let p = Point::new("LA", 34.0522, -118.2437);
        assert_eq!(p.id, "LA");
        assert_eq!(p.lat(), Some(34.0522));
        assert_eq!(p.lon(), Some(-118.2437));

        let none = Point::unlocated("x");
        assert_eq!(none.lat(), None);
        assert_eq!(none.lon(), None);
    }
}
