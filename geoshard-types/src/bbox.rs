use crate::point::Location;
use geo::{Rect, coord};
use serde::{Deserialize, Serialize};

/// An axis-aligned latitude/longitude rectangle.
///
/// The caller is responsible for `bottom_left` being south-west of
/// `top_right`; containment is inclusive on every edge.
///
/// # Examples
///
/// ```
/// use geoshard_types::bbox::BoundingBox;
/// use geoshard_types::point::Location;
///
/// let bbox = BoundingBox::new(Location::new(32.0, -125.0), Location::new(42.0, -114.0));
/// assert!(bbox.contains(&Location::new(37.7749, -122.4194)));
/// assert!(!bbox.contains(&Location::new(40.7128, -74.0060)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub bottom_left: Location,
    pub top_right: Location,
}

impl BoundingBox {
    pub fn new(bottom_left: Location, top_right: Location) -> Self {
        Self {
            bottom_left,
            top_right,
        }
    }

    /// Build a box from explicit edges.
    pub fn from_bounds(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self::new(Location::new(min_lat, min_lon), Location::new(max_lat, max_lon))
    }

    /// The whole globe, `[-90, -180]` to `[90, 180]`.
    pub fn world() -> Self {
        Self::from_bounds(-90.0, -180.0, 90.0, 180.0)
    }

    pub fn min_lat(&self) -> f64 {
        self.bottom_left.lat
    }

    pub fn min_lon(&self) -> f64 {
        self.bottom_left.lon
    }

    pub fn max_lat(&self) -> f64 {
        self.top_right.lat
    }

    pub fn max_lon(&self) -> f64 {
        self.top_right.lon
    }

    /// Inclusive containment test on both axes.
    pub fn contains(&self, location: &Location) -> bool {
        location.lat >= self.bottom_left.lat
            && location.lat <= self.top_right.lat
            && location.lon >= self.bottom_left.lon
            && location.lon <= self.top_right.lon
    }

    /// Convert to a `geo::Rect` in (lon, lat) order.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.bottom_left.lon, y: self.bottom_left.lat },
            coord! { x: self.top_right.lon, y: self.top_right.lat },
        )
    }
}
