//! Great-circle distance and radius envelopes.
//!
//! Distances are Haversine distances on a sphere with the Earth's mean radius
//! of 6371 km, computed with `geo`'s `HaversineMeasure`. Inputs are degrees,
//! outputs are kilometers.

use geo::{Distance, HaversineMeasure};
use geoshard_types::bbox::BoundingBox;
use geoshard_types::point::Location;

/// Earth mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Relative and absolute slack added to radius envelopes, in degrees.
const ENVELOPE_PAD: f64 = 1e-9;

#[inline]
fn earth() -> HaversineMeasure {
    HaversineMeasure::new(EARTH_RADIUS_KM)
}

/// Haversine distance in kilometers between two locations.
///
/// # Examples
///
/// ```
/// use geoshard::compute::distance::haversine_km;
/// use geoshard::Location;
///
/// let sf = Location::new(37.7749, -122.4194);
/// let la = Location::new(34.0522, -118.2437);
/// let d = haversine_km(&sf, &la);
/// assert!((d - 559.0).abs() < 5.0);
/// ```
#[inline]
pub fn haversine_km(a: &Location, b: &Location) -> f64 {
    earth().distance(a.to_geo(), b.to_geo())
}

/// Approximate angular radius in degrees: `(radius_km / R) * (180 / PI)`.
#[inline]
pub fn radius_to_degrees(radius_km: f64) -> f64 {
    (radius_km / EARTH_RADIUS_KM).to_degrees()
}

/// Bounding box that contains every location within `radius_km` of `center`.
///
/// Latitude spans `center ± d` where `d` is the angular radius. Longitude
/// spans `center ± asin(sin d / cos lat)`, which is the exact longitude extent
/// of a spherical cap. When the cap touches a pole, or the longitude span
/// crosses the antimeridian, the envelope covers every longitude. The result
/// is padded slightly so boundary points survive floating point rounding.
///
/// This envelope is only used for routing and tree pruning; inclusion is
/// always decided by the exact Haversine distance.
pub fn radius_envelope(center: &Location, radius_km: f64) -> BoundingBox {
    let d = radius_to_degrees(radius_km);
    let pad = d * ENVELOPE_PAD + ENVELOPE_PAD;

    let min_lat = center.lat - d - pad;
    let max_lat = center.lat + d + pad;

    let (min_lon, max_lon) = if min_lat <= -90.0 || max_lat >= 90.0 {
        (-180.0, 180.0)
    } else {
        let ratio = d.to_radians().sin() / center.lat.to_radians().cos();
        if ratio >= 1.0 {
            (-180.0, 180.0)
        } else {
            let dlon = ratio.asin().to_degrees();
            let lo = center.lon - dlon - pad;
            let hi = center.lon + dlon + pad;
            if lo < -180.0 || hi > 180.0 {
                (-180.0, 180.0)
            } else {
                (lo, hi)
            }
        }
    };

    BoundingBox::from_bounds(min_lat.max(-90.0), min_lon, max_lat.min(90.0), max_lon)
}
