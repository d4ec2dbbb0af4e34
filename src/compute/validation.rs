//! Validation for geographic coordinates and query parameters.

use crate::error::{GeoShardError, Result};
use geoshard_types::bbox::BoundingBox;
use geoshard_types::point::Location;

/// Validates a location has finite, in-range latitude and longitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use geoshard::compute::validation::validate_location;
/// use geoshard::Location;
///
/// assert!(validate_location(&Location::new(40.7128, -74.0060)).is_ok());
/// assert!(validate_location(&Location::new(40.0, 200.0)).is_err());
/// assert!(validate_location(&Location::new(95.0, -74.0)).is_err());
/// ```
pub fn validate_location(location: &Location) -> Result<()> {
    if location.is_valid() {
        return Ok(());
    }

    let (lat, lon) = (location.lat, location.lon);

    if !lon.is_finite() {
        return Err(GeoShardError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lon
        )));
    }

    if !lat.is_finite() {
        return Err(GeoShardError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeoShardError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lon
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoShardError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    Ok(())
}

/// Validates a query box: finite corners, `bottom_left` not north or east of
/// `top_right`. Zero-width and zero-height boxes are accepted.
///
/// # Examples
///
/// ```
/// use geoshard::compute::validation::validate_bbox;
/// use geoshard::BoundingBox;
///
/// assert!(validate_bbox(&BoundingBox::from_bounds(32.0, -125.0, 42.0, -114.0)).is_ok());
/// assert!(validate_bbox(&BoundingBox::from_bounds(42.0, -125.0, 32.0, -114.0)).is_err());
/// ```
pub fn validate_bbox(bbox: &BoundingBox) -> Result<()> {
    let corners = [bbox.min_lat(), bbox.min_lon(), bbox.max_lat(), bbox.max_lon()];
    if !corners.iter().all(|v| v.is_finite()) {
        return Err(GeoShardError::InvalidInput(
            "Bounding box coordinates must be finite".to_string(),
        ));
    }

    if bbox.min_lat() > bbox.max_lat() {
        return Err(GeoShardError::InvalidInput(format!(
            "min_lat ({}) must be <= max_lat ({})",
            bbox.min_lat(),
            bbox.max_lat()
        )));
    }

    if bbox.min_lon() > bbox.max_lon() {
        return Err(GeoShardError::InvalidInput(format!(
            "min_lon ({}) must be <= max_lon ({})",
            bbox.min_lon(),
            bbox.max_lon()
        )));
    }

    Ok(())
}

/// Validates a radius query: a valid center and a finite, non-negative radius.
pub fn validate_radius(center: &Location, radius_km: f64) -> Result<()> {
    validate_location(center)?;

    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(GeoShardError::InvalidInput(format!(
            "Radius must be finite and non-negative, got: {}",
            radius_km
        )));
    }

    Ok(())
}
