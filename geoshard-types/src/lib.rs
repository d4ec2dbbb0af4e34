//! # geoshard-types
//!
//! Core geographic data types for the geoshard partitioned index.
//!
//! - **Point types**: `Location`, `Point`
//! - **Region types**: `BoundingBox`
//!
//! All types are serializable with Serde and convert to and from the `geo`
//! crate's primitives. Coordinates are stored as latitude/longitude degrees.
//!
//! ## Examples
//!
//! ```rust
//! use geoshard_types::point::{Location, Point};
//! use geoshard_types::bbox::BoundingBox;
//!
//! let sf = Point::new("SF", 37.7749, -122.4194);
//! let california = BoundingBox::new(Location::new(32.0, -125.0), Location::new(42.0, -114.0));
//! assert!(california.contains(sf.location.as_ref().unwrap()));
//! ```

pub mod bbox;
pub mod point;
