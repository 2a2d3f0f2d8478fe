mod geo_point;
mod location_check;

pub use geo_point::GeoPoint;
pub use location_check::{LocationCheckRecord, LocationCheckResult, ZoneMatch};
