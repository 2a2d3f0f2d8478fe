use crate::core::error::{AppError, Result};

const MIN_LATITUDE: f64 = -90.0;
const MAX_LATITUDE: f64 = 90.0;
const MIN_LONGITUDE: f64 = -180.0;
const MAX_LONGITUDE: f64 = 180.0;

/// A WGS84 coordinate pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting coordinates outside the valid ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(AppError::Validation(format!(
                "Invalid latitude {}: must be between {} and {}",
                latitude, MIN_LATITUDE, MAX_LATITUDE
            )));
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(AppError::Validation(format!(
                "Invalid longitude {}: must be between {} and {}",
                longitude, MIN_LONGITUDE, MAX_LONGITUDE
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build a point from coordinates already validated on the way into storage
    pub(crate) fn unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}
