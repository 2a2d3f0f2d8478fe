use crate::features::incidents::models::Incident;
use crate::features::locations::models::{GeoPoint, ZoneMatch};

/// Mean Earth radius in kilometers (for Haversine formula)
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers
///
/// Uses the `atan2` form of the Haversine formula, which stays well
/// conditioned for identical and antipodal points.
pub fn haversine_distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] near antipodes
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Select the zones whose radius contains the observer
///
/// The boundary is inclusive. Output keeps the input order and reports
/// distances in meters. Inactive zones never match.
pub fn match_zones(observer: GeoPoint, zones: &[Incident]) -> Vec<ZoneMatch> {
    zones
        .iter()
        .filter(|zone| zone.active)
        .filter_map(|zone| {
            let distance_km = haversine_distance_km(observer, zone.center());
            within_radius(distance_km, zone.radius).then(|| ZoneMatch {
                zone: zone.clone(),
                distance_meters: distance_km * 1000.0,
            })
        })
        .collect()
}

/// Radius is stored in meters while the comparison runs in kilometers
fn within_radius(distance_km: f64, radius_meters: f64) -> bool {
    distance_km <= radius_meters / 1000.0
}
