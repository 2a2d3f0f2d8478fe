mod check_recorder;
mod geofence_matcher;
mod location_check_service;
mod zone_store;

pub use check_recorder::{CheckRecorder, PgCheckRecorder};
pub use geofence_matcher::match_zones;
pub use location_check_service::LocationCheckService;
pub use zone_store::ZoneStore;
