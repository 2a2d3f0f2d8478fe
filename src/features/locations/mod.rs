//! Location checks against active incident zones.
//!
//! A check loads the active-zone snapshot (cache first, database on a
//! miss), finds every zone whose radius contains the point, records the
//! check, and hands an alert to the notification pipeline when anything
//! matched.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/v1/location/check` | No | Check a location against active zones |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::{LocationCheckService, PgCheckRecorder};
