//! Incident zones managed by operators.
//!
//! Each incident is a circular zone (center + radius in meters). Active
//! incidents form the snapshot that location checks are matched against,
//! so every write here invalidates the active-zone cache.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/v1/incidents` | API key | Create incident |
//! | GET | `/api/v1/incidents` | API key | List incidents (paginated) |
//! | GET | `/api/v1/incidents/stats` | API key | Distinct visitors per zone |
//! | GET | `/api/v1/incidents/{id}` | API key | Get incident |
//! | PUT | `/api/v1/incidents/{id}` | API key | Update incident |
//! | DELETE | `/api/v1/incidents/{id}` | API key | Deactivate incident |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::IncidentService;
