mod health_dto;

pub use health_dto::{DependenciesDto, DependencyStatus, HealthReportDto};
