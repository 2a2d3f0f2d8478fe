mod location_dto;

pub use location_dto::{LocationCheckRequestDto, LocationCheckResponseDto, NearbyIncidentDto};
