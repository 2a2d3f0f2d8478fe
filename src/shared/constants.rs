/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page number a list query may ask for
pub const MAX_PAGE: i64 = 1_000_000;

/// Header carrying the operator API key
pub const API_KEY_HEADER: &str = "x-api-key";
