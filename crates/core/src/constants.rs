//! Constants used throughout the EHR core crate.

/// Default REST listen address; port 8000 is what the browser front end expects.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8000";

/// Environment variable naming the REST listen address.
pub const REST_ADDR_ENV: &str = "EHR_REST_ADDR";

/// Environment variable naming an optional reference range YAML file.
pub const REFERENCE_RANGES_ENV: &str = "EHR_REFERENCE_RANGES";

/// Environment variable controlling whether sample data is loaded at start-up.
pub const SEED_ENV: &str = "EHR_SEED";

/// Reference range catalogue compiled into the crate.
pub const BUNDLED_REFERENCE_RANGES: &str = include_str!("../data/reference_ranges.yaml");
