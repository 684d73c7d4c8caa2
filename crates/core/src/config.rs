//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services, so request
//! handling never reads process-wide environment variables. The `*_from_env_value` helpers
//! take the raw `Option<String>` so they can be tested without touching the environment.

use crate::constants::{DEFAULT_REST_ADDR, REFERENCE_RANGES_ENV, REST_ADDR_ENV, SEED_ENV};
use crate::reference_ranges::ReferenceRangeCatalogue;
use crate::{EhrError, EhrResult};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    rest_addr: SocketAddr,
    reference_ranges_path: Option<PathBuf>,
    seed_on_start: bool,
}

impl CoreConfig {
    pub fn new(
        rest_addr: SocketAddr,
        reference_ranges_path: Option<PathBuf>,
        seed_on_start: bool,
    ) -> Self {
        Self {
            rest_addr,
            reference_ranges_path,
            seed_on_start,
        }
    }

    /// Read `EHR_REST_ADDR`, `EHR_REFERENCE_RANGES` and `EHR_SEED` from the environment.
    ///
    /// # Errors
    ///
    /// Returns `EhrError::InvalidInput` if any variable is present but malformed.
    pub fn from_env() -> EhrResult<Self> {
        Ok(Self::new(
            rest_addr_from_env_value(std::env::var(REST_ADDR_ENV).ok())?,
            reference_ranges_path_from_env_value(std::env::var(REFERENCE_RANGES_ENV).ok()),
            seed_from_env_value(std::env::var(SEED_ENV).ok())?,
        ))
    }

    pub fn rest_addr(&self) -> SocketAddr {
        self.rest_addr
    }

    pub fn reference_ranges_path(&self) -> Option<&Path> {
        self.reference_ranges_path.as_deref()
    }

    pub fn seed_on_start(&self) -> bool {
        self.seed_on_start
    }

    /// Load the configured catalogue, falling back to the bundled one.
    pub fn load_catalogue(&self) -> EhrResult<ReferenceRangeCatalogue> {
        match self.reference_ranges_path() {
            Some(path) => ReferenceRangeCatalogue::from_path(path),
            None => ReferenceRangeCatalogue::bundled(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the REST listen address; blank or missing means [`DEFAULT_REST_ADDR`].
pub fn rest_addr_from_env_value(value: Option<String>) -> EhrResult<SocketAddr> {
    let raw = non_blank(value).unwrap_or_else(|| DEFAULT_REST_ADDR.to_string());
    raw.parse().map_err(|_| {
        EhrError::InvalidInput(format!("{REST_ADDR_ENV} is not a socket address: {raw}"))
    })
}

pub fn reference_ranges_path_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_blank(value).map(PathBuf::from)
}

/// Parse the seed flag. Missing or blank means `true`.
pub fn seed_from_env_value(value: Option<String>) -> EhrResult<bool> {
    match non_blank(value).map(|v| v.to_ascii_lowercase()) {
        None => Ok(true),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(EhrError::InvalidInput(format!(
                "{SEED_ENV} must be true or false, got '{v}'"
            ))),
        },
    }
}
