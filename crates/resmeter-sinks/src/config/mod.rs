//! resmeter config loader (strict parsing).

pub mod schema;

use std::fs;

use resmeter_core::error::{ResmeterError, Result};

pub use schema::{BackendKind, ExporterSection, ResmeterConfig, SinkConfig};

pub fn load_from_file(path: &str) -> Result<ResmeterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ResmeterError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ResmeterConfig> {
    let cfg: ResmeterConfig = serde_yaml::from_str(s)
        .map_err(|e| ResmeterError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
