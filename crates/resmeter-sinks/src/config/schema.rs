use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;

use resmeter_core::catalog::ManagerClass;
use resmeter_core::error::{ResmeterError, Result};
use resmeter_core::precision::{Precision, PrecisionUnit};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResmeterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    #[serde(default)]
    pub default_precision: PrecisionUnit,

    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

impl ResmeterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ResmeterError::UnsupportedVersion);
        }

        self.exporter.validate()?;

        let mut seen = HashSet::new();
        for s in &self.sinks {
            if s.identity.trim().is_empty() {
                return Err(ResmeterError::BadConfig(
                    "sinks[].identity must not be empty".into(),
                ));
            }
            if !seen.insert((s.class, s.identity.as_str())) {
                return Err(ResmeterError::BadConfig(format!(
                    "duplicate sink {}/{}",
                    s.class, s.identity
                )));
            }
        }
        Ok(())
    }

    /// Precision of one sink, falling back to `default_precision`.
    pub fn precision_of(&self, sink: &SinkConfig) -> Precision {
        Precision::from(sink.precision.unwrap_or(self.default_precision))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if !self.path.starts_with('/') {
            return Err(ResmeterError::BadConfig(
                "exporter.path must start with '/'".into(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            ResmeterError::BadConfig(format!("exporter.listen must be a socket address: {e}"))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:9464".into()
}
fn default_path() -> String {
    "/metrics".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Aggregate,
    Log,
    Noop,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    pub identity: String,
    pub class: ManagerClass,
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    #[serde(default)]
    pub precision: Option<PrecisionUnit>,
}

fn default_backend() -> BackendKind {
    BackendKind::Aggregate
}
