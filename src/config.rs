//! Run configuration: every knob a front end can set, validated before any
//! network activity.

use crate::catalog::{Catalog, Section, Suite};
use crate::engine::{self, EngineConfig};
use crate::mutate::MutationKind;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown suite: {0}")]
    UnknownSuite(String),
    #[error("Unknown mode: {0}")]
    UnknownMode(String),
    #[error("Unknown mutation kind: {0}")]
    UnknownMutationKind(String),
    #[error("Unknown transport: {0}")]
    UnknownTransport(String),
    #[error("Transport not available in this build: {0}")]
    TransportUnavailable(TransportKind),
    #[error("Unsupported combination: {mode} mode with {transport} transport")]
    UnsupportedCombination { mode: String, transport: TransportKind },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("Target host is empty")]
    EmptyHost,
    #[error("No suites selected")]
    NoSuites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Stream socket (TCP).
    Stream,
    /// Raw packet crafting below the socket layer.
    Raw,
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stream" | "tcp" => Ok(TransportKind::Stream),
            "raw" => Ok(TransportKind::Raw),
            other => Err(ConfigError::UnknownTransport(other.to_string())),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stream => f.write_str("stream"),
            TransportKind::Raw => f.write_str("raw"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Single,
    Iteration { iterations: usize },
    Mutation { count: usize, kind: MutationKind, seed: u64 },
    Load { duration: Duration },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Single => "single",
            Mode::Iteration { .. } => "iteration",
            Mode::Mutation { .. } => "mutation",
            Mode::Load { .. } => "load",
        }
    }
}

/// Which suites to run: `all`, a section number (`1`, `2`), or a comma list of
/// suite ids (`1.1.1,2.1.3`).
pub fn parse_suites(spec: &str) -> Result<Catalog, ConfigError> {
    let spec = spec.trim();
    if spec.is_empty() || spec.eq_ignore_ascii_case("all") {
        return Ok(Catalog::all());
    }
    if let Some(section) = spec.parse::<u32>().ok().and_then(Section::from_number) {
        return Ok(Catalog::for_sections(&[section]));
    }
    let suites = spec
        .split(',')
        .map(|id| Suite::from_id(id).ok_or_else(|| ConfigError::UnknownSuite(id.trim().to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Catalog::from_suites(suites))
}

pub fn parse_mutation_kind(s: &str) -> Result<MutationKind, ConfigError> {
    s.parse().map_err(ConfigError::UnknownMutationKind)
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub delay: Duration,
    pub catalog: Catalog,
    pub mode: Mode,
    pub health_check: bool,
    pub transport: TransportKind,
    pub max_response_size: usize,
    pub output: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            host: "127.0.0.1".to_string(),
            port: engine::DEFAULT_PORT,
            timeout: engine::DEFAULT_TIMEOUT,
            delay: engine::DEFAULT_DELAY,
            catalog: Catalog::all(),
            mode: Mode::Single,
            health_check: true,
            transport: TransportKind::Stream,
            max_response_size: engine::DEFAULT_MAX_RESPONSE,
            output: None,
        }
    }
}

impl RunConfig {
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::Zero("port"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Zero("timeout"));
        }
        if self.max_response_size == 0 {
            return Err(ConfigError::Zero("max response size"));
        }
        if self.catalog.is_empty() {
            return Err(ConfigError::NoSuites);
        }
        match self.mode {
            Mode::Iteration { iterations: 0 } => return Err(ConfigError::Zero("iteration count")),
            Mode::Mutation { count: 0, .. } => return Err(ConfigError::Zero("mutation count")),
            Mode::Load { duration } if duration.is_zero() => return Err(ConfigError::Zero("load duration")),
            _ => {}
        }
        match (self.transport, &self.mode) {
            (TransportKind::Stream, _) => Ok(()),
            (TransportKind::Raw, Mode::Load { .. }) => Err(ConfigError::UnsupportedCombination {
                mode: self.mode.name().to_string(),
                transport: self.transport,
            }),
            (TransportKind::Raw, _) => Err(ConfigError::TransportUnavailable(self.transport)),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            host: self.host.clone(),
            port: self.port,
            timeout: self.timeout,
            delay: self.delay,
            health_check: self.health_check,
            max_response_size: self.max_response_size,
            ..EngineConfig::default()
        }
    }
}
