//! Container runtime abstraction for Docker/Podman.
//!
//! The fixture driver talks to the runtime only through [`ContainerRuntime`],
//! so the CLI-backed implementation can be swapped for the in-process mock
//! in tests.

use crate::docker::CliRuntime;
use crate::errors::{ConfigError, DockerError, FixtureError};

/// Result of a single runtime invocation
pub type RuntimeResult<T> = std::result::Result<T, DockerError>;

/// The three runtime operations a container fixture needs.
///
/// Every call blocks until the runtime process exits.
pub trait ContainerRuntime {
    /// Name of the runtime, also used as the URL scheme of published ports
    fn runtime_name(&self) -> &'static str;

    /// Launch `image` detached with all exposed ports published and return
    /// the runtime's stdout (the container identifier).
    fn run_container(&self, image: &str, args: &[String]) -> RuntimeResult<String>;

    /// Return the `{{.Ports}}` summary of `container_id`
    fn container_ports(&self, container_id: &str) -> RuntimeResult<String>;

    /// Stop `container_id`
    fn stop_container(&self, container_id: &str) -> RuntimeResult<()>;
}

/// Runtime selection options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeKind {
    /// Docker runtime
    #[default]
    Docker,
    /// Podman runtime
    Podman,
}

impl RuntimeKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }
}

impl std::str::FromStr for RuntimeKind {
    type Err = FixtureError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docker" => Ok(Self::Docker),
            "podman" => Ok(Self::Podman),
            _ => Err(ConfigError::UnknownRuntime {
                name: s.to_string(),
            }
            .into()),
        }
    }
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime factory for creating container runtime instances
pub struct RuntimeFactory;

impl RuntimeFactory {
    /// Detect runtime from CLI flag, environment variable, or default
    ///
    /// Precedence: CLI flag > FIXTURED_RUNTIME env var > default (docker)
    pub fn detect_runtime(cli_runtime: Option<RuntimeKind>) -> RuntimeKind {
        if let Some(runtime) = cli_runtime {
            return runtime;
        }

        if let Ok(env_runtime) = std::env::var("FIXTURED_RUNTIME") {
            match env_runtime.parse() {
                Ok(runtime) => return runtime,
                Err(e) => tracing::warn!("Ignoring FIXTURED_RUNTIME: {}", e),
            }
        }

        RuntimeKind::Docker
    }

    /// Create a CLI runtime, optionally overriding the binary path
    pub fn create_runtime(kind: RuntimeKind, runtime_path: Option<String>) -> CliRuntime {
        let runtime = CliRuntime::for_kind(kind);
        match runtime_path {
            Some(path) => runtime.with_runtime_path(path),
            None => runtime,
        }
    }
}
