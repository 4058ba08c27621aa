//! Error types and handling
//!
//! Domain-specific error enums (configuration, container runtime) are wrapped
//! in the top-level [`FixtureError`] together with the fixture lifecycle
//! failures: launch, port query, and cleanup.

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No image reference was configured
    #[error("No image configured: an image reference is required to launch a container")]
    MissingImage,

    /// The shell-quoted argument string could not be split
    #[error("Invalid container arguments: {message}")]
    InvalidArgs { message: String },

    /// Unknown container runtime name
    #[error("Unknown runtime: {name}. Supported runtimes: docker, podman")]
    UnknownRuntime { name: String },
}

/// Container runtime CLI errors
#[derive(Error, Debug)]
pub enum DockerError {
    /// Runtime binary is not installed or not accessible
    #[error("Container runtime is not installed or not accessible")]
    NotInstalled,

    /// Runtime CLI could not be driven (spawn failure, undecodable output)
    #[error("Docker CLI error: {0}")]
    CLIError(String),

    /// Runtime command exited unsuccessfully
    #[error("Runtime command `{command}` failed (exit code {}): {stderr}", display_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
}

/// Main error enum for fixture setup and teardown
#[derive(Error, Debug)]
pub enum FixtureError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Runtime-related errors outside of the setup steps
    #[error("Docker error: {0}")]
    Docker(#[from] DockerError),

    /// The container could not be launched
    #[error("Failed to launch container: {message}")]
    Launch { message: String },

    /// The port listing for a launched container could not be obtained
    #[error("Failed to query ports of container {container_id}: {message}")]
    Query {
        container_id: String,
        message: String,
    },

    /// The container could not be stopped during teardown
    #[error("Failed to stop container {container_id}: {message}")]
    Cleanup {
        container_id: String,
        message: String,
    },
}

/// Convenience type alias for Results with FixtureError
pub type Result<T> = std::result::Result<T, FixtureError>;
