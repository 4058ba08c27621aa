//! Docker and OCI container runtime integration
//!
//! This module assembles the runtime command lines a container fixture issues
//! and executes them through the runtime's CLI.

use crate::errors::DockerError;
use crate::runtime::{ContainerRuntime, RuntimeKind, RuntimeResult};
use std::process::Command;
use tracing::{debug, instrument};

/// Arguments for launching `image`: detached, every exposed port published
/// on a random host port, removed once stopped.
pub fn run_command_args(image: &str, args: &[String]) -> Vec<String> {
    let mut cmd = vec![
        "run".to_string(),
        "-d".to_string(),
        "-P".to_string(),
        "--rm".to_string(),
        image.to_string(),
    ];
    cmd.extend(args.iter().cloned());
    cmd
}

/// Arguments for listing the published ports of `container_id`
pub fn ports_command_args(container_id: &str) -> Vec<String> {
    vec![
        "ps".to_string(),
        "-f".to_string(),
        format!("id={}", container_id),
        "--format={{.Ports}}".to_string(),
    ]
}

/// Arguments for stopping `container_id`
pub fn stop_command_args(container_id: &str) -> Vec<String> {
    vec!["stop".to_string(), container_id.to_string()]
}

/// Generic CLI-based container runtime implementation
///
/// Docker and Podman share a compatible CLI, so one implementation serves
/// both; only the binary and the reported name differ.
#[derive(Debug, Clone)]
pub struct CliRuntime {
    kind: RuntimeKind,
    /// Container runtime CLI binary path (e.g., "docker" or "podman")
    runtime_path: String,
}

impl CliRuntime {
    /// Create a new CliRuntime for Docker
    pub fn docker() -> Self {
        Self::for_kind(RuntimeKind::Docker)
    }

    /// Create a new CliRuntime for Podman
    pub fn podman() -> Self {
        Self::for_kind(RuntimeKind::Podman)
    }

    /// Create a runtime invoking the default binary for `kind`
    pub fn for_kind(kind: RuntimeKind) -> Self {
        Self {
            kind,
            runtime_path: kind.as_str().to_string(),
        }
    }

    /// Use a custom runtime binary path
    pub fn with_runtime_path(mut self, runtime_path: String) -> Self {
        self.runtime_path = runtime_path;
        self
    }

    pub fn runtime_path(&self) -> &str {
        &self.runtime_path
    }

    /// Check if container runtime binary is available
    #[instrument(skip(self))]
    pub fn check_runtime_installed(&self) -> RuntimeResult<()> {
        debug!(
            "Checking if container runtime binary is installed at: {}",
            self.runtime_path
        );

        let output = Command::new(&self.runtime_path).arg("--version").output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    debug!("Container runtime binary found and working");
                    Ok(())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(DockerError::CLIError(format!(
                        "Runtime version check failed: {}",
                        stderr.trim()
                    )))
                }
            }
            Err(e) => {
                debug!("Container runtime binary not found: {}", e);
                Err(DockerError::NotInstalled)
            }
        }
    }

    /// Execute container runtime command and return stdout
    #[instrument(skip(self))]
    fn execute(&self, args: &[String]) -> RuntimeResult<String> {
        let command_line = format!("{} {}", self.runtime_path, args.join(" "));
        debug!("Executing runtime command: {}", command_line);

        let output = Command::new(&self.runtime_path)
            .args(args)
            .output()
            .map_err(|e| {
                DockerError::CLIError(format!("Failed to execute runtime command: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DockerError::CommandFailed {
                command: command_line,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|e| DockerError::CLIError(format!("Invalid UTF-8 in runtime output: {}", e)))
    }
}

impl Default for CliRuntime {
    fn default() -> Self {
        Self::docker()
    }
}

impl ContainerRuntime for CliRuntime {
    fn runtime_name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn run_container(&self, image: &str, args: &[String]) -> RuntimeResult<String> {
        self.execute(&run_command_args(image, args))
    }

    fn container_ports(&self, container_id: &str) -> RuntimeResult<String> {
        self.execute(&ports_command_args(container_id))
    }

    fn stop_container(&self, container_id: &str) -> RuntimeResult<()> {
        self.execute(&stop_command_args(container_id))?;
        debug!("Container {} stopped successfully", container_id);
        Ok(())
    }
}

pub mod mock {
    //! Mock container runtime for testing fixture lifecycles
    //!
    //! Records every invocation and answers with configurable output, so the
    //! driver can be exercised without a container daemon. Clones share state.

    use crate::errors::DockerError;
    use crate::runtime::{ContainerRuntime, RuntimeResult};
    use std::sync::{Arc, Mutex};

    /// Record of a runtime invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MockCall {
        Run { image: String, args: Vec<String> },
        Ports { container_id: String },
        Stop { container_id: String },
    }

    /// Configuration for the mock runtime's answers
    #[derive(Debug, Clone)]
    pub struct MockRuntimeConfig {
        /// Name reported by `runtime_name`
        pub name: &'static str,
        /// Raw stdout returned by `run_container`
        pub run_output: String,
        /// Raw stdout returned by `container_ports`
        pub ports_output: String,
        /// Make `run_container` exit unsuccessfully
        pub fail_run: bool,
        /// Make `container_ports` exit unsuccessfully
        pub fail_ports: bool,
        /// Make `stop_container` exit unsuccessfully
        pub fail_stop: bool,
    }

    impl Default for MockRuntimeConfig {
        fn default() -> Self {
            Self {
                name: "docker",
                run_output: "4c3f9d2e1a7b\n".to_string(),
                ports_output: "\n".to_string(),
                fail_run: false,
                fail_ports: false,
                fail_stop: false,
            }
        }
    }

    /// Mock runtime implementation
    #[derive(Debug, Clone, Default)]
    pub struct MockRuntime {
        config: Arc<Mutex<MockRuntimeConfig>>,
        calls: Arc<Mutex<Vec<MockCall>>>,
    }

    impl MockRuntime {
        /// Create a new MockRuntime with default configuration
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a new MockRuntime with custom configuration
        pub fn with_config(config: MockRuntimeConfig) -> Self {
            Self {
                config: Arc::new(Mutex::new(config)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Update mock configuration
        pub fn update_config<F>(&self, f: F)
        where
            F: FnOnce(&mut MockRuntimeConfig),
        {
            let mut config = self.config.lock().unwrap();
            f(&mut config);
        }

        /// History of calls made, oldest first
        pub fn calls(&self) -> Vec<MockCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Container ids passed to `stop_container`
        pub fn stopped(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    MockCall::Stop { container_id } => Some(container_id),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: MockCall) {
            self.calls.lock().unwrap().push(call);
        }

        fn failure(command: &str) -> DockerError {
            DockerError::CommandFailed {
                command: command.to_string(),
                code: Some(1),
                stderr: "mock failure".to_string(),
            }
        }
    }

    impl ContainerRuntime for MockRuntime {
        fn runtime_name(&self) -> &'static str {
            self.config.lock().unwrap().name
        }

        fn run_container(&self, image: &str, args: &[String]) -> RuntimeResult<String> {
            self.record(MockCall::Run {
                image: image.to_string(),
                args: args.to_vec(),
            });
            let config = self.config.lock().unwrap();
            if config.fail_run {
                return Err(Self::failure("run"));
            }
            Ok(config.run_output.clone())
        }

        fn container_ports(&self, container_id: &str) -> RuntimeResult<String> {
            self.record(MockCall::Ports {
                container_id: container_id.to_string(),
            });
            let config = self.config.lock().unwrap();
            if config.fail_ports {
                return Err(Self::failure("ps"));
            }
            Ok(config.ports_output.clone())
        }

        fn stop_container(&self, container_id: &str) -> RuntimeResult<()> {
            self.record(MockCall::Stop {
                container_id: container_id.to_string(),
            });
            if self.config.lock().unwrap().fail_stop {
                return Err(Self::failure("stop"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_args() {
        let args = vec!["consul".to_string(), "agent".to_string(), "-dev".to_string()];
        assert_eq!(
            run_command_args("hashicorp/consul", &args),
            vec!["run", "-d", "-P", "--rm", "hashicorp/consul", "consul", "agent", "-dev"]
        );
        assert_eq!(
            run_command_args("redis", &[]),
            vec!["run", "-d", "-P", "--rm", "redis"]
        );
    }

    #[test]
    fn test_ports_and_stop_command_args() {
        assert_eq!(
            ports_command_args("4c3f9d2e1a7b"),
            vec!["ps", "-f", "id=4c3f9d2e1a7b", "--format={{.Ports}}"]
        );
        assert_eq!(stop_command_args("4c3f9d2e1a7b"), vec!["stop", "4c3f9d2e1a7b"]);
    }

    #[test]
    fn test_cli_runtime_names() {
        assert_eq!(CliRuntime::docker().runtime_name(), "docker");
        assert_eq!(CliRuntime::podman().runtime_name(), "podman");
        assert_eq!(CliRuntime::default().runtime_path(), "docker");
    }

    #[test]
    fn test_missing_binary_reports_not_installed() {
        let runtime = CliRuntime::docker()
            .with_runtime_path("/nonexistent/fixtured-test-runtime".to_string());
        assert!(matches!(
            runtime.check_runtime_installed(),
            Err(DockerError::NotInstalled)
        ));
        assert!(matches!(
            runtime.run_container("alpine", &[]),
            Err(DockerError::CLIError(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_command_failed() {
        let runtime = CliRuntime::docker().with_runtime_path("false".to_string());
        match runtime.stop_container("abc") {
            Err(DockerError::CommandFailed { command, code, .. }) => {
                assert_eq!(command, "false stop abc");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_is_captured() {
        let runtime = CliRuntime::docker().with_runtime_path("echo".to_string());
        let stdout = runtime.run_container("alpine", &["sleep".to_string()]).unwrap();
        assert_eq!(stdout, "run -d -P --rm alpine sleep\n");
    }
}
