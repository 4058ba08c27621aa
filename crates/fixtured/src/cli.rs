use crate::commands::run::{execute_run, RunArgs};
use crate::runtime_utils::create_runtime_from_context;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

/// Runtime selection options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum RuntimeOption {
    /// Docker runtime
    Docker,
    /// Podman runtime
    Podman,
}

impl From<RuntimeOption> for fixtured_core::runtime::RuntimeKind {
    fn from(runtime: RuntimeOption) -> Self {
        match runtime {
            RuntimeOption::Docker => fixtured_core::runtime::RuntimeKind::Docker,
            RuntimeOption::Podman => fixtured_core::runtime::RuntimeKind::Podman,
        }
    }
}

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log level options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Informational messages and above
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Format for printing the published environment
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EnvFormat {
    /// `export KEY=value` lines
    Text,
    /// A single JSON object
    Json,
}

/// Global options shared by subcommands
#[derive(Debug, Clone)]
pub struct CliContext {
    /// Container runtime selection
    pub runtime: Option<fixtured_core::runtime::RuntimeKind>,
    /// Override for the runtime binary
    pub runtime_path: Option<String>,
}

/// Fixture subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a container, run a command with its ports in the environment, then stop it
    #[command(long_about = "Start a container, run a command with its ports in the environment, then stop it\n\n\
        The container is started detached with every exposed port published on a random host port. \
        Its identifier, raw port summary, every parsed port binding and a connection URL for the \
        first binding are exported to COMMAND under the --env-prefix. The container is stopped when \
        COMMAND exits, and fixtured exits with COMMAND's exit code.")]
    Run {
        /// Image to use
        #[arg(long, default_value = fixtured_core::config::DEFAULT_IMAGE)]
        image: String,
        /// Args to pass to the image (shell-quoted)
        #[arg(long, default_value = fixtured_core::config::DEFAULT_ARGS, allow_hyphen_values = true)]
        args: String,
        /// Prefix added to every published variable
        #[arg(long, default_value = "FIXTURED_")]
        env_prefix: String,
        /// Print the published environment to stdout before running COMMAND
        #[arg(long, value_enum)]
        print_env: Option<EnvFormat>,
        /// Command and arguments to run against the fixture
        #[arg(last = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version,
    about = "Container test fixtures",
    long_about = "Container test fixtures\n\nLaunches throwaway containers for the duration of a test command and publishes their ports as environment variables.",
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    /// Log format (text or json, defaults to text, can be set via FIXTURED_LOG_FORMAT env var)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Container runtime to use (docker or podman, can be set via FIXTURED_RUNTIME env var)
    #[arg(long, global = true, value_enum)]
    pub runtime: Option<RuntimeOption>,

    /// Path to the container runtime executable
    #[arg(long, global = true, value_name = "PATH")]
    pub runtime_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Run the selected subcommand and return the process exit code
    pub fn dispatch(self) -> Result<i32> {
        let log_format = match self.log_format {
            Some(LogFormat::Text) => Some("text"),
            Some(LogFormat::Json) => Some("json"),
            None => None,
        };

        if std::env::var_os("FIXTURED_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
            let level = self.log_level.as_str();
            std::env::set_var(
                "RUST_LOG",
                format!("fixtured={},fixtured_core={}", level, level),
            );
        }
        fixtured_core::logging::init(log_format)?;
        tracing::debug!("CLI initialized with log level: {}", self.log_level.as_str());

        let context = CliContext {
            runtime: self.runtime.map(Into::into),
            runtime_path: self.runtime_path.clone(),
        };

        match self.command {
            Commands::Run {
                image,
                args,
                env_prefix,
                print_env,
                command,
            } => {
                let runtime = create_runtime_from_context(&context);
                execute_run(
                    RunArgs {
                        image,
                        args,
                        env_prefix,
                        print_env,
                        command,
                    },
                    runtime,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_trailing_command() {
        let cli = Cli::try_parse_from([
            "fixtured",
            "--runtime",
            "podman",
            "run",
            "--image",
            "redis:7",
            "--args",
            "--appendonly yes",
            "--",
            "pytest",
            "-x",
        ])
        .unwrap();

        assert_eq!(cli.runtime, Some(RuntimeOption::Podman));
        let Commands::Run {
            image,
            args,
            env_prefix,
            print_env,
            command,
        } = cli.command;
        assert_eq!(image, "redis:7");
        assert_eq!(args, "--appendonly yes");
        assert_eq!(env_prefix, "FIXTURED_");
        assert_eq!(print_env, None);
        assert_eq!(command, vec!["pytest", "-x"]);
    }

    #[test]
    fn test_run_requires_command() {
        assert!(Cli::try_parse_from(["fixtured", "run", "--image", "redis"]).is_err());
    }

    #[test]
    fn test_image_defaults_to_empty() {
        let cli = Cli::try_parse_from(["fixtured", "run", "--", "true"]).unwrap();
        let Commands::Run { image, args, .. } = cli.command;
        assert!(image.is_empty());
        assert!(args.is_empty());
    }
}
