//! Run command implementation
//!
//! Starts a container fixture, runs the user's command with the published
//! environment merged into its own, then stops the container.
//!
//! SIGINT, SIGTERM and SIGHUP are caught for the whole run so that an
//! interrupted `fixtured` still reaches teardown instead of leaving the
//! container behind.

use crate::cli::EnvFormat;
use anyhow::{Context, Result};
use fixtured_core::config::DriverConfig;
use fixtured_core::docker::CliRuntime;
use fixtured_core::env::PublishedEnv;
use fixtured_core::errors::FixtureError;
use fixtured_core::DockerDriver;
use std::io::Write;
use std::process::{Child, Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Exit code reported when the run was interrupted by a signal
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// How long an interrupted command may keep running before it is killed
const INTERRUPT_GRACE: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Arguments for the run command
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Image reference to launch
    pub image: String,
    /// Shell-quoted arguments appended after the image
    pub args: String,
    /// Prefix added to every published variable
    pub env_prefix: String,
    /// Print the published environment before running the command
    pub print_env: Option<EnvFormat>,
    /// Command to run against the fixture
    pub command: Vec<String>,
}

/// Execute the run command, returning the exit code of the user's command
#[instrument(skip(runtime))]
pub fn execute_run(args: RunArgs, runtime: CliRuntime) -> Result<i32> {
    let config = DriverConfig::new(args.image, args.args)?;
    config.validate()?;
    runtime.check_runtime_installed().map_err(FixtureError::from)?;

    let interrupted = install_interrupt_flag()?;

    let mut driver = DockerDriver::new(config, runtime);
    if let Err(e) = driver.setup() {
        if let Err(cleanup_err) = driver.teardown() {
            warn!("Cleanup after failed setup also failed: {}", cleanup_err);
        }
        return Err(e.into());
    }

    if interrupted.load(Ordering::SeqCst) {
        warn!("Interrupted during setup, not running the command");
        driver.teardown()?;
        return Ok(INTERRUPTED_EXIT_CODE);
    }

    if let Some(format) = args.print_env {
        print_env(driver.env(), &args.env_prefix, format)?;
    }

    let status = run_command(
        &args.command,
        driver.env(),
        &args.env_prefix,
        &interrupted,
        INTERRUPT_GRACE,
    );
    let teardown = driver.teardown();

    let status = status?;
    teardown?;

    if interrupted.load(Ordering::SeqCst) {
        warn!("Interrupted, fixture stopped");
        return Ok(INTERRUPTED_EXIT_CODE);
    }

    let code = status.code().unwrap_or_else(|| {
        warn!("Command terminated by a signal");
        1
    });
    debug!("Command exited with code {}", code);
    Ok(code)
}

/// Catch termination signals for the rest of the process lifetime
///
/// The handler only raises a flag; the run loop notices it and unwinds
/// through teardown.
fn install_interrupt_flag() -> Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupted);

    ctrlc::set_handler(move || {
        if !handler_flag.swap(true, Ordering::SeqCst) {
            warn!("Signal received, stopping the fixture once the command exits");
        }
    })
    .context("Failed to install signal handler")?;

    Ok(interrupted)
}

fn print_env(env: &PublishedEnv, prefix: &str, format: EnvFormat) -> Result<()> {
    let rendered = match format {
        EnvFormat::Text => env.to_exports(prefix),
        EnvFormat::Json => format!("{}\n", env.to_json(prefix)?),
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn run_command(
    command: &[String],
    env: &PublishedEnv,
    prefix: &str,
    interrupted: &AtomicBool,
    grace: Duration,
) -> Result<ExitStatus> {
    let (program, rest) = command
        .split_first()
        .context("No command given to run against the fixture")?;

    info!("Running {}", command.join(" "));
    let mut child = Command::new(program)
        .args(rest)
        .envs(env.prefixed(prefix))
        .spawn()
        .with_context(|| format!("Failed to run command '{}'", program))?;

    wait_for_child(&mut child, interrupted, grace)
}

/// Wait for `child`, killing it if it outlives `grace` after an interrupt.
///
/// A terminal Ctrl-C reaches the child directly since it shares our process
/// group, so most commands exit on their own well within the grace period.
fn wait_for_child(
    child: &mut Child,
    interrupted: &AtomicBool,
    grace: Duration,
) -> Result<ExitStatus> {
    let mut deadline = None;

    loop {
        if let Some(status) = child.try_wait().context("Failed to wait for command")? {
            return Ok(status);
        }

        if interrupted.load(Ordering::SeqCst) {
            let deadline = *deadline.get_or_insert_with(|| Instant::now() + grace);
            if Instant::now() >= deadline {
                warn!("Command still running {:?} after interrupt, killing it", grace);
                if let Err(e) = child.kill() {
                    debug!("Kill failed, command probably just exited: {}", e);
                }
                return child.wait().context("Failed to wait for command");
            }
        }

        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_wait_returns_exit_code_without_interrupt() {
        let interrupted = AtomicBool::new(false);
        let mut child = Command::new("sh").args(["-c", "exit 4"]).spawn().unwrap();

        let status = wait_for_child(&mut child, &interrupted, Duration::from_millis(10)).unwrap();
        assert_eq!(status.code(), Some(4));
    }

    #[test]
    fn test_wait_kills_command_that_outlives_grace() {
        let interrupted = AtomicBool::new(true);
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();

        let started = Instant::now();
        let status =
            wait_for_child(&mut child, &interrupted, Duration::from_millis(100)).unwrap();
        assert!(!status.success());
        assert_eq!(status.code(), None);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_run_command_passes_prefixed_env() {
        let mut env = PublishedEnv::new();
        env.put("PORT", "6379");
        let interrupted = AtomicBool::new(false);

        let status = run_command(
            &[
                "sh".to_string(),
                "-c".to_string(),
                "test \"$REDIS_PORT\" = 6379".to_string(),
            ],
            &env,
            "REDIS_",
            &interrupted,
            INTERRUPT_GRACE,
        )
        .unwrap();
        assert!(status.success());
    }
}
