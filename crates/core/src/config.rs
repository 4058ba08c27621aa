//! Fixture configuration
//!
//! The option surface of a container fixture: the image to launch and a
//! shell-quoted string of arguments appended after it.

use crate::errors::{ConfigError, Result};
use serde::Serialize;

/// Default image reference (empty; a working fixture must set one)
pub const DEFAULT_IMAGE: &str = "";

/// Default argument string
pub const DEFAULT_ARGS: &str = "";

/// Immutable configuration of a single container fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverConfig {
    image: String,
    raw_args: String,
    args: Vec<String>,
}

impl DriverConfig {
    /// Build a configuration, splitting `args` with POSIX shell-word rules.
    ///
    /// Quotes and backslash escapes are honored; no globbing or variable
    /// expansion takes place. An empty image is accepted here and rejected
    /// by [`DriverConfig::validate`] when the container is launched.
    pub fn new(image: impl Into<String>, args: impl Into<String>) -> Result<Self> {
        let raw_args = args.into();
        let args = shell_words::split(&raw_args).map_err(|e| ConfigError::InvalidArgs {
            message: format!("{}: {}", e, raw_args),
        })?;

        Ok(Self {
            image: image.into(),
            raw_args,
            args,
        })
    }

    /// Configuration for `image` with no extra arguments
    pub fn for_image(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            raw_args: String::new(),
            args: Vec::new(),
        }
    }

    /// Image reference passed to the runtime
    pub fn image(&self) -> &str {
        &self.image
    }

    /// The argument string as it was supplied
    pub fn raw_args(&self) -> &str {
        &self.raw_args
    }

    /// Tokenized arguments, in order
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Check that the configuration can launch a container
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(ConfigError::MissingImage.into());
        }
        Ok(())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::for_image(DEFAULT_IMAGE)
    }
}
