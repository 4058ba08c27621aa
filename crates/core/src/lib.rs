//! Core library for container test fixtures
//!
//! This crate launches a container through a CLI container runtime, discovers
//! the host ports it was assigned, publishes them as environment variables for
//! a test process, and stops the container when the fixture goes out of scope.

pub mod cleanup;
pub mod config;
pub mod docker;
pub mod driver;
pub mod env;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod runtime;

pub use driver::DockerDriver;

